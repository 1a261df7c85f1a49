use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::engine::dispatch::backend::{ExecutionBackend, JobHandle};
use crate::engine::dispatch::config::RunMode;
use crate::engine::dispatch::job::{JobOutcome, WorkUnit};
use crate::engine::errors::DispatchError;

const WORKER_BIN: &str = "treemerge-worker";

/// Batch-queue style execution: one worker subprocess per unit, stdout and
/// stderr captured to per-job log files, with bounded retries for
/// infrastructure failures (spawn errors, signal-killed workers). A worker
/// that exits nonzero produced a real unit failure and is not retried.
pub struct QueueBackend {
    semaphore: Arc<Semaphore>,
    retries: u32,
    log_dir: PathBuf,
    seq: AtomicUsize,
}

impl QueueBackend {
    pub fn new(concurrency: usize, retries: u32, log_dir: PathBuf) -> Result<Self, DispatchError> {
        std::fs::create_dir_all(&log_dir)?;
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            retries,
            log_dir,
            seq: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ExecutionBackend for QueueBackend {
    async fn submit(&self, unit: WorkUnit) -> Result<JobHandle, DispatchError> {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let stdout_path = self.log_dir.join(format!("job_{n:05}.out"));
        let stderr_path = self.log_dir.join(format!("job_{n:05}.err"));
        let semaphore = Arc::clone(&self.semaphore);
        let retries = self.retries;
        let out = stdout_path.clone();
        let err = stderr_path.clone();

        Ok(JobHandle::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return JobOutcome::failed("worker pool closed"),
            };
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                match run_worker(&unit, &out, &err).await {
                    Ok(outcome) => return outcome,
                    Err(infra) if attempt <= retries => {
                        warn!(
                            target: "dispatch::queue",
                            output = %unit.group.output.display(),
                            attempt,
                            error = %infra,
                            "Worker infrastructure failure, retrying"
                        );
                    }
                    Err(infra) => {
                        return JobOutcome::failed(format!(
                            "infrastructure failure after {attempt} attempts: {infra}"
                        ));
                    }
                }
            }
        })
        .with_captures(stdout_path, stderr_path))
    }
}

/// Runs the worker binary once. `Err` means an infrastructure failure the
/// caller may retry; `Ok` carries the unit's semantic outcome.
async fn run_worker(
    unit: &WorkUnit,
    stdout_path: &Path,
    stderr_path: &Path,
) -> Result<JobOutcome, DispatchError> {
    let exe = std::env::current_exe().map_err(|e| DispatchError::Spawn(e.to_string()))?;
    let worker = exe
        .parent()
        .map(|dir| dir.join(WORKER_BIN))
        .ok_or_else(|| DispatchError::Spawn("cannot locate worker binary".to_string()))?;

    let mut cmd = tokio::process::Command::new(worker);
    cmd.arg("--mode")
        .arg(unit.mode.as_str())
        .arg("--out")
        .arg(&unit.group.output)
        .arg("--fallback")
        .arg(unit.options.fallback_settings.to_string());
    if let Some(branches) = &unit.options.branches {
        cmd.arg("--branches").arg(branches);
    }
    if unit.options.allow_non_bool {
        cmd.arg("--allow-non-bool");
    }
    cmd.args(&unit.group.inputs);
    cmd.stdout(Stdio::from(std::fs::File::create(stdout_path)?));
    cmd.stderr(Stdio::from(std::fs::File::create(stderr_path)?));

    let status = cmd
        .status()
        .await
        .map_err(|e| DispatchError::Spawn(e.to_string()))?;
    if status.success() {
        Ok(parse_worker_stdout(stdout_path, unit.mode))
    } else {
        match status.code() {
            // Killed by the infrastructure (signal), worth retrying.
            None => Err(DispatchError::Spawn("worker killed by signal".to_string())),
            Some(code) => Ok(JobOutcome::failed(format!(
                "worker exited with status {code}"
            ))),
        }
    }
}

/// Workers print `<a> <b>` as their final line: row counts for verify,
/// byte counts for merge/skim.
pub(crate) fn parse_worker_stdout(path: &Path, mode: RunMode) -> JobOutcome {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return JobOutcome::failed(format!("cannot read worker output: {e}")),
    };
    let counts: Option<(u64, u64)> = content.lines().rev().find_map(|line| {
        let mut parts = line.split_whitespace();
        let a = parts.next()?.parse().ok()?;
        let b = parts.next()?.parse().ok()?;
        parts.next().is_none().then_some((a, b))
    });
    match counts {
        Some((a, b)) => {
            let mut outcome = JobOutcome::done();
            match mode {
                RunMode::Verify => {
                    outcome.output_rows = Some(a);
                    outcome.input_rows = Some(b);
                }
                RunMode::Merge | RunMode::Skim => {
                    outcome.output_bytes = Some(a);
                    outcome.input_bytes = Some(b);
                }
            }
            outcome
        }
        None => JobOutcome::failed("malformed worker output"),
    }
}
