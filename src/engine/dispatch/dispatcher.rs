use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info};

use crate::engine::dispatch::backend::ExecutionBackend;
use crate::engine::dispatch::config::{BackendKind, DispatcherConfig, RunMode};
use crate::engine::dispatch::job::{JobRecord, JobStatus, UnitOptions, WorkUnit};
use crate::engine::dispatch::local::LocalBackend;
use crate::engine::dispatch::queue::QueueBackend;
use crate::engine::errors::DispatchError;
use crate::engine::plan::MergeGroup;

/// Submits planned merge groups to an execution backend and tracks them to
/// terminal state. Units are fully independent; the dispatcher only blocks
/// at the poll wait.
pub struct Dispatcher {
    config: DispatcherConfig,
    backend: Arc<dyn ExecutionBackend>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, DispatchError> {
        let backend: Arc<dyn ExecutionBackend> = match config.backend {
            BackendKind::Local => Arc::new(LocalBackend::new(config.concurrency)),
            BackendKind::Queue => Arc::new(QueueBackend::new(
                config.concurrency,
                config.retries,
                config.log_dir.clone(),
            )?),
        };
        Ok(Self { config, backend })
    }

    /// Test seam: inject a backend directly.
    pub fn with_backend(config: DispatcherConfig, backend: Arc<dyn ExecutionBackend>) -> Self {
        Self { config, backend }
    }

    /// Runs every group to a terminal state and returns the job records.
    pub async fn run(
        &self,
        mode: RunMode,
        groups: Vec<MergeGroup>,
        options: UnitOptions,
    ) -> Result<Vec<JobRecord>, DispatchError> {
        let total = groups.len();
        info!(
            target: "dispatch::dispatcher",
            mode = %mode,
            jobs = total,
            concurrency = self.config.concurrency,
            "Dispatching jobs"
        );

        // The merge engine opens outputs with create-new semantics, so the
        // directories must exist before workers start.
        if mode != RunMode::Verify {
            for group in &groups {
                if let Some(parent) = group.output.parent() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let mut submitted = Vec::with_capacity(total);
        for group in groups {
            let unit = WorkUnit {
                mode,
                group: group.clone(),
                options: options.clone(),
            };
            let started_at = Utc::now();
            let handle = self.backend.submit(unit).await?;
            submitted.push((group, started_at, handle));
        }

        // Poll until every unit is terminal, reporting progress as it moves.
        let mut last_finished = usize::MAX;
        loop {
            let finished = submitted.iter().filter(|(_, _, h)| h.done()).count();
            if finished != last_finished {
                info!(
                    target: "dispatch::dispatcher",
                    finished,
                    total,
                    "Progress"
                );
                last_finished = finished;
            }
            if finished == total {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        let (meta, handles): (Vec<_>, Vec<_>) = submitted
            .into_iter()
            .map(|(group, started_at, handle)| ((group, started_at), handle))
            .unzip();
        let outcomes = join_all(handles.into_iter().map(|h| h.outcome())).await;

        let mut records = Vec::with_capacity(total);
        for ((group, started_at), outcome) in meta.into_iter().zip(outcomes) {
            if outcome.status == JobStatus::Failed {
                error!(
                    target: "dispatch::dispatcher",
                    output = %group.output.display(),
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "Job failed"
                );
            }
            records.push(JobRecord::from_outcome(group, outcome, started_at, Utc::now()));
        }

        let failed = records
            .iter()
            .filter(|r| r.status == JobStatus::Failed)
            .count();
        info!(
            target: "dispatch::dispatcher",
            total,
            failed,
            "Dispatch finished"
        );
        Ok(records)
    }
}
