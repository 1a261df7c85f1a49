use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::engine::dispatch::job::{JobOutcome, WorkUnit};
use crate::engine::errors::DispatchError;

/// Boundary with the task-execution substrate: submit a unit, get a handle
/// that can be polled without blocking and awaited for the terminal result.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn submit(&self, unit: WorkUnit) -> Result<JobHandle, DispatchError>;
}

/// Handle on one submitted unit of work.
pub struct JobHandle {
    done: Arc<AtomicBool>,
    slot: Arc<Mutex<Option<JobOutcome>>>,
    task: tokio::task::JoinHandle<()>,
    /// Capture paths, populated by backends that redirect worker output.
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
}

impl JobHandle {
    /// Drives `work` on the runtime, recording its outcome for `outcome()`.
    pub fn spawn<F>(work: F) -> Self
    where
        F: std::future::Future<Output = JobOutcome> + Send + 'static,
    {
        let done = Arc::new(AtomicBool::new(false));
        let slot: Arc<Mutex<Option<JobOutcome>>> = Arc::new(Mutex::new(None));
        let task = {
            let done = Arc::clone(&done);
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                let outcome = work.await;
                *slot.lock() = Some(outcome);
                done.store(true, Ordering::Release);
            })
        };
        Self {
            done,
            slot,
            task,
            stdout: None,
            stderr: None,
        }
    }

    pub fn with_captures(mut self, stdout: PathBuf, stderr: PathBuf) -> Self {
        self.stdout = Some(stdout);
        self.stderr = Some(stderr);
        self
    }

    /// Non-blocking terminal-state check.
    pub fn done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Blocks until the unit reaches a terminal state.
    pub async fn outcome(self) -> JobOutcome {
        let _ = self.task.await;
        self.slot
            .lock()
            .take()
            .unwrap_or_else(|| JobOutcome::failed("worker task vanished"))
    }
}
