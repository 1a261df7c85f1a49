use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::engine::dispatch::backend::{ExecutionBackend, JobHandle};
use crate::engine::dispatch::job::{JobOutcome, WorkUnit};
use crate::engine::dispatch::unit::execute_unit;
use crate::engine::errors::DispatchError;

/// In-process execution: each unit runs on the blocking pool, with total
/// parallelism bounded by a semaphore.
pub struct LocalBackend {
    semaphore: Arc<Semaphore>,
}

impl LocalBackend {
    pub fn new(concurrency: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }
}

#[async_trait]
impl ExecutionBackend for LocalBackend {
    async fn submit(&self, unit: WorkUnit) -> Result<JobHandle, DispatchError> {
        let semaphore = Arc::clone(&self.semaphore);
        Ok(JobHandle::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return JobOutcome::failed("worker pool closed"),
            };
            match tokio::task::spawn_blocking(move || execute_unit(&unit)).await {
                Ok(outcome) => outcome,
                Err(e) => JobOutcome::failed(format!("worker task panicked: {e}")),
            }
        }))
    }
}
