pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod job;
pub mod local;
pub mod queue;
pub mod unit;

pub use backend::{ExecutionBackend, JobHandle};
pub use config::{BackendKind, DispatcherConfig, RunMode};
pub use dispatcher::Dispatcher;
pub use job::{JobOutcome, JobRecord, JobStatus, UnitOptions, WorkUnit};
pub use unit::execute_unit;
