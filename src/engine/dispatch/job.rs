use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::dispatch::config::RunMode;
use crate::engine::plan::MergeGroup;
use crate::engine::store::format::FALLBACK_COMPRESSION;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// Per-unit merge knobs a worker needs to reproduce the driver's settings.
#[derive(Clone, Debug)]
pub struct UnitOptions {
    pub branches: Option<PathBuf>,
    pub allow_non_bool: bool,
    pub fallback_settings: u32,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            branches: None,
            allow_non_bool: false,
            fallback_settings: FALLBACK_COMPRESSION,
        }
    }
}

/// One independent unit of work handed to an execution backend.
#[derive(Clone, Debug)]
pub struct WorkUnit {
    pub mode: RunMode,
    pub group: MergeGroup,
    pub options: UnitOptions,
}

/// Terminal result of one unit. Verification units capture row counts;
/// merge units capture byte counts for the aggregate compression ratio.
#[derive(Clone, Debug)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub output_rows: Option<u64>,
    pub input_rows: Option<u64>,
    pub output_bytes: Option<u64>,
    pub input_bytes: Option<u64>,
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            output_rows: None,
            input_rows: None,
            output_bytes: None,
            input_bytes: None,
            error: Some(error.into()),
        }
    }

    pub fn done() -> Self {
        Self {
            status: JobStatus::Done,
            output_rows: None,
            input_rows: None,
            output_bytes: None,
            input_bytes: None,
            error: None,
        }
    }
}

/// Job record for one dispatch run; persisted only to the run log.
#[derive(Debug, Serialize)]
pub struct JobRecord {
    pub group: MergeGroup,
    pub status: JobStatus,
    pub output_rows: Option<u64>,
    pub input_rows: Option<u64>,
    pub output_bytes: Option<u64>,
    pub input_bytes: Option<u64>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn from_outcome(
        group: MergeGroup,
        outcome: JobOutcome,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group,
            status: outcome.status,
            output_rows: outcome.output_rows,
            input_rows: outcome.input_rows,
            output_bytes: outcome.output_bytes,
            input_bytes: outcome.input_bytes,
            error: outcome.error,
            started_at,
            finished_at,
        }
    }

    /// A verification unit whose counts disagree (or which failed outright).
    pub fn verification_failed(&self) -> bool {
        match self.status {
            JobStatus::Failed => true,
            JobStatus::Done => match (self.output_rows, self.input_rows) {
                (Some(out), Some(input)) => out != input,
                _ => false,
            },
            _ => false,
        }
    }
}
