use std::path::PathBuf;
use std::time::Duration;

/// Which execution substrate runs the units of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process pool with bounded blocking slots.
    Local,
    /// One worker subprocess per unit, batch-queue style, with captured
    /// stdout/stderr and bounded retries for infrastructure failures.
    Queue,
}

/// What a dispatch run does with each merge group. Selected once for the
/// whole run; the modes are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Merge,
    Skim,
    Verify,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Merge => "merge",
            RunMode::Skim => "skim",
            RunMode::Verify => "verify",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit dispatcher configuration, passed at construction.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    pub backend: BackendKind,
    pub concurrency: usize,
    /// Bounded retries for transient infrastructure failures (queue backend
    /// only; completed-but-bad results are never retried).
    pub retries: u32,
    pub poll_interval: Duration,
    /// Where the queue backend captures worker stdout/stderr.
    pub log_dir: PathBuf,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            concurrency: 10,
            retries: 2,
            poll_interval: Duration::from_millis(200),
            log_dir: PathBuf::from("logs/jobs"),
        }
    }
}
