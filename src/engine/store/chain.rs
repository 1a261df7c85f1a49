use std::path::PathBuf;

use tracing::warn;

use crate::engine::errors::StoreError;
use crate::engine::store::file::DatasetFile;

/// Read-only chained view of one named row-table across many files, in the
/// manner of chaining the same tree out of a file list.
pub struct TableChain {
    table: String,
    paths: Vec<PathBuf>,
}

impl TableChain {
    pub fn new(table: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            table: table.into(),
            paths,
        }
    }

    /// Total row count across all chained inputs.
    ///
    /// Unreadable files and files lacking the table are skipped with a
    /// warning; the caller sees a lower total, which a verification pass then
    /// flags as a mismatch.
    pub fn total_rows(&self) -> u64 {
        let mut total = 0u64;
        for path in &self.paths {
            match self.rows_in(path) {
                Ok(rows) => total += rows,
                Err(e) => {
                    warn!(
                        target: "store::chain",
                        file = %path.display(),
                        error = %e,
                        "Skipping unreadable chain input"
                    );
                }
            }
        }
        total
    }

    fn rows_in(&self, path: &PathBuf) -> Result<u64, StoreError> {
        let file = DatasetFile::open(path)?;
        let table = file
            .table(&self.table)
            .ok_or_else(|| StoreError::ObjectMissing(self.table.clone()))?;
        Ok(table.rows)
    }
}
