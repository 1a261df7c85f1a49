use std::path::PathBuf;

use tracing::{info, warn};

use crate::engine::plan::MergeGroup;
use crate::engine::schema::types::PRIMARY_TABLE;
use crate::engine::store::{DatasetFile, TableChain};

/// Row-count comparison for one completed merge group.
#[derive(Clone, Debug)]
pub struct VerifyOutcome {
    pub output: PathBuf,
    pub output_readable: bool,
    pub output_rows: u64,
    pub input_rows: u64,
}

impl VerifyOutcome {
    pub fn passed(&self) -> bool {
        self.output_readable && self.output_rows == self.input_rows
    }
}

/// Compares the output's primary row count against the chained sum over the
/// group's inputs. Never mutates anything; safe to re-run standalone.
pub fn verify_group(group: &MergeGroup) -> VerifyOutcome {
    let (output_readable, output_rows) = match DatasetFile::open(&group.output) {
        Ok(file) => match file.table(PRIMARY_TABLE) {
            Some(table) => (true, table.rows),
            None => {
                warn!(
                    target: "verify::verifier",
                    output = %group.output.display(),
                    "Merged output lacks the primary row-table"
                );
                (false, 0)
            }
        },
        Err(e) => {
            warn!(
                target: "verify::verifier",
                output = %group.output.display(),
                error = %e,
                "Merged output is unreadable"
            );
            (false, 0)
        }
    };

    let input_rows = TableChain::new(PRIMARY_TABLE, group.inputs.clone()).total_rows();

    let outcome = VerifyOutcome {
        output: group.output.clone(),
        output_readable,
        output_rows,
        input_rows,
    };
    if outcome.passed() {
        info!(
            target: "verify::verifier",
            output = %group.output.display(),
            rows = output_rows,
            "Merge verified"
        );
    } else {
        warn!(
            target: "verify::verifier",
            output = %group.output.display(),
            output_rows,
            input_rows,
            "Merge incomplete"
        );
    }
    outcome
}

/// Outputs that failed verification. Deletion is an explicit operator
/// action; nothing here runs automatically.
#[derive(Debug, Default)]
pub struct Remediation {
    pub bad: Vec<PathBuf>,
}

impl Remediation {
    pub fn push(&mut self, path: PathBuf) {
        self.bad.push(path);
    }

    pub fn is_empty(&self) -> bool {
        self.bad.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bad.len()
    }

    /// Deletes every listed output, returning the number removed.
    pub fn remove_all(&self) -> usize {
        let mut removed = 0;
        for path in &self.bad {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    info!(target: "verify::verifier", file = %path.display(), "Removed bad output");
                    removed += 1;
                }
                Err(e) => {
                    warn!(
                        target: "verify::verifier",
                        file = %path.display(),
                        error = %e,
                        "Could not remove bad output"
                    );
                }
            }
        }
        removed
    }
}
