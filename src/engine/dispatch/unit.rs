use crate::engine::dispatch::config::RunMode;
use crate::engine::dispatch::job::{JobOutcome, JobStatus, WorkUnit};
use crate::engine::merge::{AllowList, MergeOptions, Merger};
use crate::engine::verify::verify_group;

/// Runs one unit of work to completion. Shared by the local backend and the
/// worker binary; all failure detail is folded into the outcome so the
/// caller never aborts the run over a single unit.
pub fn execute_unit(unit: &WorkUnit) -> JobOutcome {
    match unit.mode {
        RunMode::Merge | RunMode::Skim => {
            let allow_list = match (unit.mode, &unit.options.branches) {
                (RunMode::Skim, Some(path)) => match AllowList::load(path) {
                    Ok(list) => Some(list),
                    Err(e) => return JobOutcome::failed(format!("allow-list load failed: {e}")),
                },
                _ => None,
            };
            let merger = Merger::new(MergeOptions {
                allow_list,
                allow_non_bool: unit.options.allow_non_bool,
                fallback_settings: unit.options.fallback_settings,
            });
            match merger.merge(&unit.group.output, &unit.group.inputs) {
                Ok(report) => JobOutcome {
                    status: JobStatus::Done,
                    output_rows: Some(report.primary_rows()),
                    input_rows: None,
                    output_bytes: Some(report.output_bytes),
                    input_bytes: Some(report.input_bytes),
                    error: None,
                },
                Err(e) => JobOutcome::failed(e.to_string()),
            }
        }
        RunMode::Verify => {
            let outcome = verify_group(&unit.group);
            if !outcome.output_readable {
                let mut failed = JobOutcome::failed("merged output unreadable");
                failed.output_rows = Some(outcome.output_rows);
                failed.input_rows = Some(outcome.input_rows);
                return failed;
            }
            JobOutcome {
                status: JobStatus::Done,
                output_rows: Some(outcome.output_rows),
                input_rows: Some(outcome.input_rows),
                output_bytes: None,
                input_bytes: None,
                error: None,
            }
        }
    }
}
