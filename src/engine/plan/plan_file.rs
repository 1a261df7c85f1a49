use std::fs::File;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use crate::engine::errors::PlanError;
use crate::engine::plan::planner::Plan;

/// Writes the dataset-to-outputs document and the companion job-plan file
/// (`<stem>_log.json`, output path to input list). Returns the job-plan
/// path.
pub fn write_plan_files(plan: &Plan, outputs_path: &Path) -> Result<PathBuf, PlanError> {
    info!(
        target: "plan::plan_file",
        file = %outputs_path.display(),
        "Writing output paths"
    );
    serde_json::to_writer_pretty(File::create(outputs_path)?, &plan.outputs)?;

    let job_log = job_log_path(outputs_path);
    let jobs: IndexMap<&PathBuf, &Vec<PathBuf>> = plan
        .jobs
        .iter()
        .map(|g| (&g.output, &g.inputs))
        .collect();
    info!(
        target: "plan::plan_file",
        file = %job_log.display(),
        jobs = jobs.len(),
        "Writing job info"
    );
    serde_json::to_writer_pretty(File::create(&job_log)?, &jobs)?;
    Ok(job_log)
}

pub fn job_log_path(outputs_path: &Path) -> PathBuf {
    let stem = outputs_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plan".to_string());
    outputs_path.with_file_name(format!("{stem}_log.json"))
}
