use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::plan::manifest::FileRow;
use crate::engine::store::format::DATA_EXT;

#[derive(Clone, Debug)]
pub struct PlannerConfig {
    pub out_dir: PathBuf,
    /// Target cumulative input size per group, in bytes.
    pub target_bytes: u64,
    /// Plan groups whose output already exists instead of skipping them
    /// (used by verification and forced re-runs).
    pub force_existing: bool,
}

/// One unit of merge work: an output path and the ordered inputs feeding it.
#[derive(Clone, Debug, Serialize)]
pub struct MergeGroup {
    pub dataset: String,
    pub group_key: String,
    pub ordinal: usize,
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub bytes: u64,
}

/// Result of one planning pass.
#[derive(Debug, Default)]
pub struct Plan {
    /// Groups to dispatch.
    pub jobs: Vec<MergeGroup>,
    /// Groups whose output already exists (bookkeeping only).
    pub existing: Vec<MergeGroup>,
    /// Dataset name to all group outputs, dispatched or not.
    pub outputs: IndexMap<String, Vec<PathBuf>>,
}

impl Plan {
    pub fn job_file_count(&self) -> usize {
        self.jobs.iter().map(|g| g.inputs.len()).sum()
    }

    pub fn job_byte_count(&self) -> u64 {
        self.jobs.iter().map(|g| g.bytes).sum()
    }
}

/// Partitions a dataset's file rows into size-bounded, schema-keyed merge
/// groups with deterministic output names.
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn plan(&self, rows: &[FileRow]) -> Plan {
        // Group rows by (dataset, schema-group key), preserving input order
        // within each bucket.
        let mut buckets: IndexMap<(String, String), Vec<&FileRow>> = IndexMap::new();
        for row in rows {
            buckets
                .entry((row.dataset.clone(), row.group_key.clone()))
                .or_default()
                .push(row);
        }

        let mut plan = Plan::default();
        for ((dataset, group_key), bucket) in &buckets {
            for (ordinal, chunk) in split_monotonic(bucket, self.config.target_bytes)
                .into_iter()
                .enumerate()
            {
                let group = self.make_group(dataset, group_key, ordinal, &chunk);
                debug!(
                    target: "plan::planner",
                    output = %group.output.display(),
                    inputs = group.inputs.len(),
                    bytes = group.bytes,
                    "Planned group"
                );
                plan.outputs
                    .entry(dataset.clone())
                    .or_default()
                    .push(group.output.clone());
                if group.output.is_file() && !self.config.force_existing {
                    plan.existing.push(group);
                } else {
                    plan.jobs.push(group);
                }
            }
        }

        info!(
            target: "plan::planner",
            jobs = plan.jobs.len(),
            existing = plan.existing.len(),
            files = plan.job_file_count(),
            "Prepared merge jobs"
        );
        plan
    }

    /// Output path: `<out_dir>/<dataset>/<first-stem>_<key>_<ordinal>.tmf`.
    /// The ordinal within one (dataset, key) bucket guarantees no collisions.
    fn make_group(
        &self,
        dataset: &str,
        group_key: &str,
        ordinal: usize,
        chunk: &[&FileRow],
    ) -> MergeGroup {
        let first_stem = chunk[0]
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "merged".to_string());
        let dir = self.config.out_dir.join(dataset.trim_matches('/'));
        let output = dir.join(format!("{first_stem}_{group_key}_{ordinal}.{DATA_EXT}"));
        MergeGroup {
            dataset: dataset.to_string(),
            group_key: group_key.to_string(),
            ordinal,
            output,
            inputs: chunk.iter().map(|r| r.path.clone()).collect(),
            bytes: chunk.iter().map(|r| r.size).sum(),
        }
    }
}

/// Consumes rows in order, starting a new chunk exactly when the running
/// cumulative size would cross the target. A single input larger than the
/// target gets its own chunk; files are never split.
fn split_monotonic<'a>(rows: &[&'a FileRow], target: u64) -> Vec<Vec<&'a FileRow>> {
    let mut chunks = Vec::new();
    let mut current: Vec<&FileRow> = Vec::new();
    let mut running = 0u64;
    for row in rows.iter().copied() {
        if !current.is_empty() && running + row.size > target {
            chunks.push(std::mem::take(&mut current));
            running = 0;
        }
        running += row.size;
        current.push(row);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
