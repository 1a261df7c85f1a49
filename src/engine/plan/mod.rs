pub mod manifest;
pub mod plan_file;
pub mod planner;

pub use manifest::{
    FileRow, Manifest, SchemaHashMap, Strictness, collect_rows, load_hash_map, load_manifest,
};
pub use plan_file::write_plan_files;
pub use planner::{MergeGroup, Plan, Planner, PlannerConfig};
