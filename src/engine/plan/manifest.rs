use std::fs::File;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::engine::errors::PlanError;
use crate::engine::schema::fingerprint::UNAVAILABLE;

/// Dataset manifest: dataset name to ordered input file list.
pub type Manifest = IndexMap<String, Vec<PathBuf>>;

/// Schema-hash map: input file path to schema fingerprint.
pub type SchemaHashMap = IndexMap<PathBuf, String>;

/// What to do when the hash map and the manifest disagree on file counts.
/// The default proceeds best-effort; `Abort` fails planning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    #[default]
    Warn,
    Abort,
}

pub fn load_manifest(path: &Path) -> Result<Manifest, PlanError> {
    let manifest: Manifest = serde_json::from_reader(File::open(path)?)?;
    info!(
        target: "plan::manifest",
        file = %path.display(),
        datasets = manifest.len(),
        files = manifest.values().map(|v| v.len()).sum::<usize>(),
        "Loaded dataset manifest"
    );
    Ok(manifest)
}

pub fn load_hash_map(path: &Path) -> Result<SchemaHashMap, PlanError> {
    let map: SchemaHashMap = serde_json::from_reader(File::open(path)?)?;
    info!(
        target: "plan::manifest",
        file = %path.display(),
        entries = map.len(),
        "Loaded schema-hash map"
    );
    Ok(map)
}

/// One plannable input file.
#[derive(Clone, Debug)]
pub struct FileRow {
    pub dataset: String,
    pub path: PathBuf,
    pub size: u64,
    pub group_key: String,
}

/// Resolves the manifest into size-annotated rows keyed for grouping.
///
/// Missing files are excluded with a warning; files carrying the unavailable
/// fingerprint marker are ungroupable and excluded with a warning as well.
pub fn collect_rows(
    manifest: &Manifest,
    hashes: Option<&SchemaHashMap>,
    strictness: Strictness,
) -> Result<Vec<FileRow>, PlanError> {
    let total: usize = manifest.values().map(|v| v.len()).sum();
    if let Some(map) = hashes {
        if map.len() != total {
            match strictness {
                Strictness::Abort => {
                    return Err(PlanError::HashCountMismatch {
                        expected: total,
                        got: map.len(),
                    });
                }
                Strictness::Warn => warn!(
                    target: "plan::manifest",
                    manifest_files = total,
                    hash_entries = map.len(),
                    "Number of hash keys is not the same as number of inputs"
                ),
            }
        }
    }

    let mut rows = Vec::with_capacity(total);
    for (dataset, files) in manifest {
        for path in files {
            let size = match std::fs::metadata(path) {
                Ok(meta) => meta.len(),
                Err(e) => {
                    warn!(
                        target: "plan::manifest",
                        file = %path.display(),
                        error = %e,
                        "Excluding unreadable input file"
                    );
                    continue;
                }
            };
            let group_key = match hashes {
                Some(map) => match map.get(path) {
                    Some(key) if key == UNAVAILABLE => {
                        warn!(
                            target: "plan::manifest",
                            file = %path.display(),
                            "Excluding file with unavailable schema fingerprint"
                        );
                        continue;
                    }
                    Some(key) => key.clone(),
                    None => {
                        warn!(
                            target: "plan::manifest",
                            file = %path.display(),
                            "File missing from hash map, using empty group key"
                        );
                        String::new()
                    }
                },
                None => String::new(),
            };
            rows.push(FileRow {
                dataset: dataset.clone(),
                path: path.clone(),
                size,
                group_key,
            });
        }
    }
    Ok(rows)
}
