use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::engine::plan::manifest::{Manifest, SchemaHashMap};
use crate::engine::schema::fingerprint::{UNAVAILABLE, fingerprint_file};

/// Result of a fingerprint sweep over a manifest.
pub struct SweepReport {
    pub map: SchemaHashMap,
    pub unavailable: Vec<PathBuf>,
}

/// Computes the schema fingerprint of every manifest file in parallel.
///
/// Files whose primary table cannot be read are recorded with the
/// [`UNAVAILABLE`] marker and listed separately; the map always covers the
/// full manifest so its count stays in step with the file list.
pub fn sweep_manifest(manifest: &Manifest) -> SweepReport {
    let files: Vec<PathBuf> = manifest.values().flatten().cloned().collect();
    info!(target: "schema::sweep", files = files.len(), "Fingerprinting manifest files");

    let digests: Vec<(PathBuf, String)> = files
        .par_iter()
        .map(|path| match fingerprint_file(path) {
            Ok(digest) => (path.clone(), digest),
            Err(e) => {
                warn!(
                    target: "schema::sweep",
                    file = %path.display(),
                    error = %e,
                    "Could not fingerprint file"
                );
                (path.clone(), UNAVAILABLE.to_string())
            }
        })
        .collect();

    let mut map = SchemaHashMap::new();
    let mut unavailable = Vec::new();
    for (path, digest) in digests {
        if digest == UNAVAILABLE {
            unavailable.push(path.clone());
        }
        map.insert(path, digest);
    }
    info!(
        target: "schema::sweep",
        fingerprinted = map.len().saturating_sub(unavailable.len()),
        unavailable = unavailable.len(),
        "Fingerprint sweep finished"
    );
    SweepReport { map, unavailable }
}
