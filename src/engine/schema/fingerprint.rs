use std::path::Path;

use sha2::{Digest, Sha256};

use crate::engine::errors::StoreError;
use crate::engine::schema::types::PRIMARY_TABLE;
use crate::engine::store::DatasetFile;

/// Marker recorded for files whose fingerprint could not be computed.
/// Such files are ungroupable and reported separately; the marker keeps the
/// hash-map document total in step with the manifest.
pub const UNAVAILABLE: &str = "X";

/// Digest over a set of column names, identical for identical sets
/// regardless of input order. Grouping key only; the reconciler remains the
/// correctness authority.
pub fn fingerprint_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let mut sorted: Vec<&str> = names.collect();
    sorted.sort_unstable();
    let mut hasher = Sha256::new();
    for name in sorted {
        hasher.update(name.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint of a file's primary row-table column set.
pub fn fingerprint_file(path: &Path) -> Result<String, StoreError> {
    let file = DatasetFile::open(path)?;
    let table = file
        .table(PRIMARY_TABLE)
        .ok_or_else(|| StoreError::ObjectMissing(PRIMARY_TABLE.to_string()))?;
    Ok(fingerprint_names(table.column_names()))
}
