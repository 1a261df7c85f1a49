use std::path::PathBuf;
use thiserror::Error;

use crate::engine::store::format::ScalarType;

/// Errors raised by the dataset file container.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a dataset file (bad magic)")]
    BadMagic,

    #[error("unsupported format version {0}")]
    Version(u16),

    #[error("checksum mismatch (file truncated or corrupt)")]
    Checksum,

    #[error("object encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("unknown compression settings {0}")]
    UnknownCompression(u32),

    #[error("compression error: {0}")]
    Codec(String),

    #[error("unknown scalar type tag {0}")]
    UnknownTypeTag(u8),

    #[error("column payload length is not a multiple of the value width")]
    PayloadShape,

    #[error("object not found: {0}")]
    ObjectMissing(String),
}

/// Errors raised while reconciling row-table schemas.
///
/// All of these are fatal for the owning merge group only; the run continues
/// with other groups.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot backfill non-boolean column {column} ({ty}) into table {table}")]
    NonBoolBackfill {
        table: String,
        column: String,
        ty: ScalarType,
    },

    #[error("cannot backfill variable-arity column {0}")]
    VarBackfill(String),

    #[error("column {column} has conflicting types across inputs: {left} vs {right}")]
    TypeConflict {
        column: String,
        left: ScalarType,
        right: ScalarType,
    },
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("no input files given")]
    NoInputs,

    #[error("output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("input {} lacks object {name}", .file.display())]
    MissingInInput { file: PathBuf, name: String },

    #[error("summary {name} bin count differs across inputs: {left} vs {right}")]
    SummaryShape {
        name: String,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema-hash map required (provide one or waive it explicitly)")]
    HashMapRequired,

    #[error("hash map covers {got} files but the manifest lists {expected}")]
    HashCountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to submit unit of work: {0}")]
    Submit(String),

    #[error("worker spawn failed: {0}")]
    Spawn(String),

    #[error("worker task join failed: {0}")]
    Join(String),
}
