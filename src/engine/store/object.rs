use serde::{Deserialize, Serialize};

use crate::engine::errors::StoreError;
use crate::engine::store::codec::Codec;
use crate::engine::store::column::ColumnValues;
use crate::engine::store::format::{Arity, ScalarType};

/// A named top-level object inside a dataset file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StoredObject {
    Table(StoredTable),
    Summary(StoredSummary),
    Tag(StoredTag),
    /// Object kind this build does not recognize. Preserved on read so the
    /// merge engine can report it as unhandled instead of crashing.
    Opaque(StoredOpaque),
}

impl StoredObject {
    pub fn name(&self) -> &str {
        match self {
            StoredObject::Table(t) => &t.name,
            StoredObject::Summary(s) => &s.name,
            StoredObject::Tag(t) => &t.name,
            StoredObject::Opaque(o) => &o.name,
        }
    }
}

/// A row-table: ordered columns sharing one row count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredTable {
    pub name: String,
    pub rows: u64,
    pub columns: Vec<StoredColumn>,
}

impl StoredTable {
    pub fn column(&self, name: &str) -> Option<&StoredColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// One column of a row-table, stored as a list of independently compressed
/// blocks. Structural merging concatenates block lists without re-encoding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredColumn {
    pub name: String,
    pub ty: ScalarType,
    pub arity: Arity,
    pub blocks: Vec<ColumnBlock>,
}

/// A compressed run of values. For `Var` columns, `counts` carries the
/// compressed per-row element counts (u32 little-endian).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnBlock {
    pub rows: u64,
    pub counts: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// Fully decoded column content.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedColumn {
    pub values: ColumnValues,
    pub counts: Option<Vec<u32>>,
}

impl StoredColumn {
    /// Encodes decoded content into a single-block column.
    pub fn from_decoded(
        name: &str,
        ty: ScalarType,
        arity: Arity,
        decoded: &DecodedColumn,
        rows: u64,
        codec: Codec,
    ) -> Result<Self, StoreError> {
        let payload = codec.compress(&decoded.values.to_le_bytes())?;
        let counts = match (&arity, &decoded.counts) {
            (Arity::Var, Some(counts)) => {
                let raw: Vec<u8> = counts.iter().flat_map(|c| c.to_le_bytes()).collect();
                Some(codec.compress(&raw)?)
            }
            (Arity::Scalar, _) => None,
            (Arity::Var, None) => {
                return Err(StoreError::Codec(format!(
                    "variable-arity column {name} encoded without counts"
                )));
            }
        };
        Ok(Self {
            name: name.to_string(),
            ty,
            arity,
            blocks: vec![ColumnBlock {
                rows,
                counts,
                payload,
            }],
        })
    }

    /// A zero-filled scalar column of `rows` values.
    pub fn zeros(name: &str, ty: ScalarType, rows: u64, codec: Codec) -> Result<Self, StoreError> {
        let decoded = DecodedColumn {
            values: ColumnValues::zeros(ty, rows as usize),
            counts: None,
        };
        Self::from_decoded(name, ty, Arity::Scalar, &decoded, rows, codec)
    }

    /// Decodes every block and concatenates values (and counts, for `Var`).
    pub fn decode(&self, codec: Codec) -> Result<DecodedColumn, StoreError> {
        let mut values = ColumnValues::zeros(self.ty, 0);
        let mut counts: Option<Vec<u32>> = match self.arity {
            Arity::Var => Some(Vec::new()),
            Arity::Scalar => None,
        };
        for block in &self.blocks {
            let raw = codec.decompress(&block.payload)?;
            let block_values = ColumnValues::from_le_bytes(self.ty, &raw)?;
            values.extend(&block_values)?;
            if let Some(all_counts) = counts.as_mut() {
                let enc = block
                    .counts
                    .as_ref()
                    .ok_or_else(|| StoreError::Codec(format!("column {} lacks counts", self.name)))?;
                let raw = codec.decompress(enc)?;
                if raw.len() % 4 != 0 {
                    return Err(StoreError::PayloadShape);
                }
                all_counts.extend(
                    raw.chunks_exact(4)
                        .map(|c| u32::from_le_bytes(c.try_into().unwrap())),
                );
            }
        }
        Ok(DecodedColumn { values, counts })
    }

    pub fn rows(&self) -> u64 {
        self.blocks.iter().map(|b| b.rows).sum()
    }
}

/// Summary aggregate: fixed-length bins merged by elementwise summation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredSummary {
    pub name: String,
    pub entries: u64,
    pub bins: Vec<f64>,
}

/// String/tag object, expected identical across files of one dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredTag {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredOpaque {
    pub name: String,
    pub kind: u8,
    pub bytes: Vec<u8>,
}
