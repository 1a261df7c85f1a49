use crate::engine::errors::StoreError;
use crate::engine::store::format::ScalarType;

/// Decoded column values, one variant per supported scalar type.
///
/// Variable-arity columns store their flattened values here; the per-row
/// element counts travel separately.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValues {
    Bool(Vec<bool>),
    F32(Vec<f32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    F64(Vec<f64>),
}

impl ColumnValues {
    /// A zero-filled buffer of `n` values: the type's natural zero.
    pub fn zeros(ty: ScalarType, n: usize) -> Self {
        match ty {
            ScalarType::Bool => ColumnValues::Bool(vec![false; n]),
            ScalarType::F32 => ColumnValues::F32(vec![0.0; n]),
            ScalarType::U32 => ColumnValues::U32(vec![0; n]),
            ScalarType::I64 => ColumnValues::I64(vec![0; n]),
            ScalarType::F64 => ColumnValues::F64(vec![0.0; n]),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ColumnValues::Bool(_) => ScalarType::Bool,
            ColumnValues::F32(_) => ScalarType::F32,
            ColumnValues::U32(_) => ScalarType::U32,
            ColumnValues::I64(_) => ScalarType::I64,
            ColumnValues::F64(_) => ScalarType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Bool(v) => v.len(),
            ColumnValues::F32(v) => v.len(),
            ColumnValues::U32(v) => v.len(),
            ColumnValues::I64(v) => v.len(),
            ColumnValues::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `other` onto `self`. The types must match.
    pub fn extend(&mut self, other: &ColumnValues) -> Result<(), StoreError> {
        match (self, other) {
            (ColumnValues::Bool(a), ColumnValues::Bool(b)) => a.extend_from_slice(b),
            (ColumnValues::F32(a), ColumnValues::F32(b)) => a.extend_from_slice(b),
            (ColumnValues::U32(a), ColumnValues::U32(b)) => a.extend_from_slice(b),
            (ColumnValues::I64(a), ColumnValues::I64(b)) => a.extend_from_slice(b),
            (ColumnValues::F64(a), ColumnValues::F64(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(StoreError::Codec(format!(
                    "cannot append {} values onto {}",
                    b.scalar_type(),
                    a.scalar_type()
                )));
            }
        }
        Ok(())
    }

    /// Little-endian value encoding. Bools encode as one byte each.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            ColumnValues::Bool(v) => v.iter().map(|b| *b as u8).collect(),
            ColumnValues::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnValues::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnValues::I64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            ColumnValues::F64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    pub fn from_le_bytes(ty: ScalarType, bytes: &[u8]) -> Result<Self, StoreError> {
        let width = ty.width();
        if bytes.len() % width != 0 {
            return Err(StoreError::PayloadShape);
        }
        let values = match ty {
            ScalarType::Bool => ColumnValues::Bool(bytes.iter().map(|b| *b != 0).collect()),
            ScalarType::F32 => ColumnValues::F32(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            ScalarType::U32 => ColumnValues::U32(
                bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            ScalarType::I64 => ColumnValues::I64(
                bytes
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            ScalarType::F64 => ColumnValues::F64(
                bytes
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
        };
        Ok(values)
    }
}
