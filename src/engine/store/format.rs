use serde::{Deserialize, Serialize};

use crate::engine::errors::StoreError;

/// Magic bytes at the start of every dataset file.
pub const MAGIC: [u8; 4] = *b"TMF1";
pub const FORMAT_VERSION: u16 = 1;

/// File extension used for dataset files written by this tool.
pub const DATA_EXT: &str = "tmf";

/// Compression settings forced onto the output when inputs disagree.
/// Settings ids follow the `algorithm * 100 + level` convention:
/// 0 = uncompressed, 4xx = LZ4, 5xx = ZSTD.
pub const FALLBACK_COMPRESSION: u32 = 404;

/// Scalar value type of a column. Closed enumeration: anything outside it
/// fails fast instead of being silently mis-encoded.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Bool = 0,
    F32 = 1,
    U32 = 2,
    I64 = 3,
    F64 = 4,
}

impl ScalarType {
    pub fn from_tag(v: u8) -> Result<Self, StoreError> {
        match v {
            0 => Ok(ScalarType::Bool),
            1 => Ok(ScalarType::F32),
            2 => Ok(ScalarType::U32),
            3 => Ok(ScalarType::I64),
            4 => Ok(ScalarType::F64),
            other => Err(StoreError::UnknownTypeTag(other)),
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Encoded width of one value in bytes.
    pub fn width(self) -> usize {
        match self {
            ScalarType::Bool => 1,
            ScalarType::F32 | ScalarType::U32 => 4,
            ScalarType::I64 | ScalarType::F64 => 8,
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScalarType::Bool => "Bool",
            ScalarType::F32 => "F32",
            ScalarType::U32 => "U32",
            ScalarType::I64 => "I64",
            ScalarType::F64 => "F64",
        };
        f.write_str(name)
    }
}

/// Column arity: one value per row, or a variable-length vector per row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    Scalar,
    Var,
}

/// Fixed-size header at the start of a dataset file.
#[derive(Clone, Copy, Debug)]
pub struct FileHeader {
    pub version: u16,
    pub settings: u32,
}

impl FileHeader {
    pub const LEN: usize = 4 + 2 + 4;

    pub fn new(settings: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            settings,
        }
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.settings.to_le_bytes());
    }

    pub fn read_from(slice: &[u8]) -> Result<Self, StoreError> {
        if slice.len() < Self::LEN {
            return Err(StoreError::BadMagic);
        }
        if slice[..4] != MAGIC {
            return Err(StoreError::BadMagic);
        }
        let mut v = [0u8; 2];
        v.copy_from_slice(&slice[4..6]);
        let version = u16::from_le_bytes(v);
        if version != FORMAT_VERSION {
            return Err(StoreError::Version(version));
        }
        let mut s = [0u8; 4];
        s.copy_from_slice(&slice[6..10]);
        let settings = u32::from_le_bytes(s);
        Ok(Self { version, settings })
    }
}
