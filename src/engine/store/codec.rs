use crate::engine::errors::StoreError;

/// Block-level compression codec, derived from a file's compression settings
/// id (`algorithm * 100 + level`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    None,
    Lz4,
    Zstd(i32),
}

impl Codec {
    pub fn from_settings(id: u32) -> Result<Self, StoreError> {
        match (id / 100, id % 100) {
            (0, 0) => Ok(Codec::None),
            (4, _) => Ok(Codec::Lz4),
            (5, level) => Ok(Codec::Zstd(level as i32)),
            _ => Err(StoreError::UnknownCompression(id)),
        }
    }

    pub fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self {
            Codec::None => Ok(raw.to_vec()),
            Codec::Lz4 => Ok(lz4_flex::compress_prepend_size(raw)),
            Codec::Zstd(level) => {
                zstd::stream::encode_all(raw, *level).map_err(|e| StoreError::Codec(e.to_string()))
            }
        }
    }

    pub fn decompress(&self, enc: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self {
            Codec::None => Ok(enc.to_vec()),
            Codec::Lz4 => lz4_flex::decompress_size_prepended(enc)
                .map_err(|e| StoreError::Codec(e.to_string())),
            Codec::Zstd(_) => {
                zstd::stream::decode_all(enc).map_err(|e| StoreError::Codec(e.to_string()))
            }
        }
    }
}
