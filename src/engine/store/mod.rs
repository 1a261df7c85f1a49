pub mod chain;
pub mod codec;
pub mod column;
pub mod file;
pub mod format;
pub mod object;

pub use chain::TableChain;
pub use codec::Codec;
pub use column::ColumnValues;
pub use file::{DatasetFile, DatasetWriter};
pub use object::{
    ColumnBlock, DecodedColumn, StoredColumn, StoredObject, StoredOpaque, StoredSummary,
    StoredTable, StoredTag,
};

#[cfg(test)]
mod file_test;
