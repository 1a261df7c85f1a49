use std::path::Path;

use crate::engine::store::format::Arity;
use crate::engine::store::{
    ColumnValues, DatasetWriter, DecodedColumn, StoredColumn, StoredObject, StoredOpaque,
    StoredSummary, StoredTable, StoredTag,
};

/// Scalar column spec for [`FileBuilder::table`].
pub fn col(name: &str, values: ColumnValues) -> (String, DecodedColumn) {
    (
        name.to_string(),
        DecodedColumn {
            values,
            counts: None,
        },
    )
}

/// Variable-arity column spec: flattened values plus per-row counts.
pub fn var_col(name: &str, values: ColumnValues, counts: Vec<u32>) -> (String, DecodedColumn) {
    (
        name.to_string(),
        DecodedColumn {
            values,
            counts: Some(counts),
        },
    )
}

/// Builds dataset files for tests.
pub struct FileBuilder {
    settings: u32,
    objects: Vec<StoredObject>,
}

impl FileBuilder {
    pub fn new() -> Self {
        Self {
            settings: 404,
            objects: Vec::new(),
        }
    }

    pub fn settings(mut self, id: u32) -> Self {
        self.settings = id;
        self
    }

    pub fn table(mut self, name: &str, cols: Vec<(String, DecodedColumn)>) -> Self {
        let codec = crate::engine::store::Codec::from_settings(self.settings).unwrap();
        let rows = cols
            .first()
            .map(|(_, d)| match &d.counts {
                Some(counts) => counts.len() as u64,
                None => d.values.len() as u64,
            })
            .unwrap_or(0);
        let columns = cols
            .iter()
            .map(|(col_name, decoded)| {
                let arity = if decoded.counts.is_some() {
                    Arity::Var
                } else {
                    Arity::Scalar
                };
                StoredColumn::from_decoded(
                    col_name,
                    decoded.values.scalar_type(),
                    arity,
                    decoded,
                    rows,
                    codec,
                )
                .unwrap()
            })
            .collect();
        self.objects.push(StoredObject::Table(StoredTable {
            name: name.to_string(),
            rows,
            columns,
        }));
        self
    }

    pub fn summary(mut self, name: &str, entries: u64, bins: Vec<f64>) -> Self {
        self.objects.push(StoredObject::Summary(StoredSummary {
            name: name.to_string(),
            entries,
            bins,
        }));
        self
    }

    pub fn tag(mut self, name: &str, value: &str) -> Self {
        self.objects.push(StoredObject::Tag(StoredTag {
            name: name.to_string(),
            value: value.to_string(),
        }));
        self
    }

    pub fn opaque(mut self, name: &str, kind: u8) -> Self {
        self.objects.push(StoredObject::Opaque(StoredOpaque {
            name: name.to_string(),
            kind,
            bytes: vec![0xAB; 8],
        }));
        self
    }

    pub fn write(self, path: &Path) {
        let mut writer = DatasetWriter::create(path, self.settings).expect("create dataset file");
        for object in self.objects {
            writer.append(object);
        }
        writer.finish().expect("finish dataset file");
    }
}

/// Convenience: a file holding a single "Events" table with scalar columns.
pub fn events_file(path: &Path, settings: u32, cols: Vec<(String, DecodedColumn)>) {
    FileBuilder::new()
        .settings(settings)
        .table("Events", cols)
        .write(path);
}
