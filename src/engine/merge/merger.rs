use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::engine::errors::{MergeError, StoreError};
use crate::engine::merge::allowlist::AllowList;
use crate::engine::merge::strategy::{MergeMode, MergeStrategy, select_mode};
use crate::engine::schema::types::PRIMARY_TABLE;
use crate::engine::schema::{BackfillPolicy, TableSchema, reconcile};
use crate::engine::store::format::{Arity, FALLBACK_COMPRESSION};
use crate::engine::store::{
    Codec, ColumnValues, DatasetFile, DatasetWriter, DecodedColumn, StoredColumn, StoredObject,
    StoredSummary, StoredTable, StoredTag,
};

pub struct MergeOptions {
    /// Columns of the primary row-table to retain; everything else is
    /// dropped before reconciliation and never backfilled.
    pub allow_list: Option<AllowList>,
    /// Admit non-boolean zero-backfill into the primary table.
    pub allow_non_bool: bool,
    /// Compression settings forced when inputs disagree.
    pub fallback_settings: u32,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            allow_list: None,
            allow_non_bool: false,
            fallback_settings: FALLBACK_COMPRESSION,
        }
    }
}

#[derive(Debug)]
pub struct MergeReport {
    pub output: PathBuf,
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Row counts per merged row-table.
    pub rows: IndexMap<String, u64>,
    /// Names of objects of unrecognized kind that were skipped.
    pub unhandled: Vec<String>,
}

impl MergeReport {
    /// Output bytes over summed input bytes.
    pub fn ratio(&self) -> f64 {
        self.output_bytes as f64 / self.input_bytes as f64
    }

    pub fn primary_rows(&self) -> u64 {
        self.rows.get(PRIMARY_TABLE).copied().unwrap_or(0)
    }
}

/// One input's contribution to a merged row-table: its (filtered) columns,
/// row count, and the codec its blocks were written with.
struct TablePart<'a> {
    rows: u64,
    codec: Codec,
    columns: IndexMap<&'a str, &'a StoredColumn>,
}

impl<'a> TablePart<'a> {
    fn schema(&self) -> TableSchema {
        let mut schema = TableSchema::new();
        for column in self.columns.values() {
            schema.insert(crate::engine::schema::ColumnSchema {
                name: column.name.clone(),
                ty: column.ty,
                arity: column.arity,
            });
        }
        schema
    }
}

/// Merges ordered input files into one output file, reconciling row-table
/// schemas, summing summary aggregates, and passing tags through.
pub struct Merger {
    options: MergeOptions,
}

impl Merger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    pub fn merge(&self, out: &Path, inputs: &[PathBuf]) -> Result<MergeReport, MergeError> {
        if inputs.is_empty() {
            return Err(MergeError::NoInputs);
        }

        let mut files = Vec::with_capacity(inputs.len());
        let mut input_bytes = 0u64;
        for path in inputs {
            info!(target: "merge::merger", file = %path.display(), "Adding file");
            let file = DatasetFile::open(path)?;
            input_bytes += file.byte_size;
            files.push(file);
        }

        let mode = select_mode(&files, self.options.fallback_settings);
        let mut writer = DatasetWriter::create(out, mode.settings).map_err(|e| match e {
            StoreError::Io(io) if io.kind() == std::io::ErrorKind::AlreadyExists => {
                MergeError::OutputExists(out.to_path_buf())
            }
            other => MergeError::Store(other),
        })?;
        let out_codec = writer.codec();

        let mut rows = IndexMap::new();
        let mut unhandled = Vec::new();

        // A group-fatal error must not leave a partial output behind: the
        // planner's idempotence check treats any existing file as done.
        if let Err(e) = self.append_objects(&files, &mut writer, mode, out_codec, &mut rows, &mut unhandled)
        {
            drop(writer);
            let _ = std::fs::remove_file(out);
            return Err(e);
        }

        let output_bytes = writer.finish()?;
        let report = MergeReport {
            output: out.to_path_buf(),
            input_bytes,
            output_bytes,
            rows,
            unhandled,
        };
        info!(
            target: "merge::merger",
            output = %out.display(),
            input_bytes,
            output_bytes,
            ratio = report.ratio(),
            "Merge finished"
        );
        Ok(report)
    }

    fn append_objects(
        &self,
        files: &[DatasetFile],
        writer: &mut DatasetWriter,
        mode: MergeMode,
        out_codec: Codec,
        rows: &mut IndexMap<String, u64>,
        unhandled: &mut Vec<String>,
    ) -> Result<(), MergeError> {
        for object in files[0].objects() {
            info!(target: "merge::merger", name = object.name(), "Merging object");
            match object {
                StoredObject::Table(table) => {
                    let merged = self.merge_table(table, files, mode, out_codec)?;
                    rows.insert(merged.name.clone(), merged.rows);
                    writer.append(StoredObject::Table(merged));
                }
                StoredObject::Summary(summary) => {
                    writer.append(StoredObject::Summary(merge_summary(summary, files)?));
                }
                StoredObject::Tag(tag) => {
                    check_tags(tag, files);
                    writer.append(StoredObject::Tag(tag.clone()));
                }
                StoredObject::Opaque(opaque) => {
                    warn!(
                        target: "merge::merger",
                        name = %opaque.name,
                        kind = opaque.kind,
                        "Cannot handle object kind, skipping"
                    );
                    unhandled.push(opaque.name.clone());
                }
            }
        }
        Ok(())
    }

    fn merge_table(
        &self,
        reference: &StoredTable,
        files: &[DatasetFile],
        mode: MergeMode,
        out_codec: Codec,
    ) -> Result<StoredTable, MergeError> {
        let name = reference.name.as_str();
        let policy = BackfillPolicy::for_table(name, self.options.allow_non_bool);
        let is_primary = name == PRIMARY_TABLE;

        let first = self.make_part(reference, files[0].codec()?, is_primary);
        let mut acc = first.schema();
        let mut parts = vec![first];

        for file in &files[1..] {
            let table = file.table(name).ok_or_else(|| MergeError::MissingInInput {
                file: file.path.clone(),
                name: name.to_string(),
            })?;
            let part = self.make_part(table, file.codec()?, is_primary);
            let (next, _plan) = reconcile(name, &acc, &part.schema(), &policy)?;
            acc = next;
            parts.push(part);
        }

        let total_rows: u64 = parts.iter().map(|p| p.rows).sum();
        let mut columns = Vec::with_capacity(acc.len());

        for spec in acc.iter() {
            let column = match mode.strategy {
                MergeStrategy::Structural => {
                    let mut blocks = Vec::new();
                    for part in &parts {
                        match part.columns.get(spec.name.as_str()) {
                            Some(col) => blocks.extend(col.blocks.iter().cloned()),
                            None => {
                                let zero =
                                    StoredColumn::zeros(&spec.name, spec.ty, part.rows, out_codec)?;
                                blocks.extend(zero.blocks);
                            }
                        }
                    }
                    StoredColumn {
                        name: spec.name.clone(),
                        ty: spec.ty,
                        arity: spec.arity,
                        blocks,
                    }
                }
                MergeStrategy::RowCopy => {
                    let mut values = ColumnValues::zeros(spec.ty, 0);
                    let mut counts: Option<Vec<u32>> = match spec.arity {
                        Arity::Var => Some(Vec::new()),
                        Arity::Scalar => None,
                    };
                    for part in &parts {
                        match part.columns.get(spec.name.as_str()) {
                            Some(col) => {
                                let decoded = col.decode(part.codec)?;
                                values.extend(&decoded.values)?;
                                if let Some(all) = counts.as_mut() {
                                    all.extend(decoded.counts.ok_or_else(|| {
                                        StoreError::Codec(format!(
                                            "column {} lacks counts",
                                            spec.name
                                        ))
                                    })?);
                                }
                            }
                            None => {
                                // Reconciliation rejects Var backfill, so a
                                // missing column here is always scalar.
                                values
                                    .extend(&ColumnValues::zeros(spec.ty, part.rows as usize))?;
                            }
                        }
                    }
                    let decoded = DecodedColumn { values, counts };
                    StoredColumn::from_decoded(
                        &spec.name, spec.ty, spec.arity, &decoded, total_rows, out_codec,
                    )?
                }
            };
            columns.push(column);
        }

        Ok(StoredTable {
            name: name.to_string(),
            rows: total_rows,
            columns,
        })
    }

    fn make_part<'a>(
        &self,
        table: &'a StoredTable,
        codec: Codec,
        is_primary: bool,
    ) -> TablePart<'a> {
        let columns = table
            .columns
            .iter()
            .filter(|col| {
                if !is_primary {
                    return true;
                }
                match &self.options.allow_list {
                    Some(allow) => allow.contains(&col.name),
                    None => true,
                }
            })
            .map(|col| (col.name.as_str(), col))
            .collect();
        TablePart {
            rows: table.rows,
            codec,
            columns,
        }
    }
}

fn merge_summary(
    reference: &StoredSummary,
    files: &[DatasetFile],
) -> Result<StoredSummary, MergeError> {
    let mut bins = reference.bins.clone();
    let mut entries = reference.entries;
    for file in &files[1..] {
        match file.object(&reference.name) {
            Some(StoredObject::Summary(other)) => {
                if other.bins.len() != bins.len() {
                    return Err(MergeError::SummaryShape {
                        name: reference.name.clone(),
                        left: bins.len(),
                        right: other.bins.len(),
                    });
                }
                for (acc, bin) in bins.iter_mut().zip(&other.bins) {
                    *acc += bin;
                }
                entries += other.entries;
            }
            _ => {
                return Err(MergeError::MissingInInput {
                    file: file.path.clone(),
                    name: reference.name.clone(),
                });
            }
        }
    }
    Ok(StoredSummary {
        name: reference.name.clone(),
        entries,
        bins,
    })
}

/// Tags are expected identical across a dataset; differences are logged and
/// the reference value wins.
fn check_tags(reference: &StoredTag, files: &[DatasetFile]) {
    for file in &files[1..] {
        match file.object(&reference.name) {
            Some(StoredObject::Tag(other)) if other.value == reference.value => {}
            Some(StoredObject::Tag(other)) => {
                warn!(
                    target: "merge::merger",
                    name = %reference.name,
                    reference = %reference.value,
                    other = %other.value,
                    file = %file.path.display(),
                    "Tag values are not matching"
                );
            }
            _ => {
                warn!(
                    target: "merge::merger",
                    name = %reference.name,
                    file = %file.path.display(),
                    "Tag object missing from input"
                );
            }
        }
    }
}
