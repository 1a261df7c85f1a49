use indexmap::IndexMap;

use crate::engine::store::StoredTable;
use crate::engine::store::format::{Arity, ScalarType};

/// Conventional row-table names. The primary table carries the per-event
/// payload and is the one schema fingerprints are computed from.
pub const PRIMARY_TABLE: &str = "Events";
pub const RUNS_TABLE: &str = "Runs";

/// Declared shape of one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub ty: ScalarType,
    pub arity: Arity,
}

/// Ordered column set of one row-table. Within one schema a name maps to
/// exactly one (type, arity).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSchema {
    columns: IndexMap<String, ColumnSchema>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: &StoredTable) -> Self {
        let mut schema = Self::new();
        for column in &table.columns {
            schema.insert(ColumnSchema {
                name: column.name.clone(),
                ty: column.ty,
                arity: column.arity,
            });
        }
        schema
    }

    pub fn insert(&mut self, column: ColumnSchema) {
        self.columns.insert(column.name.clone(), column);
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Retains only the named columns, preserving this schema's order.
    pub fn retain<F: Fn(&str) -> bool>(&self, keep: F) -> Self {
        let mut filtered = Self::new();
        for column in self.columns.values() {
            if keep(&column.name) {
                filtered.insert(column.clone());
            }
        }
        filtered
    }
}

/// Which column types may be zero-backfilled into a table.
///
/// The primary table restricts auto-backfill to booleans unless explicitly
/// overridden; the Runs table (and any other table) admits every supported
/// scalar type.
#[derive(Clone, Copy, Debug)]
pub struct BackfillPolicy {
    pub allow_non_bool: bool,
}

impl BackfillPolicy {
    pub fn for_table(table: &str, allow_non_bool: bool) -> Self {
        if table == PRIMARY_TABLE {
            Self { allow_non_bool }
        } else {
            Self {
                allow_non_bool: true,
            }
        }
    }

    pub fn admits(&self, ty: ScalarType) -> bool {
        self.allow_non_bool || ty == ScalarType::Bool
    }
}
