use std::fs::File;
use std::path::Path;

use indexmap::IndexSet;
use tracing::info;

use crate::engine::errors::PlanError;

/// Ordered set of column names to retain in the primary row-table. Columns
/// outside the list are dropped before reconciliation and never backfilled.
#[derive(Clone, Debug)]
pub struct AllowList {
    names: IndexSet<String>,
}

impl AllowList {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Loads a JSON array of column names.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let names: Vec<String> = serde_json::from_reader(File::open(path)?)?;
        info!(
            target: "merge::allowlist",
            file = %path.display(),
            columns = names.len(),
            "Loaded column allow-list"
        );
        Ok(Self::new(names))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn loads_ordered_name_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("branches.json");
        std::fs::write(
            &path,
            indoc! {r#"
                ["nJet", "Jet_pt", "Jet_eta"]
            "#},
        )
        .unwrap();

        let allow = AllowList::load(&path).unwrap();
        assert_eq!(allow.len(), 3);
        assert!(allow.contains("Jet_pt"));
        assert!(!allow.contains("Jet_phi"));
    }
}
