use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One (package, version, lockfile) occurrence. The row list is deliberately
/// not deduplicated; the same pin in two lockfiles yields two rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub package_name: String,
    pub version: String,
    pub lockfile_path: String,
}

/// Flat census of every resolved package across a sweep, plus the distinct
/// package-name set in first-occurrence order.
#[derive(Debug, Default)]
pub struct Inventory {
    rows: Vec<InventoryRow>,
    unique_names: Vec<String>,
    seen: HashSet<String>,
}

impl Inventory {
    pub fn push(&mut self, row: InventoryRow) {
        if !self.seen.contains(&row.package_name) {
            self.seen.insert(row.package_name.clone());
            self.unique_names.push(row.package_name.clone());
        }
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[InventoryRow] {
        &self.rows
    }

    pub fn unique_names(&self) -> &[String] {
        &self.unique_names
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, version: &str, path: &str) -> InventoryRow {
        InventoryRow {
            package_name: name.to_string(),
            version: version.to_string(),
            lockfile_path: path.to_string(),
        }
    }

    #[test]
    fn test_rows_are_not_deduplicated() {
        let mut inv = Inventory::default();
        inv.push(row("foo", "1.0.0", "a/package-lock.json"));
        inv.push(row("foo", "1.0.0", "b/package-lock.json"));
        assert_eq!(inv.rows().len(), 2);
    }

    #[test]
    fn test_unique_names_keep_first_occurrence_order() {
        let mut inv = Inventory::default();
        inv.push(row("zeta", "1.0.0", "a"));
        inv.push(row("alpha", "2.0.0", "a"));
        inv.push(row("zeta", "3.0.0", "b"));
        assert_eq!(inv.unique_names(), ["zeta", "alpha"]);
    }
}
