//! Authoritative CSV rows and the constraint table.
//!
//! The authoritative source format is not guaranteed to use one canonical
//! header, so package names and constraints are resolved through ordered
//! alias lists tried in sequence against the raw row.

use std::collections::HashMap;
use std::path::Path;

use crate::checker;
use crate::error::{Error, Result};
use crate::model::InvalidConstraint;

/// Column aliases for the package name, in priority order.
pub const NAME_ALIASES: &[&str] = &["packageName", "package", "name", "Package", "PACKAGE"];

/// Column aliases for the vulnerable constraint, in priority order.
pub const CONSTRAINT_ALIASES: &[&str] = &[
    "vulnerableConstraint",
    "constraint",
    "range",
    "Version",
    "version",
    "VersionRange",
    "VersionConstraint",
];

const NOTE_ALIASES: &[&str] = &["notes", "note", "description"];

/// One CSV row with its column order preserved, so positional fallbacks work
/// on header-less or oddly-headed files.
#[derive(Debug, Clone)]
pub struct RawRow {
    columns: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    /// Exact-header lookup.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among `aliases`, trimmed. Empty string when no
    /// alias carries a value.
    pub fn first_of(&self, aliases: &[&str]) -> &str {
        aliases
            .iter()
            .filter_map(|a| self.get(a))
            .find(|v| !v.is_empty())
            .map(str::trim)
            .unwrap_or("")
    }

    /// Value of the column at `idx`, trimmed; empty when out of range.
    pub fn position(&self, idx: usize) -> &str {
        self.columns
            .get(idx)
            .map(|(_, v)| v.trim())
            .unwrap_or("")
    }

    /// Alias lookup with a positional fallback, for files whose headers match
    /// none of the aliases.
    pub fn first_of_or_position(&self, aliases: &[&str], idx: usize) -> &str {
        let v = self.first_of(aliases);
        if v.is_empty() {
            self.position(idx)
        } else {
            v
        }
    }
}

/// Read a header-driven CSV into raw rows. Records shorter than the header
/// are padded with empty values.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
    let headers = reader
        .headers()
        .map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(RawRow::new(columns));
    }
    Ok(rows)
}

/// Normalize a raw constraint for storage and parsing: trim, glue equality
/// operators to their version (`"= 1.2.3"` -> `"=1.2.3"`), and strip one
/// layer of surrounding quotes. Idempotent.
pub fn normalize_constraint(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '=' {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
        }
    }

    let stripped = out.strip_prefix('"').unwrap_or(&out);
    let stripped = stripped.strip_suffix('"').unwrap_or(stripped);
    stripped.to_string()
}

/// A stored (range, notes) pair for one authoritative row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    pub range: String,
    pub notes: String,
}

/// Mapping from package name to its vulnerable constraints, insertion order
/// preserved per package. Immutable after construction.
#[derive(Debug, Default)]
pub struct ConstraintTable {
    map: HashMap<String, Vec<VersionConstraint>>,
}

impl ConstraintTable {
    /// Build the table from raw rows. Rows with an empty resolved name are
    /// excluded entirely; rows with an empty normalized constraint are
    /// silently excluded as an input-quality policy - an empty constraint
    /// cannot be matched against.
    pub fn from_rows(rows: &[RawRow]) -> Self {
        let mut map: HashMap<String, Vec<VersionConstraint>> = HashMap::new();
        for row in rows {
            let name = row.first_of(NAME_ALIASES);
            if name.is_empty() {
                continue;
            }
            let range = normalize_constraint(row.first_of(CONSTRAINT_ALIASES));
            if range.is_empty() {
                continue;
            }
            let notes = row.first_of(NOTE_ALIASES).to_string();
            map.entry(name.to_string())
                .or_default()
                .push(VersionConstraint { range, notes });
        }
        Self { map }
    }

    /// All stored constraints for `name`, in insertion order.
    pub fn get(&self, name: &str) -> &[VersionConstraint] {
        self.map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn package_count(&self) -> usize {
        self.map.len()
    }
}

/// Up-front validation pass over every row that carries a constraint,
/// independent of whether any lockfile references the package. Rows with an
/// empty name are still surfaced here for diagnostics even though the table
/// excludes them.
pub fn validate_rows(rows: &[RawRow]) -> Vec<InvalidConstraint> {
    let mut invalid = Vec::new();
    for row in rows {
        let name = row.first_of(NAME_ALIASES);
        let raw = row.first_of(CONSTRAINT_ALIASES);
        if raw.is_empty() {
            continue;
        }
        if !checker::is_valid_range(raw) {
            invalid.push(InvalidConstraint {
                name: name.to_string(),
                raw_constraint: raw.to_string(),
            });
        }
    }
    invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::new(
            pairs
                .iter()
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_normalize_constraint_glues_equals() {
        assert_eq!(normalize_constraint("= 1.2.3"), "=1.2.3");
        assert_eq!(normalize_constraint(">= 1.2.3"), ">=1.2.3");
        assert_eq!(normalize_constraint("= 2.23.2 || = 2.23.3"), "=2.23.2 || =2.23.3");
    }

    #[test]
    fn test_normalize_constraint_strips_quotes_and_whitespace() {
        assert_eq!(normalize_constraint("  ~1.2.3  "), "~1.2.3");
        assert_eq!(normalize_constraint("\"^2.0.0\""), "^2.0.0");
        assert_eq!(normalize_constraint("\"= 1.0.0\""), "=1.0.0");
    }

    #[test]
    fn test_normalize_constraint_is_idempotent() {
        for raw in ["= 1.2.3", "\"~1.0.4\"", "  >= 2.0.0 ", "^1.2.3", ""] {
            let once = normalize_constraint(raw);
            assert_eq!(normalize_constraint(&once), once, "raw: {raw:?}");
        }
    }

    #[test]
    fn test_table_accepts_alias_variants() {
        let rows = vec![
            row(&[("Package", "foo"), ("Version", "= 1.0.0")]),
            row(&[("packageName", "bar"), ("vulnerableConstraint", "^2.0.0")]),
        ];
        let table = ConstraintTable::from_rows(&rows);
        assert_eq!(table.get("foo"), [VersionConstraint {
            range: "=1.0.0".to_string(),
            notes: String::new(),
        }]);
        assert_eq!(table.get("bar").len(), 1);
        assert_eq!(table.get("bar")[0].range, "^2.0.0");
    }

    #[test]
    fn test_table_preserves_multiple_constraints_per_package() {
        let rows = vec![
            row(&[("name", "foo"), ("range", "~1.0.0"), ("notes", "first")]),
            row(&[("name", "foo"), ("range", "~2.0.0"), ("notes", "second")]),
        ];
        let table = ConstraintTable::from_rows(&rows);
        let stored = table.get("foo");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].range, "~1.0.0");
        assert_eq!(stored[0].notes, "first");
        assert_eq!(stored[1].range, "~2.0.0");
    }

    #[test]
    fn test_table_excludes_empty_names_and_constraints() {
        let rows = vec![
            row(&[("name", ""), ("range", "^1.0.0")]),
            row(&[("name", "foo"), ("range", "")]),
            row(&[("name", "bar"), ("range", "^2.0.0")]),
        ];
        let table = ConstraintTable::from_rows(&rows);
        assert_eq!(table.package_count(), 1);
        assert!(table.get("foo").is_empty());
        assert_eq!(table.get("bar").len(), 1);
    }

    #[test]
    fn test_alias_priority_order() {
        // packageName outranks Package even when both are present.
        let r = row(&[("Package", "loser"), ("packageName", "winner")]);
        assert_eq!(r.first_of(NAME_ALIASES), "winner");
    }

    #[test]
    fn test_validate_rows_collects_unparsable_constraints() {
        let rows = vec![
            row(&[("name", "good"), ("range", "~1.0.0")]),
            row(&[("name", "bad"), ("range", "not-a-range")]),
            row(&[("name", ""), ("range", "also!bad")]),
            row(&[("name", "empty"), ("range", "")]),
        ];
        let invalid = validate_rows(&rows);
        assert_eq!(invalid.len(), 2);
        assert_eq!(invalid[0].name, "bad");
        assert_eq!(invalid[0].raw_constraint, "not-a-range");
        // Empty-name rows are still surfaced for diagnostics.
        assert_eq!(invalid[1].name, "");
    }

    #[test]
    fn test_positional_fallback() {
        let r = row(&[("weird", "foo"), ("headers", "1.2.3")]);
        assert_eq!(r.first_of_or_position(NAME_ALIASES, 0), "foo");
        assert_eq!(r.position(1), "1.2.3");
        assert_eq!(r.position(9), "");
    }
}
