//! Report writers.
//!
//! Thin I/O over the formats the pipeline emits; no decision logic here. The
//! CSV shapes are contracts consumed by downstream tooling: constraint and
//! notes fields are always quoted, everything else is written bare.

pub mod cli;

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::{Hit, Inventory, NearMiss, ScanSummary};

pub const REPORT_JSON_FILE: &str = "report.json";
pub const REPORT_CSV_FILE: &str = "report.csv";
pub const INVENTORY_FILE: &str = "inventory.csv";
pub const UNIQUE_PACKAGES_FILE: &str = "unique-packages.txt";
pub const INTERSECTION_FILE: &str = "intersection.txt";
pub const INTERSECTION_COUNT_FILE: &str = "intersection-count.txt";
pub const NEAR_MISS_FILE: &str = "near-miss.csv";

fn ensure_out_dir(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        fs::create_dir_all(out_dir)?;
    }
    Ok(())
}

/// Write `report.json` (summary) and `report.csv` (flat hit table).
pub fn write_scan_report(out_dir: &Path, summary: &ScanSummary, hits: &[Hit]) -> Result<()> {
    ensure_out_dir(out_dir)?;
    fs::write(
        out_dir.join(REPORT_JSON_FILE),
        serde_json::to_string_pretty(summary)?,
    )?;

    let mut contents =
        String::from("lockfilePath,packageName,resolvedVersion,vulnerableConstraint,notes\n");
    let lines: Vec<String> = hits
        .iter()
        .map(|h| {
            format!(
                "{},{},{},\"{}\",\"{}\"",
                h.lockfile_path, h.package_name, h.resolved_version, h.vulnerable_constraint, h.notes
            )
        })
        .collect();
    contents.push_str(&lines.join("\n"));
    fs::write(out_dir.join(REPORT_CSV_FILE), contents)?;
    Ok(())
}

/// Write `inventory.csv` (one row per occurrence) and `unique-packages.txt`
/// (deduplicated names, newline-delimited, no header).
pub fn write_inventory(out_dir: &Path, inventory: &Inventory) -> Result<()> {
    ensure_out_dir(out_dir)?;

    let mut contents = String::from("packageName,version,lockfilePath\n");
    let lines: Vec<String> = inventory
        .rows()
        .iter()
        .map(|r| format!("{},{},{}", r.package_name, r.version, r.lockfile_path))
        .collect();
    contents.push_str(&lines.join("\n"));
    fs::write(out_dir.join(INVENTORY_FILE), contents)?;

    fs::write(
        out_dir.join(UNIQUE_PACKAGES_FILE),
        inventory.unique_names().join("\n"),
    )?;
    Ok(())
}

/// Write `intersection.txt` (one name per line) and `intersection-count.txt`
/// (a bare integer).
pub fn write_compare(out_dir: &Path, intersection: &[String]) -> Result<()> {
    ensure_out_dir(out_dir)?;
    fs::write(out_dir.join(INTERSECTION_FILE), intersection.join("\n"))?;
    fs::write(
        out_dir.join(INTERSECTION_COUNT_FILE),
        intersection.len().to_string(),
    )?;
    Ok(())
}

/// Write `near-miss.csv`; the constraint field is quoted.
pub fn write_near_miss(out_dir: &Path, misses: &[NearMiss]) -> Result<()> {
    ensure_out_dir(out_dir)?;
    let mut contents = String::from("packageName,requiredConstraint,resolvedVersion,lockfilePath\n");
    let lines: Vec<String> = misses
        .iter()
        .map(|m| {
            format!(
                "{},\"{}\",{},{}",
                m.package_name, m.required_constraint, m.resolved_version, m.lockfile_path
            )
        })
        .collect();
    contents.push_str(&lines.join("\n"));
    fs::write(out_dir.join(NEAR_MISS_FILE), contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_hit_rows_quote_constraint_and_notes() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = ScanSummary {
            scanned_at: Utc::now(),
            target: ".".to_string(),
            csv: "auth.csv".to_string(),
            total_lockfiles: 1,
            hits_count: 1,
            unparsable_constraints: vec![],
        };
        let hits = vec![Hit {
            lockfile_path: "a/package-lock.json".to_string(),
            package_name: "foo".to_string(),
            resolved_version: "1.0.0".to_string(),
            vulnerable_constraint: ">=1.0.0 <2.0.0".to_string(),
            notes: "see advisory, upgrade".to_string(),
        }];
        write_scan_report(tmp.path(), &summary, &hits).unwrap();

        let csv = fs::read_to_string(tmp.path().join(REPORT_CSV_FILE)).unwrap();
        assert!(csv.contains(
            "a/package-lock.json,foo,1.0.0,\">=1.0.0 <2.0.0\",\"see advisory, upgrade\""
        ));
    }

    #[test]
    fn test_empty_hit_list_writes_header_only() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = ScanSummary {
            scanned_at: Utc::now(),
            target: ".".to_string(),
            csv: "auth.csv".to_string(),
            total_lockfiles: 0,
            hits_count: 0,
            unparsable_constraints: vec![],
        };
        write_scan_report(tmp.path(), &summary, &[]).unwrap();
        let csv = fs::read_to_string(tmp.path().join(REPORT_CSV_FILE)).unwrap();
        assert_eq!(
            csv,
            "lockfilePath,packageName,resolvedVersion,vulnerableConstraint,notes\n"
        );
    }

    #[test]
    fn test_report_json_field_names_are_camel_case() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = ScanSummary {
            scanned_at: Utc::now(),
            target: "repos".to_string(),
            csv: "auth.csv".to_string(),
            total_lockfiles: 2,
            hits_count: 0,
            unparsable_constraints: vec![],
        };
        write_scan_report(tmp.path(), &summary, &[]).unwrap();
        let json = fs::read_to_string(tmp.path().join(REPORT_JSON_FILE)).unwrap();
        assert!(json.contains("\"scannedAt\""));
        assert!(json.contains("\"totalLockfiles\": 2"));
        assert!(json.contains("\"unparsableConstraints\""));
    }
}
