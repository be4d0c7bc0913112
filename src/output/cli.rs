//! Terminal rendering of scan results.

use tabled::{settings::Style, Table, Tabled};

use crate::model::{Hit, NearMiss, ScanSummary};
use crate::ops::CompareOutcome;

#[derive(Tabled)]
struct HitRow {
    #[tabled(rename = "Lockfile")]
    lockfile: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Constraint")]
    constraint: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

#[derive(Tabled)]
struct NearMissRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Resolved")]
    resolved: String,
    #[tabled(rename = "Lockfile")]
    lockfile: String,
}

pub fn print_scan_result(summary: &ScanSummary, hits: &[Hit], out_dir: &str) {
    if !summary.unparsable_constraints.is_empty() {
        println!(
            "Warning: {} unparsable constraint(s) found in authoritative CSV:",
            summary.unparsable_constraints.len()
        );
        for ic in &summary.unparsable_constraints {
            let name = if ic.name.is_empty() { "<unknown>" } else { &ic.name };
            println!(" - {}: {}", name, ic.raw_constraint);
        }
        println!();
    }

    if !hits.is_empty() {
        let rows: Vec<HitRow> = hits
            .iter()
            .map(|h| HitRow {
                lockfile: truncate(&h.lockfile_path, 50),
                package: truncate(&h.package_name, 40),
                version: h.resolved_version.clone(),
                constraint: truncate(&h.vulnerable_constraint, 30),
                notes: truncate(&h.notes, 40),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
        println!();
    }

    println!(
        "Scan complete. lockfiles: {} hits: {}",
        summary.total_lockfiles, summary.hits_count
    );
    println!("Wrote report.json and report.csv to {}", out_dir);
}

pub fn print_inventory_result(rows: usize, unique: usize, out_dir: &str) {
    println!(
        "Inventory written to {} unique packages: {}",
        out_dir, unique
    );
    println!("rows: {}", rows);
}

pub fn print_compare_result(outcome: &CompareOutcome) {
    for name in &outcome.intersection {
        println!("{}", name);
    }
    println!("Compare complete. intersection: {}", outcome.intersection.len());
}

pub fn print_near_miss_result(misses: &[NearMiss], out_dir: &str) {
    if !misses.is_empty() {
        let rows: Vec<NearMissRow> = misses
            .iter()
            .map(|m| NearMissRow {
                package: truncate(&m.package_name, 40),
                required: truncate(&m.required_constraint, 30),
                resolved: m.resolved_version.clone(),
                lockfile: truncate(&m.lockfile_path, 50),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }
    println!("Wrote near-miss.csv to {} rows: {}", out_dir, misses.len());
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_strings_untouched() {
        assert_eq!(truncate("lodash", 40), "lodash");
    }

    #[test]
    fn test_truncate_long_strings_get_ellipsis() {
        let long = "a".repeat(60);
        let out = truncate(&long, 50);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 50);
    }
}
