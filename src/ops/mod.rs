//! The four operating modes: scan, inventory, compare, near-miss.
//!
//! Each operation is a plain function over explicit inputs; per-file results
//! accumulate into lists owned by the call, so a malformed lockfile or CSV row
//! is isolated without aborting the batch. Precondition failures (missing
//! paths, compare before inventory) surface before any processing begins.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, warn};

use crate::checker;
use crate::constraint::{self, ConstraintTable};
use crate::error::{Error, Result};
use crate::lockfile::{self, maybe_relative_to_cwd};
use crate::model::{Hit, Inventory, InventoryRow, NearMiss, ScanSummary};
use crate::output;

/// Alias priorities for files fed to compare / near-miss, which historically
/// carry looser headers than the scan-mode authoritative CSV.
const COMPARE_NAME_ALIASES: &[&str] = &["Package", "package", "PackageName", "packageName"];
const NEAR_MISS_NAME_ALIASES: &[&str] = &["Package", "package", "packageName"];
const NEAR_MISS_CONSTRAINT_ALIASES: &[&str] = &[
    "Version",
    "vulnerableConstraint",
    "constraint",
    "range",
    "version",
];
const INVENTORY_NAME_ALIASES: &[&str] = &["packageName", "Package", "package"];
const INVENTORY_VERSION_ALIASES: &[&str] = &["version", "Version", "resolvedVersion"];
const INVENTORY_PATH_ALIASES: &[&str] = &["lockfilePath", "lockfile"];

#[derive(Debug)]
pub struct ScanOutcome {
    pub summary: ScanSummary,
    pub hits: Vec<Hit>,
}

#[derive(Debug)]
pub struct CompareOutcome {
    pub intersection: Vec<String>,
}

/// Scan every lockfile under `target` against the authoritative CSV and write
/// `report.json` plus `report.csv` to `out_dir`.
///
/// Constraint validity is checked once up front across the whole table and
/// surfaced as warnings, independent of whether any lockfile references the
/// offending package. Duplicate hit tuples are preserved.
pub fn run_scan(
    target: &Path,
    csv_path: &Path,
    out_dir: &Path,
    ignore: &[String],
) -> Result<ScanOutcome> {
    check_target(target)?;
    check_csv(csv_path)?;

    let rows = constraint::read_rows(csv_path)?;
    let invalid = constraint::validate_rows(&rows);
    for ic in &invalid {
        let name = if ic.name.is_empty() { "<unknown>" } else { &ic.name };
        warn!(package = name, constraint = %ic.raw_constraint, "unparsable constraint in authoritative CSV");
    }
    let table = ConstraintTable::from_rows(&rows);

    let lock_paths = lockfile::discover_lockfiles(target, ignore);
    let mut hits = Vec::new();
    for path in &lock_paths {
        let Some(packages) = load_packages(path) else {
            continue;
        };
        let display_path = maybe_relative_to_cwd(path);
        for (name, versions) in &packages {
            let constraints = table.get(name);
            if constraints.is_empty() {
                continue;
            }
            for version in versions {
                for c in constraints {
                    if checker::satisfies(version, &c.range) {
                        hits.push(Hit {
                            lockfile_path: display_path.clone(),
                            package_name: name.clone(),
                            resolved_version: version.clone(),
                            vulnerable_constraint: c.range.clone(),
                            notes: c.notes.clone(),
                        });
                    }
                }
            }
        }
    }

    let summary = ScanSummary {
        scanned_at: Utc::now(),
        target: target.display().to_string(),
        csv: csv_path.display().to_string(),
        total_lockfiles: lock_paths.len(),
        hits_count: hits.len(),
        unparsable_constraints: invalid,
    };
    output::write_scan_report(out_dir, &summary, &hits)?;
    Ok(ScanOutcome { summary, hits })
}

/// Pure census of every (package, version, lockfile) occurrence under
/// `target`; no constraint matching. Writes `inventory.csv` and
/// `unique-packages.txt` to `out_dir`.
pub fn run_inventory(target: &Path, out_dir: &Path, ignore: &[String]) -> Result<Inventory> {
    check_target(target)?;

    let mut inventory = Inventory::default();
    for path in lockfile::discover_lockfiles(target, ignore) {
        let Some(packages) = load_packages(&path) else {
            continue;
        };
        let display_path = maybe_relative_to_cwd(&path);
        for (name, versions) in &packages {
            for version in versions {
                inventory.push(InventoryRow {
                    package_name: name.clone(),
                    version: version.clone(),
                    lockfile_path: display_path.clone(),
                });
            }
        }
    }
    output::write_inventory(out_dir, &inventory)?;
    Ok(inventory)
}

/// Intersect the authoritative package names with a previously written
/// unique-package list. Requires `unique-packages.txt` in `out_dir` from a
/// prior inventory run - a hard precondition, not a data error.
pub fn run_compare(csv_path: &Path, out_dir: &Path) -> Result<CompareOutcome> {
    check_csv(csv_path)?;
    let unique_path = out_dir.join(output::UNIQUE_PACKAGES_FILE);
    if !unique_path.exists() {
        return Err(Error::UniqueListNotFound(unique_path));
    }

    let auth_names: Vec<String> = constraint::read_rows(csv_path)?
        .iter()
        .map(|row| row.first_of_or_position(COMPARE_NAME_ALIASES, 0).to_string())
        .filter(|name| !name.is_empty())
        .collect();

    let contents = fs::read_to_string(&unique_path).map_err(|e| Error::ReadFile {
        path: unique_path,
        source: e,
    })?;
    let unique: HashSet<String> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let intersection = intersect(&auth_names, &unique);
    output::write_compare(out_dir, &intersection)?;
    Ok(CompareOutcome { intersection })
}

/// CSV order and duplicates of the authoritative list are preserved; the
/// intersection is purely name-based and never considers versions.
pub fn intersect(auth_names: &[String], unique: &HashSet<String>) -> Vec<String> {
    auth_names
        .iter()
        .filter(|name| unique.contains(*name))
        .cloned()
        .collect()
}

/// Flag inventory rows whose package carries a required constraint that the
/// resolved version does not satisfy. Rows for packages absent from the
/// authoritative table, or with an empty constraint, carry no upgrade signal
/// and are skipped. Writes `near-miss.csv` to `out_dir`.
pub fn run_near_miss(
    auth_csv: &Path,
    inventory_csv: &Path,
    out_dir: &Path,
) -> Result<Vec<NearMiss>> {
    check_csv(auth_csv)?;
    if !inventory_csv.exists() {
        return Err(Error::InventoryNotFound(inventory_csv.to_path_buf()));
    }

    // Single constraint per package, later rows overwriting earlier ones.
    let mut required: HashMap<String, String> = HashMap::new();
    for row in &constraint::read_rows(auth_csv)? {
        let name = row.first_of_or_position(NEAR_MISS_NAME_ALIASES, 0);
        if name.is_empty() {
            continue;
        }
        let c = constraint::normalize_constraint(row.first_of(NEAR_MISS_CONSTRAINT_ALIASES));
        required.insert(name.to_string(), c);
    }

    let mut misses = Vec::new();
    for row in &constraint::read_rows(inventory_csv)? {
        let name = row.first_of_or_position(INVENTORY_NAME_ALIASES, 0);
        let version = row.first_of_or_position(INVENTORY_VERSION_ALIASES, 1);
        let lockfile_path = row.first_of_or_position(INVENTORY_PATH_ALIASES, 2);
        let Some(required_constraint) = required.get(name) else {
            continue;
        };
        if required_constraint.is_empty() {
            continue;
        }
        if !checker::satisfies(version, required_constraint) {
            misses.push(NearMiss {
                package_name: name.to_string(),
                required_constraint: required_constraint.clone(),
                resolved_version: version.to_string(),
                lockfile_path: lockfile_path.to_string(),
            });
        }
    }

    output::write_near_miss(out_dir, &misses)?;
    Ok(misses)
}

/// Read, parse, and extract one lockfile; `None` skips the file. Malformed
/// JSON is excluded from everything except the total-scanned denominator.
fn load_packages(path: &Path) -> Option<lockfile::PackageVersions> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable lockfile");
            return None;
        }
    };
    match lockfile::parse_document(&contents) {
        Ok(doc) => Some(lockfile::extract_packages(&doc)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping malformed lockfile");
            None
        }
    }
}

fn check_target(target: &Path) -> Result<()> {
    if !target.exists() {
        return Err(Error::TargetNotFound(target.to_path_buf()));
    }
    Ok(())
}

fn check_csv(csv_path: &Path) -> Result<()> {
    if !csv_path.exists() {
        return Err(Error::CsvNotFound(csv_path.to_path_buf()));
    }
    Ok(())
}
