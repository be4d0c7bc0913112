//! Companion npm-audit sweep.
//!
//! Walks the target for project roots (directories directly containing a
//! `package.json`), best-effort updates each git checkout, runs
//! `npm audit --json`, and tabulates severity counts into
//! `audit-results.csv`. Every per-project failure is recorded as a row, never
//! fatal; the repository update is bounded by a fixed timeout and abandoned
//! silently on expiry.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::Result;

pub const RESULTS_FILE: &str = "audit-results.csv";

const GIT_UPDATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Directories never descended into while looking for projects.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub total: u64,
    pub low: u64,
    pub moderate: u64,
    pub high: u64,
    pub critical: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Counts(SeverityCounts),
    /// npm audit could not be run or produced no output.
    RunError,
    /// npm audit ran but its output was not valid JSON.
    ParseError,
}

#[derive(Debug)]
pub struct AuditRow {
    pub repo: String,
    pub branch: String,
    pub outcome: AuditOutcome,
    pub path: PathBuf,
}

/// Audit every project under `root` and write the results CSV next to it.
pub async fn run_audits(root: &Path) -> Result<Vec<AuditRow>> {
    println!("Scanning for projects with package.json...");
    let projects = find_projects(root);
    println!("Found {} project(s).", projects.len());

    let mut rows = Vec::new();
    for dir in projects {
        let repo = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        update_repo(&dir).await;
        let branch = current_branch(&dir).await;

        print!("Running npm audit in {} ... ", dir.display());
        let outcome = audit_project(&dir).await;
        match &outcome {
            AuditOutcome::Counts(c) => println!("OK (total={})", c.total),
            AuditOutcome::RunError => println!("ERROR"),
            AuditOutcome::ParseError => println!("PARSE_ERROR"),
        }
        // A project that fails to audit gets no branch attribution.
        let branch = if outcome == AuditOutcome::RunError {
            String::new()
        } else {
            branch
        };
        rows.push(AuditRow {
            repo,
            branch,
            outcome,
            path: dir,
        });
    }

    let out_path = root.join(RESULTS_FILE);
    write_results(&out_path, &rows)?;
    println!();
    println!("Wrote CSV to {}", out_path.display());
    Ok(rows)
}

/// Directories directly containing a `package.json`; a found project is not
/// descended into further. Unreadable directories are ignored.
pub fn find_projects(root: &Path) -> Vec<PathBuf> {
    let mut projects = Vec::new();
    walk(root, &mut projects);
    projects
}

fn walk(dir: &Path, projects: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let entries: Vec<_> = entries.flatten().collect();

    if entries.iter().any(|e| e.file_name() == "package.json") {
        projects.push(dir.to_path_buf());
        return;
    }
    for entry in entries {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if SKIPPED_DIRS.iter().any(|s| name == *s) {
            continue;
        }
        walk(&entry.path(), projects);
    }
}

/// Fetch and fast-forward where possible; any failure (dirty worktree,
/// non-repository directory, network) leaves the checkout as-is.
async fn update_repo(dir: &Path) {
    let update = async {
        let fetched = Command::new("git")
            .args(["fetch", "--all"])
            .current_dir(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;
        if !matches!(fetched, Ok(s) if s.success()) {
            return;
        }
        let _ = Command::new("git")
            .args(["pull", "--ff-only"])
            .current_dir(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;
    };
    if timeout(GIT_UPDATE_TIMEOUT, update).await.is_err() {
        debug!(path = %dir.display(), "git update timed out; continuing with current state");
    }
}

async fn current_branch(dir: &Path) -> String {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(dir)
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;
    match output {
        Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).trim().to_string(),
        _ => String::new(),
    }
}

async fn audit_project(dir: &Path) -> AuditOutcome {
    let npm = if cfg!(target_os = "windows") { "npm.cmd" } else { "npm" };
    let output = Command::new(npm)
        .args(["audit", "--json"])
        .current_dir(dir)
        .kill_on_drop(true)
        .output()
        .await;

    let stdout = match output {
        // npm audit exits nonzero when vulnerabilities are found; stdout may
        // still contain valid JSON.
        Ok(o) if !o.stdout.is_empty() => o.stdout,
        _ => return AuditOutcome::RunError,
    };
    match serde_json::from_slice::<Value>(&stdout) {
        Ok(json) => AuditOutcome::Counts(extract_counts(&json)),
        Err(_) => AuditOutcome::ParseError,
    }
}

/// Pull severity counts out of either npm audit output shape: newer formats
/// carry `metadata.vulnerabilities`, older ones a top-level `vulnerabilities`
/// object keyed by package with a `severity` field each.
pub fn extract_counts(json: &Value) -> SeverityCounts {
    if let Some(v) = json
        .get("metadata")
        .and_then(|m| m.get("vulnerabilities"))
        .and_then(Value::as_object)
    {
        let count = |key: &str| v.get(key).and_then(Value::as_u64).unwrap_or(0);
        let summed: u64 = v.values().filter_map(Value::as_u64).sum();
        // A zero total is as good as a missing one; the summed counts win.
        let total = json
            .get("metadata")
            .and_then(|m| m.get("total"))
            .and_then(Value::as_u64)
            .filter(|&t| t != 0)
            .unwrap_or(summed);
        return SeverityCounts {
            total,
            low: count("low"),
            moderate: count("moderate"),
            high: count("high"),
            critical: count("critical"),
        };
    }

    if let Some(v) = json.get("vulnerabilities").and_then(Value::as_object) {
        let by_severity = |sev: &str| {
            v.values()
                .filter(|entry| entry.get("severity").and_then(Value::as_str) == Some(sev))
                .count() as u64
        };
        let (low, moderate, high, critical) = (
            by_severity("low"),
            by_severity("moderate"),
            by_severity("high"),
            by_severity("critical"),
        );
        return SeverityCounts {
            total: low + moderate + high + critical,
            low,
            moderate,
            high,
            critical,
        };
    }

    SeverityCounts::default()
}

fn write_results(out_path: &Path, rows: &[AuditRow]) -> Result<()> {
    let mut lines = vec!["repo,branch,total,low,moderate,high,critical".to_string()];
    for r in rows {
        let line = match &r.outcome {
            AuditOutcome::Counts(c) => format!(
                "{},{},{},{},{},{},{}",
                r.repo, r.branch, c.total, c.low, c.moderate, c.high, c.critical
            ),
            AuditOutcome::RunError => {
                format!("{},{},ERROR,ERROR,ERROR,ERROR,ERROR", r.repo, r.branch)
            }
            AuditOutcome::ParseError => format!(
                "{},{},PARSE_ERROR,PARSE_ERROR,PARSE_ERROR,PARSE_ERROR,PARSE_ERROR",
                r.repo, r.branch
            ),
        };
        lines.push(line);
    }
    std::fs::write(out_path, lines.join("\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_counts_from_metadata() {
        let json = json!({
            "metadata": {
                "total": 7,
                "vulnerabilities": { "info": 1, "low": 2, "moderate": 1, "high": 2, "critical": 1 }
            }
        });
        let counts = extract_counts(&json);
        assert_eq!(counts.total, 7);
        assert_eq!(counts.low, 2);
        assert_eq!(counts.critical, 1);
    }

    #[test]
    fn test_extract_counts_sums_when_total_missing() {
        let json = json!({
            "metadata": {
                "vulnerabilities": { "low": 2, "high": 1 }
            }
        });
        assert_eq!(extract_counts(&json).total, 3);
    }

    #[test]
    fn test_extract_counts_sums_when_total_is_zero() {
        let json = json!({
            "metadata": {
                "total": 0,
                "vulnerabilities": { "low": 2, "high": 1 }
            }
        });
        assert_eq!(extract_counts(&json).total, 3);
    }

    #[test]
    fn test_extract_counts_from_top_level_vulnerabilities() {
        let json = json!({
            "vulnerabilities": {
                "lodash": { "severity": "high" },
                "minimist": { "severity": "low" },
                "qs": { "severity": "high" }
            }
        });
        let counts = extract_counts(&json);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.total, 3);
    }

    #[test]
    fn test_extract_counts_defaults_to_zero() {
        assert_eq!(extract_counts(&json!({})), SeverityCounts::default());
    }

    #[test]
    fn test_find_projects_stops_at_project_roots() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("app");
        std::fs::create_dir_all(app.join("nested")).unwrap();
        std::fs::write(app.join("package.json"), "{}").unwrap();
        std::fs::write(app.join("nested/package.json"), "{}").unwrap();

        let other = tmp.path().join("tools/cli");
        std::fs::create_dir_all(&other).unwrap();
        std::fs::write(other.join("package.json"), "{}").unwrap();

        let cache = tmp.path().join("node_modules/dep");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("package.json"), "{}").unwrap();

        let mut found = find_projects(tmp.path());
        found.sort();
        assert_eq!(found, vec![app.clone(), other.clone()]);
    }
}
