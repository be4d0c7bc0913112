//! Lockfile discovery and parsing.
//!
//! Discovery walks a target tree for `package-lock.json` files, skipping
//! dependency caches and build output by convention; extraction converts one
//! parsed document into a `name -> versions` map.

mod extract;

pub use extract::{extract_packages, PackageVersions};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::config::glob_match;
use crate::error::Result;

pub const LOCKFILE_NAME: &str = "package-lock.json";

/// Directory names never descended into during discovery.
const EXCLUDED_DIRS: &[&str] = &["node_modules", "dist"];

/// A parsed `package-lock.json` document. Only the fields the extractor needs
/// are modeled; everything else is ignored.
#[derive(Debug, Deserialize)]
pub struct LockfileDoc {
    #[serde(rename = "lockfileVersion")]
    pub lockfile_version: Option<u64>,
    /// Schema >= 2: flat map keyed by install path.
    pub packages: Option<BTreeMap<String, PackageEntry>>,
    /// Schema 1: nested dependency tree.
    pub dependencies: Option<BTreeMap<String, DependencyEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct PackageEntry {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DependencyEntry {
    pub version: Option<String>,
    pub dependencies: Option<BTreeMap<String, DependencyEntry>>,
}

/// Parse lockfile bytes. Callers treat failure as a per-file skip, never as a
/// fatal error.
pub fn parse_document(contents: &str) -> Result<LockfileDoc> {
    Ok(serde_json::from_str(contents)?)
}

/// Recursively find lockfiles under `target`. `extra_ignores` are simple
/// `*` glob patterns, additive to the built-in exclusions; they are matched
/// against both individual path components and the path relative to `target`.
pub fn discover_lockfiles(target: &Path, extra_ignores: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let walker = WalkDir::new(target)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e.file_name().to_string_lossy().as_ref()));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            // Unreadable directories are skipped, not fatal.
            Err(_) => continue,
        };
        if !entry.file_type().is_file() || entry.file_name() != LOCKFILE_NAME {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(target)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();
        if ignored_by_patterns(&rel, extra_ignores) {
            continue;
        }
        found.push(entry.path().to_path_buf());
    }
    found
}

fn is_excluded(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_DIRS.contains(&name)
}

fn ignored_by_patterns(rel_path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| {
        let p = p.trim();
        if p.is_empty() {
            return false;
        }
        glob_match(p, rel_path)
            || rel_path
                .split(['/', '\\'])
                .any(|component| glob_match(p, component))
    })
}

/// Render a path relative to the current working directory when it does not
/// escape it; reports stay readable without losing absolute paths elsewhere.
pub fn maybe_relative_to_cwd(path: &Path) -> String {
    let rel = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).map(Path::to_path_buf).ok());
    match rel {
        Some(r) if r.as_os_str().is_empty() => ".".to_string(),
        Some(r) => r.display().to_string(),
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_lockfile(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(LOCKFILE_NAME), "{}").unwrap();
    }

    #[test]
    fn test_discovery_skips_caches_and_build_output() {
        let tmp = tempfile::tempdir().unwrap();
        write_lockfile(tmp.path());
        write_lockfile(&tmp.path().join("app"));
        write_lockfile(&tmp.path().join("node_modules/dep"));
        write_lockfile(&tmp.path().join("dist"));
        write_lockfile(&tmp.path().join(".hidden"));

        let found = discover_lockfiles(tmp.path(), &[]);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| {
            let s = p.to_string_lossy().to_string();
            !s.contains("node_modules") && !s.contains("dist") && !s.contains(".hidden")
        }));
    }

    #[test]
    fn test_discovery_applies_extra_ignore_patterns() {
        let tmp = tempfile::tempdir().unwrap();
        write_lockfile(&tmp.path().join("keep"));
        write_lockfile(&tmp.path().join("vendor"));
        write_lockfile(&tmp.path().join("legacy-app"));

        let ignores = vec!["vendor".to_string(), "legacy-*".to_string()];
        let found = discover_lockfiles(tmp.path(), &ignores);
        assert_eq!(found.len(), 1);
        assert!(found[0].to_string_lossy().contains("keep"));
    }

    #[test]
    fn test_parse_document_tolerates_unknown_fields() {
        let doc = parse_document(
            r#"{"lockfileVersion": 3, "name": "root", "extra": true, "packages": {}}"#,
        )
        .unwrap();
        assert_eq!(doc.lockfile_version, Some(3));
        assert!(doc.packages.is_some());
    }

    #[test]
    fn test_parse_document_rejects_malformed_json() {
        assert!(parse_document("{not json").is_err());
    }

    #[test]
    fn test_maybe_relative_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(maybe_relative_to_cwd(&cwd.join("sub/file")), "sub/file");
        assert_eq!(maybe_relative_to_cwd(&cwd), ".");
        assert_eq!(
            maybe_relative_to_cwd(Path::new("/definitely/elsewhere")),
            "/definitely/elsewhere"
        );
    }
}
