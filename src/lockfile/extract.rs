//! Schema-dispatching package extraction.
//!
//! A lockfile may pin the same package at multiple versions across nested
//! dependency scopes; versions accumulate into a set per name regardless of
//! where in the document they appear.

use std::collections::{BTreeMap, BTreeSet};

use super::{DependencyEntry, LockfileDoc, PackageEntry};

/// `name -> distinct resolved versions` for one lockfile document.
pub type PackageVersions = BTreeMap<String, BTreeSet<String>>;

/// Extract the package map, dispatching on the document's declared schema
/// version (missing counts as 1). Pure transform.
pub fn extract_packages(doc: &LockfileDoc) -> PackageVersions {
    if doc.lockfile_version.unwrap_or(1) >= 2 {
        extract_v2(doc)
    } else {
        extract_v1(doc)
    }
}

/// Schema >= 2: one flat map keyed by install path. The empty key is the root
/// entry and is attributed to its own declared name; `node_modules/` keys have
/// that single prefix stripped; anything else falls back to the entry's own
/// name field. Entries without a version are skipped - a package can appear
/// unpinned, e.g. a workspace link.
fn extract_v2(doc: &LockfileDoc) -> PackageVersions {
    let mut out = PackageVersions::new();
    let Some(packages) = &doc.packages else {
        return out;
    };

    for (key, entry) in packages {
        let name = resolve_v2_name(key, entry);
        let (Some(name), Some(version)) = (name, entry.version.as_deref()) else {
            continue;
        };
        out.entry(name).or_default().insert(version.to_string());
    }
    out
}

fn resolve_v2_name(key: &str, entry: &PackageEntry) -> Option<String> {
    if key.is_empty() {
        entry.name.clone()
    } else if let Some(stripped) = key.strip_prefix("node_modules/") {
        Some(stripped.to_string())
    } else {
        entry.name.clone()
    }
}

/// Schema 1: recursive dependency tree. Every node at every depth with a
/// version contributes; duplicates across depths deduplicate by set
/// semantics.
fn extract_v1(doc: &LockfileDoc) -> PackageVersions {
    let mut out = PackageVersions::new();
    if let Some(deps) = &doc.dependencies {
        walk_deps(deps, &mut out);
    }
    out
}

fn walk_deps(deps: &BTreeMap<String, DependencyEntry>, out: &mut PackageVersions) {
    for (name, entry) in deps {
        if let Some(version) = &entry.version {
            out.entry(name.clone()).or_default().insert(version.clone());
        }
        if let Some(nested) = &entry.dependencies {
            walk_deps(nested, out);
        }
    }
}
