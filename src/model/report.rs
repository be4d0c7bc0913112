use chrono::{DateTime, Utc};
use serde::Serialize;

/// A resolved version that satisfies a stored vulnerable constraint.
///
/// `resolved_version` is the raw string from the lockfile, not the normalized
/// form used for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub lockfile_path: String,
    pub package_name: String,
    pub resolved_version: String,
    pub vulnerable_constraint: String,
    pub notes: String,
}

/// A resolved version that fails a required constraint - upgrade-planning
/// signal, as opposed to a confirmed vulnerable hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearMiss {
    pub package_name: String,
    pub required_constraint: String,
    pub resolved_version: String,
    pub lockfile_path: String,
}

/// An authoritative row whose constraint the range grammar rejects. Surfaced
/// as a warning; the row's package stays in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidConstraint {
    pub name: String,
    pub raw_constraint: String,
}

/// Summary record written alongside the hit list after a scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub scanned_at: DateTime<Utc>,
    pub target: String,
    pub csv: String,
    pub total_lockfiles: usize,
    pub hits_count: usize,
    pub unparsable_constraints: Vec<InvalidConstraint>,
}
