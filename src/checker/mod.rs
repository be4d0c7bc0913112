//! Version normalization and range satisfaction.
//!
//! This is the matching core: a resolved version string from a lockfile is
//! normalized, coerced where possible, and tested against a stored constraint.
//! Malformed ranges degrade to literal string equality instead of failing the
//! run; an unparseable constraint in the authoritative CSV is expected input,
//! not an error.

mod range;

pub use range::RangeSpec;

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::constraint::normalize_constraint;

/// First `major[.minor[.patch]]` digit run anywhere in the string, components
/// capped at 16 digits as in npm's coercion.
static COERCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?")
        .unwrap_or_else(|e| panic!("coerce regex: {e}"))
});

/// Strip a single leading `v` from a version string.
pub fn normalize_version(v: &str) -> &str {
    v.strip_prefix('v').unwrap_or(v)
}

/// Best-effort coercion of a loose version string into a strict
/// three-component version: `"1.2"` becomes `1.2.0`, `"v2"` becomes `2.0.0`,
/// `"1.2.3-beta"` loses its prerelease tag. Returns `None` when no numeric
/// component can be found.
pub fn coerce(v: &str) -> Option<Version> {
    let caps = COERCE_RE.captures(v)?;
    let component = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    // A major component that overflows u64 is treated as no match.
    caps.get(1)?.as_str().parse::<u64>().ok()?;
    Some(Version::new(component(1), component(2), component(3)))
}

/// True when the raw constraint, after normalization, is a non-empty range the
/// grammar accepts. An empty-intersection range is still valid; only grammar
/// rejection (or emptiness) makes a constraint invalid.
pub fn is_valid_range(raw: &str) -> bool {
    let c = normalize_constraint(raw);
    !c.is_empty() && RangeSpec::parse(&c).is_some()
}

/// Test a raw resolved version against a stored range.
///
/// Two-tier policy: the primary comparison parses the range and the coerced
/// version; when either side fails to parse, fall back to literal equality
/// between the v-stripped version and the range (also tried with one leading
/// `v` stripped from the range). One bad CSV row must never abort a sweep.
pub fn satisfies(raw_version: &str, range: &str) -> bool {
    let norm = normalize_version(raw_version.trim());
    let candidate = coerce(norm).or_else(|| Version::parse(norm).ok());

    match (RangeSpec::parse(range), candidate) {
        (Some(spec), Some(version)) => spec.satisfies(&version),
        _ => norm == range || norm == range.strip_prefix('v').unwrap_or(range),
    }
}
