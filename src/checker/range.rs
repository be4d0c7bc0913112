//! npm-style range grammar over strict versions.
//!
//! Supported forms:
//! - exact versions: `1.2.3`, `=1.2.3`
//! - comparison operators: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - tilde and caret: `~1.2.3`, `^0.2.3`
//! - x-ranges and partials: `1.2.x`, `1.x`, `1.2`, `*`
//! - hyphen ranges: `1.2.3 - 2.3.4`
//! - conjunction by whitespace, disjunction by `||`
//!
//! Exclusive upper bounds derived from tilde, caret, and x-ranges carry a `-0`
//! prerelease so that `1.3.0-alpha` stays outside `~1.2.3` while prerelease
//! versions inside the numeric interval still match. All comparisons use
//! precedence ordering, which ranks prereleases below their release.

use semver::{Prerelease, Version};
use std::cmp::Ordering;

/// A parsed range: a disjunction of clauses, each clause a conjunction of
/// comparators.
#[derive(Debug, Clone)]
pub struct RangeSpec {
    clauses: Vec<Vec<Comparator>>,
}

impl RangeSpec {
    /// Parse a range string. Returns `None` for anything the grammar does not
    /// accept, including empty input. An empty clause inside a disjunction
    /// (`"1.2.3 ||"`) matches everything, as npm treats it.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let clauses = input
            .split("||")
            .map(parse_clause)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { clauses })
    }

    /// True when any clause is fully satisfied by `version`.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.iter().all(|c| c.matches(version)))
    }
}

#[derive(Debug, Clone)]
enum Comparator {
    Exact(Version),
    Gt(Version),
    Gte(Version),
    Lt(Version),
    Lte(Version),
    /// `>= lower, < upper`; the upper bound carries a `-0` prerelease.
    Between { lower: Version, upper: Version },
    /// Inclusive on both ends.
    Hyphen { from: Version, to: Version },
    Any,
}

impl Comparator {
    fn matches(&self, v: &Version) -> bool {
        match self {
            Comparator::Exact(e) => v.cmp_precedence(e) == Ordering::Equal,
            Comparator::Gt(b) => v.cmp_precedence(b) == Ordering::Greater,
            Comparator::Gte(b) => v.cmp_precedence(b) != Ordering::Less,
            Comparator::Lt(b) => v.cmp_precedence(b) == Ordering::Less,
            Comparator::Lte(b) => v.cmp_precedence(b) != Ordering::Greater,
            Comparator::Between { lower, upper } => {
                v.cmp_precedence(lower) != Ordering::Less
                    && v.cmp_precedence(upper) == Ordering::Less
            }
            Comparator::Hyphen { from, to } => {
                v.cmp_precedence(from) != Ordering::Less
                    && v.cmp_precedence(to) != Ordering::Greater
            }
            Comparator::Any => true,
        }
    }
}

/// A version with optional components, as written inside a range token.
#[derive(Debug, Clone)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    /// Lowest strict version the partial denotes, missing components at zero.
    fn floor(&self) -> Version {
        let mut v = Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        );
        v.pre = self.pre.clone();
        v
    }
}

fn parse_clause(clause: &str) -> Option<Vec<Comparator>> {
    let tokens: Vec<&str> = clause.split_whitespace().collect();
    if tokens.is_empty() {
        return Some(vec![Comparator::Any]);
    }

    let mut comparators = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        // Hyphen ranges arrive as three tokens: "1.2.3 - 2.3.4".
        if i + 2 < tokens.len() && tokens[i + 1] == "-" {
            let from = parse_partial(tokens[i])?;
            let to = parse_partial(tokens[i + 2])?;
            comparators.push(hyphen(&from, &to)?);
            i += 3;
            continue;
        }
        // A detached operator binds to the following token: "> 1.2.3".
        let tok = tokens[i];
        if matches!(tok, ">" | ">=" | "<" | "<=" | "=" | "~" | "^") && i + 1 < tokens.len() {
            let glued = format!("{tok}{}", tokens[i + 1]);
            comparators.push(parse_comparator(&glued)?);
            i += 2;
            continue;
        }
        comparators.push(parse_comparator(tok)?);
        i += 1;
    }
    Some(comparators)
}

fn parse_comparator(tok: &str) -> Option<Comparator> {
    if let Some(rest) = tok.strip_prefix(">=") {
        Some(Comparator::Gte(parse_partial(rest)?.floor()))
    } else if let Some(rest) = tok.strip_prefix("<=") {
        Some(Comparator::Lte(parse_partial(rest)?.floor()))
    } else if let Some(rest) = tok.strip_prefix('>') {
        Some(Comparator::Gt(parse_partial(rest)?.floor()))
    } else if let Some(rest) = tok.strip_prefix('<') {
        Some(Comparator::Lt(parse_partial(rest)?.floor()))
    } else if let Some(rest) = tok.strip_prefix('~') {
        tilde(&parse_partial(rest)?)
    } else if let Some(rest) = tok.strip_prefix('^') {
        caret(&parse_partial(rest)?)
    } else if let Some(rest) = tok.strip_prefix('=') {
        x_range(&parse_partial(rest)?)
    } else {
        x_range(&parse_partial(tok)?)
    }
}

fn parse_partial(tok: &str) -> Option<Partial> {
    let tok = tok.strip_prefix(['v', 'V']).unwrap_or(tok);
    // Build metadata never affects matching.
    let tok = tok.split_once('+').map_or(tok, |(core, _)| core);
    let (core, pre) = match tok.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (tok, None),
    };
    if core.is_empty() {
        return None;
    }

    let pieces: Vec<&str> = core.split('.').collect();
    if pieces.len() > 3 {
        return None;
    }
    let mut components: [Option<u64>; 3] = [None, None, None];
    for (i, piece) in pieces.iter().enumerate() {
        if matches!(*piece, "x" | "X" | "*") {
            // A wildcard component truncates everything after it.
            break;
        }
        components[i] = Some(piece.parse::<u64>().ok()?);
    }

    let pre = match pre {
        // Prerelease tags only attach to full versions.
        Some(p) if components[2].is_some() => Prerelease::new(p).ok()?,
        Some(_) => return None,
        None => Prerelease::EMPTY,
    };
    Some(Partial {
        major: components[0],
        minor: components[1],
        patch: components[2],
        pre,
    })
}

/// Version pinned at a release boundary with a `-0` prerelease, ordering
/// below every real prerelease and release of that triple.
fn boundary(major: u64, minor: u64, patch: u64) -> Version {
    let mut v = Version::new(major, minor, patch);
    v.pre = Prerelease::new("0").unwrap_or(Prerelease::EMPTY);
    v
}

/// Tilde widens by the precision written: `~1.2.3` and `~1.2` stay within the
/// minor, `~1` spans the whole major. A component at the numeric ceiling has
/// no next boundary and rejects the range.
fn tilde(p: &Partial) -> Option<Comparator> {
    match (p.major, p.minor) {
        (None, _) => Some(Comparator::Any),
        (Some(major), None) => Some(Comparator::Between {
            lower: p.floor(),
            upper: boundary(major.checked_add(1)?, 0, 0),
        }),
        (Some(major), Some(minor)) => Some(Comparator::Between {
            lower: p.floor(),
            upper: boundary(major, minor.checked_add(1)?, 0),
        }),
    }
}

/// Caret permits changes that leave the leftmost non-zero component intact.
/// Missing components put the lower bound at a `-0` boundary, admitting
/// prereleases of the floor release.
fn caret(p: &Partial) -> Option<Comparator> {
    let Some(major) = p.major else {
        return Some(Comparator::Any);
    };
    let lower = if p.patch.is_some() {
        p.floor()
    } else {
        boundary(major, p.minor.unwrap_or(0), 0)
    };
    let upper = if major > 0 {
        boundary(major.checked_add(1)?, 0, 0)
    } else {
        match (p.minor, p.patch) {
            (None, _) => boundary(1, 0, 0),
            (Some(0), Some(patch)) => boundary(0, 0, patch.checked_add(1)?),
            (Some(minor), _) => boundary(0, minor.checked_add(1)?, 0),
        }
    };
    Some(Comparator::Between { lower, upper })
}

/// A bare token: full versions match exactly, partials act as x-ranges with
/// `-0` bounds on both ends.
fn x_range(p: &Partial) -> Option<Comparator> {
    let Some(major) = p.major else {
        return Some(Comparator::Any);
    };
    match (p.minor, p.patch) {
        (_, Some(_)) => Some(Comparator::Exact(p.floor())),
        (Some(minor), None) => Some(Comparator::Between {
            lower: boundary(major, minor, 0),
            upper: boundary(major, minor.checked_add(1)?, 0),
        }),
        (None, None) => Some(Comparator::Between {
            lower: boundary(major, 0, 0),
            upper: boundary(major.checked_add(1)?, 0, 0),
        }),
    }
}

fn hyphen(from: &Partial, to: &Partial) -> Option<Comparator> {
    let lower = from.floor();
    match (to.major, to.minor, to.patch) {
        (None, _, _) => Some(Comparator::Gte(lower)),
        (Some(_), _, Some(_)) => Some(Comparator::Hyphen {
            from: lower,
            to: to.floor(),
        }),
        // A partial upper end is exclusive at the next boundary.
        (Some(major), None, None) => Some(Comparator::Between {
            lower,
            upper: boundary(major.checked_add(1)?, 0, 0),
        }),
        (Some(major), Some(minor), None) => Some(Comparator::Between {
            lower,
            upper: boundary(major, minor.checked_add(1)?, 0),
        }),
    }
}
