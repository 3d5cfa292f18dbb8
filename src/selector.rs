//! Tag selection: exact or prefix-wildcard matching, semver ordering and `keep` trimming.

use std::cmp::Ordering;

use semver::Version;
use tracing::debug;

const WILDCARD: char = '*';

/// Policy for prefix matches whose suffix does not parse as a version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unversioned {
    /// Delete them unconditionally; `keep` never protects them
    Include,
    /// Leave them out of the deletion set
    Skip,
}

/// A parsed tag suffix: a semantic version plus any numeric segments past the patch level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionKey {
    pub version: Version,
    /// Segments after `major.minor.patch`, trailing zeros trimmed so `1.2.3.0` equals `1.2.3`.
    pub extra: Vec<u64>,
}

impl VersionKey {
    /// Semver precedence extended with the extra segments; build metadata does not participate.
    pub fn precedence(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.version, &other.version);
        (a.major, a.minor, a.patch, &self.extra, &a.pre).cmp(&(
            b.major,
            b.minor,
            b.patch,
            &other.extra,
            &b.pre,
        ))
    }
}

/// Compute the ordered list of tags to delete.
///
/// An exact pattern yields `[pattern]` when present and ignores `keep`. A pattern ending in `*`
/// selects every tag starting with the prefix: unversioned suffixes come first in scan order
/// (or are dropped under [`Unversioned::Skip`]), followed by versioned tags sorted oldest first
/// with the newest `keep` removed. An empty pattern selects nothing.
pub fn select(
    tags: &[String],
    pattern: &str,
    keep: usize,
    unversioned: Unversioned,
) -> Vec<String> {
    let Some(prefix) = pattern.strip_suffix(WILDCARD) else {
        return if !pattern.is_empty() && tags.iter().any(|t| t == pattern) {
            vec![pattern.to_string()]
        } else {
            Vec::new()
        };
    };

    let mut passthrough = Vec::new();
    let mut versioned: Vec<(VersionKey, &String)> = Vec::new();

    for tag in tags {
        let Some(suffix) = tag.strip_prefix(prefix) else {
            continue;
        };
        match parse_version(suffix) {
            Some(v) => versioned.push((v, tag)),
            None => {
                debug!("{} {} : suffix {:?} is not a version", pattern, tag, suffix);
                if unversioned == Unversioned::Include {
                    passthrough.push(tag.clone());
                }
            }
        }
    }

    // Stable, so equal versions keep encounter order.
    versioned.sort_by(|(a, _), (b, _)| a.precedence(b));

    let retained = versioned.len() - keep.min(versioned.len());
    passthrough.extend(versioned.into_iter().take(retained).map(|(_, t)| t.clone()));
    passthrough
}

/// Parse a tag suffix as a version.
///
/// Accepts strict semver, a `v` prefix, a short `1` / `1.2` core, zero-padded segments
/// (`2024.01.05`) and cores longer than three segments (`1.2.3.4`).
pub fn parse_version(s: &str) -> Option<VersionKey> {
    let s = s.strip_prefix(|c: char| c == 'v' || c == 'V').unwrap_or(s);
    if let Ok(version) = Version::parse(s) {
        return Some(VersionKey {
            version,
            extra: Vec::new(),
        });
    }

    let split = s.find(|c: char| c == '-' || c == '+').unwrap_or(s.len());
    let (core, rest) = s.split_at(split);
    let mut segments = core
        .split('.')
        .map(|p| {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            p.parse::<u64>().ok()
        })
        .collect::<Option<Vec<u64>>>()?;

    segments.resize(segments.len().max(3), 0);
    let mut extra = segments.split_off(3);
    while extra.last() == Some(&0) {
        extra.pop();
    }

    let normalized = format!("{}.{}.{}{}", segments[0], segments[1], segments[2], rest);
    let version = Version::parse(&normalized).ok()?;
    Some(VersionKey { version, extra })
}
