//! Semantic version values and their total order.
//!
//! Versions are accepted in the loose form published release tags use:
//! surrounding whitespace, an optional leading `v`, one to three numeric
//! components (missing ones default to zero), an optional `-pre-release`
//! suffix and optional `+build` metadata. Any other text around the
//! version is rejected. The canonical text form always has three components
//! and never carries the `v`.

use crate::error::{Result, VersionError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed version.
///
/// Ordering and equality ignore build metadata, so `1.0.0+a` and `1.0.0+b`
/// compare equal even though they display differently.
///
/// # Examples
///
/// ```
/// use tvm_version::Version;
///
/// let version: Version = "v1.6".parse().expect("valid version");
/// assert_eq!(version.to_string(), "1.6.0");
/// ```
#[derive(Debug, Clone)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Option<String>,
    build: Option<String>,
}

impl Version {
    /// Construct a release version without suffixes.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// The major component.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.major
    }

    /// The minor component.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.minor
    }

    /// The patch component.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.patch
    }

    /// The pre-release suffix, without its leading `-`.
    #[must_use]
    pub fn pre_release(&self) -> Option<&str> {
        self.pre.as_deref()
    }

    /// The build metadata, without its leading `+`.
    #[must_use]
    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// Whether this version carries a pre-release suffix.
    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// Whether the numeric components of both versions are identical.
    #[must_use]
    pub const fn same_release(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor && self.patch == other.patch
    }
}

/// Parse a version and report how many numeric components were written.
///
/// The pessimistic operator needs the written precision: `~> 1.2` and
/// `~> 1.2.0` describe different ranges.
pub(crate) fn parse_with_precision(value: &str) -> Result<(Version, usize)> {
    let invalid = |reason: &str| VersionError::InvalidVersion {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = value.trim();
    let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if body.is_empty() {
        return Err(invalid("empty version"));
    }

    let (rest, build) = match body.split_once('+') {
        Some((rest, build)) => (rest, Some(validate_suffix(build, "build metadata", value)?)),
        None => (body, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(validate_suffix(pre, "pre-release", value)?)),
        None => (rest, None),
    };

    let numbers = core
        .split('.')
        .map(|segment| parse_segment(segment, value))
        .collect::<Result<Vec<u64>>>()?;
    if numbers.len() > 3 {
        return Err(invalid("more than three numeric components"));
    }

    let mut components = numbers.iter().copied();
    let major = components
        .next()
        .ok_or_else(|| invalid("missing major component"))?;
    let minor = components.next().unwrap_or(0);
    let patch = components.next().unwrap_or(0);

    Ok((
        Version {
            major,
            minor,
            patch,
            pre,
            build,
        },
        numbers.len(),
    ))
}

fn parse_segment(segment: &str, value: &str) -> Result<u64> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(VersionError::InvalidVersion {
            value: value.to_owned(),
            reason: format!("component \"{segment}\" is not numeric"),
        });
    }
    segment.parse().map_err(|_| VersionError::InvalidVersion {
        value: value.to_owned(),
        reason: format!("component \"{segment}\" is out of range"),
    })
}

fn validate_suffix(suffix: &str, what: &str, value: &str) -> Result<String> {
    let well_formed = !suffix.is_empty()
        && suffix
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    if well_formed {
        Ok(suffix.to_owned())
    } else {
        Err(VersionError::InvalidVersion {
            value: value.to_owned(),
            reason: format!("malformed {what} \"{suffix}\""),
        })
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(value: &str) -> Result<Self> {
        parse_with_precision(value).map(|(version, _)| version)
    }
}

impl TryFrom<&str> for Version {
    type Error = VersionError;

    fn try_from(value: &str) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| compare_pre_release(self.pre.as_deref(), other.pre.as_deref()))
    }
}

/// A release sorts after any of its pre-releases.
fn compare_pre_release(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(left), Some(right)) => compare_identifiers(left, right),
    }
}

/// Dot-separated identifiers compare pairwise: numerically when both sides
/// are numbers, lexically otherwise. A shorter list sorts first.
fn compare_identifiers(left: &str, right: &str) -> Ordering {
    let mut left_parts = left.split('.');
    let mut right_parts = right.split('.');
    loop {
        match (left_parts.next(), right_parts.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Compare two version strings.
///
/// Unparsable strings sort before every valid version and equal to each
/// other, so a listing containing junk tags can still be sorted.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use tvm_version::compare;
///
/// assert_eq!(compare("v1.10.0", "1.9.3"), Ordering::Greater);
/// assert_eq!(compare("nightly", "0.0.1"), Ordering::Less);
/// ```
#[must_use]
pub fn compare(left: &str, right: &str) -> Ordering {
    match (left.parse::<Version>(), right.parse::<Version>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Err(_), Ok(_)) => Ordering::Less,
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}

/// Strip the leading `v` a release tag may carry.
#[must_use]
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}
