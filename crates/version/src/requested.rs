//! Classification of a raw version request.
//!
//! A request read from a pinned file, an environment variable or the command
//! line is one of three things: an exact version, a selection keyword, or a
//! constraint expression.

use crate::constraint::ConstraintSet;
use crate::error::{Result, VersionError};
use crate::version::Version;
use std::fmt;
use std::str::FromStr;

/// Selection keywords understood in place of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// The most recent release, pre-releases included.
    Latest,
    /// The most recent release without a pre-release suffix.
    LatestStable,
    /// The most recent stable release satisfying the project constraints.
    LatestAllowed,
    /// The oldest stable release satisfying the project constraints.
    MinRequired,
}

impl Keyword {
    /// Every keyword with its spelling.
    pub const ALL: &'static [(&'static str, Self)] = &[
        ("latest", Self::Latest),
        ("latest-stable", Self::LatestStable),
        ("latest-allowed", Self::LatestAllowed),
        ("min-required", Self::MinRequired),
    ];

    /// The keyword as written in files and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        Self::ALL
            .iter()
            .find_map(|(name, keyword)| (*keyword == self).then_some(*name))
            .unwrap_or("latest")
    }

    /// Whether resolving this keyword needs the project constraints.
    #[must_use]
    pub const fn uses_project_constraints(self) -> bool {
        matches!(self, Self::LatestAllowed | Self::MinRequired)
    }
}

impl FromStr for Keyword {
    type Err = VersionError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        Self::ALL
            .iter()
            .find_map(|(name, keyword)| (*name == trimmed).then_some(*keyword))
            .ok_or_else(|| VersionError::UnrecognisedRequest {
                value: value.to_owned(),
            })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed version request.
///
/// # Examples
///
/// ```
/// use tvm_version::{Keyword, RequestedVersion};
///
/// let request: RequestedVersion = "latest-stable".parse().expect("valid request");
/// assert_eq!(request, RequestedVersion::Keyword(Keyword::LatestStable));
///
/// let request: RequestedVersion = "~> 1.6".parse().expect("valid request");
/// assert!(matches!(request, RequestedVersion::Constraint(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedVersion {
    /// One specific version.
    Exact(Version),
    /// A selection keyword.
    Keyword(Keyword),
    /// A constraint expression to evaluate against available versions.
    Constraint(ConstraintSet),
}

impl FromStr for RequestedVersion {
    type Err = VersionError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if let Ok(keyword) = trimmed.parse::<Keyword>() {
            return Ok(Self::Keyword(keyword));
        }
        if let Ok(version) = trimmed.parse::<Version>() {
            return Ok(Self::Exact(version));
        }
        trimmed
            .parse::<ConstraintSet>()
            .map(Self::Constraint)
            .map_err(|_| VersionError::UnrecognisedRequest {
                value: value.to_owned(),
            })
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(version) => write!(f, "{version}"),
            Self::Keyword(keyword) => write!(f, "{keyword}"),
            Self::Constraint(set) => write!(f, "{set}"),
        }
    }
}
