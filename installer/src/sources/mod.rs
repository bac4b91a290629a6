//! Version sources: independent probes that each may yield a requirement.
//!
//! - [`env`] - the version override environment variable
//! - [`pinned`] - the single-line pinned-version file
//! - [`switch`] - the tool-switch TOML file
//! - [`project`] - `required_version` constraints declared in project files
//!
//! A source that finds nothing returns `Ok(None)`; absent files are never
//! errors. The resolver decides what a found requirement means.

pub mod env;
pub mod pinned;
pub mod project;
pub mod switch;

pub use env::EnvOverride;
pub use pinned::PinnedFile;
pub use project::ProjectConstraints;
pub use switch::SwitchFile;

use crate::config::Config;
use camino::Utf8PathBuf;
use std::fmt;
use tvm_version::RequestedVersion;

/// Where a requirement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The version override environment variable.
    Environment,
    /// A pinned-version file.
    PinnedFile,
    /// A tool-switch TOML file.
    SwitchFile,
    /// Constraints declared in project files.
    Project,
    /// The configured fallback keyword.
    Fallback,
    /// An explicit request from the caller.
    Explicit,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Environment => "environment",
            Self::PinnedFile => "pinned-version file",
            Self::SwitchFile => "switch file",
            Self::Project => "project files",
            Self::Fallback => "default",
            Self::Explicit => "request",
        };
        f.write_str(label)
    }
}

/// A raw requirement and its origin. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequirement {
    origin: SourceKind,
    raw: String,
    location: Option<Utf8PathBuf>,
}

impl VersionRequirement {
    /// A requirement read from `origin`.
    #[must_use]
    pub fn new(origin: SourceKind, raw: impl Into<String>) -> Self {
        Self {
            origin,
            raw: raw.into(),
            location: None,
        }
    }

    /// Record the file the requirement was read from.
    #[must_use]
    pub fn at(self, location: impl Into<Utf8PathBuf>) -> Self {
        Self {
            location: Some(location.into()),
            ..self
        }
    }

    /// The origin.
    #[must_use]
    pub const fn origin(&self) -> SourceKind {
        self.origin
    }

    /// The requirement text, trimmed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The file the requirement was read from, if any.
    #[must_use]
    pub fn location(&self) -> Option<&Utf8PathBuf> {
        self.location.as_ref()
    }

    /// Classify the requirement.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Parse`] when the text is not a version,
    /// keyword, or constraint.
    pub fn parse(&self) -> Result<RequestedVersion> {
        self.raw.parse().map_err(|err| SourceError::Parse {
            origin: self.describe(),
            reason: format!("{err}"),
        })
    }

    fn describe(&self) -> String {
        self.location
            .as_ref()
            .map_or_else(|| self.origin.to_string(), ToString::to_string)
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" from {}", self.raw, self.describe())
    }
}

/// Errors raised by version sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// An existing file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// The file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An explicitly targeted file or variable holds an invalid value.
    #[error("invalid version requirement in {origin}: {reason}")]
    Parse {
        /// The file path or source name.
        origin: String,
        /// Description of the problem.
        reason: String,
    },
}

/// Result type alias using [`SourceError`].
pub type Result<T> = std::result::Result<T, SourceError>;

/// A single origin of version requirements.
pub trait VersionSource {
    /// The origin this source reads.
    fn kind(&self) -> SourceKind;

    /// Look for a requirement.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when an explicitly targeted input exists but
    /// cannot be read or parsed.
    fn probe(&self, config: &Config) -> Result<Option<VersionRequirement>>;
}

/// The sources in priority order: environment, pinned file, switch file,
/// project constraints.
#[must_use]
pub fn standard_sources() -> Vec<Box<dyn VersionSource>> {
    vec![
        Box::new(EnvOverride::from_process()),
        Box::new(PinnedFile),
        Box::new(SwitchFile),
        Box::new(ProjectConstraints),
    ]
}

/// Read `path` if it exists; a missing file is `Ok(None)`.
pub(crate) fn read_optional(path: &camino::Utf8Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::trace!("{path} not found");
            Ok(None)
        }
        Err(source) => Err(SourceError::Read {
            path: path.to_owned(),
            source,
        }),
    }
}
