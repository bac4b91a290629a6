//! Error types for version resolution and installation.
//!
//! Each pipeline stage owns a focused error enum; [`InstallerError`] wraps
//! them so callers can match on the failing stage while still getting a
//! descriptive message from `Display`.

use crate::catalog::CatalogError;
use crate::checksum::ChecksumError;
use crate::download::DownloadError;
use crate::extraction::ExtractionError;
use crate::sources::SourceError;
use camino::Utf8PathBuf;
use thiserror::Error;
use tvm_version::VersionError;

/// Errors that can occur while resolving or installing a version.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// No source produced a requirement and no fallback keyword is configured.
    #[error("no version requirement found; set one in a version file or configure a default")]
    NoVersionFound,

    /// No available version satisfies the effective requirement.
    #[error("no available version satisfies \"{requirement}\"")]
    ConstraintUnsatisfiable {
        /// The requirement that could not be satisfied.
        requirement: String,
    },

    /// A resolved version is not installed and installation is disabled.
    #[error("version {version} is not installed and automatic installation is disabled")]
    NotInstalled {
        /// The resolved version.
        version: String,
    },

    /// A version source could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A version or constraint string is malformed.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The release catalog could not be queried.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The release asset could not be downloaded.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The downloaded asset failed integrity verification.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// The archive could not be extracted safely.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Configuration is missing or malformed.
    #[error("invalid configuration: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },

    /// Writing a pinned-version file failed.
    #[error("failed to write {path}")]
    WriteFailed {
        /// Path that could not be written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation on the install tree failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
