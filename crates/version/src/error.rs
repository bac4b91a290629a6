//! Error types for version and constraint parsing.

use thiserror::Error;

/// Errors arising from malformed version strings or constraint expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The value is not a `major[.minor[.patch]][-pre][+build]` version.
    #[error("invalid version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected input.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A constraint clause could not be parsed.
    #[error("invalid constraint \"{value}\": {reason}")]
    InvalidConstraint {
        /// The rejected clause.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A constraint expression contained no clauses.
    #[error("empty constraint expression")]
    EmptyConstraint,

    /// The requested value is neither a version, a keyword, nor a constraint.
    #[error("unrecognised version request \"{value}\"")]
    UnrecognisedRequest {
        /// The rejected input.
        value: String,
    },
}

/// Result type alias using [`VersionError`].
pub type Result<T> = std::result::Result<T, VersionError>;
