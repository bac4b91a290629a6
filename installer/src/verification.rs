//! Verification policy for downloaded release assets.
//!
//! The policy is a value type: it records whether a missing checksum is
//! fatal without performing any I/O itself. A checksum that is present but
//! wrong is always fatal regardless of policy.

use std::fmt;

/// Policy governing how a downloaded asset is verified before extraction.
///
/// # Examples
///
/// ```
/// use tvm_installer::verification::VerificationPolicy;
///
/// let policy = VerificationPolicy::default();
/// assert!(policy.require_checksum());
/// assert!(!VerificationPolicy::optional().require_checksum());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    require_checksum: bool,
}

impl VerificationPolicy {
    /// A policy under which a missing checksum aborts the install.
    #[must_use]
    pub const fn required() -> Self {
        Self {
            require_checksum: true,
        }
    }

    /// A policy under which a missing checksum only produces a warning.
    #[must_use]
    pub const fn optional() -> Self {
        Self {
            require_checksum: false,
        }
    }

    /// Return whether a checksum must be found for the asset.
    #[must_use]
    pub const fn require_checksum(&self) -> bool {
        self.require_checksum
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::required()
    }
}

impl fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.require_checksum {
            write!(f, "checksum verification required")
        } else {
            write!(f, "checksum verification optional")
        }
    }
}
