//! Operating system and architecture naming for release assets.
//!
//! Release assets use Go-style platform names (`linux`, `darwin`, `amd64`,
//! `arm64`), not Rust target names, so the host values are translated here.
//! Only the combinations published by upstream release pipelines are
//! accepted.

use crate::error::{InstallerError, Result};
use std::fmt;

const SUPPORTED_OS: &[&str] = &["darwin", "freebsd", "linux", "openbsd", "solaris", "windows"];
const SUPPORTED_ARCH: &[&str] = &["386", "amd64", "arm", "arm64"];

/// A validated operating system and architecture pair.
///
/// # Examples
///
/// ```
/// use tvm_installer::platform::Platform;
///
/// let platform = Platform::new("linux", "arm64").expect("supported platform");
/// assert_eq!(platform.to_string(), "linux_arm64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Validate an explicit pair.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] when either half is not a
    /// published platform name.
    pub fn new(os: &str, arch: &str) -> Result<Self> {
        if !SUPPORTED_OS.contains(&os) {
            return Err(InstallerError::Config {
                reason: format!(
                    "unsupported operating system \"{os}\"; expected one of: {}",
                    SUPPORTED_OS.join(", ")
                ),
            });
        }
        if !SUPPORTED_ARCH.contains(&arch) {
            return Err(InstallerError::Config {
                reason: format!(
                    "unsupported architecture \"{arch}\"; expected one of: {}",
                    SUPPORTED_ARCH.join(", ")
                ),
            });
        }
        Ok(Self {
            os: os.to_owned(),
            arch: arch.to_owned(),
        })
    }

    /// The platform tvm is running on, with an optional architecture override.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] when the host or the override has
    /// no published release name.
    pub fn host(arch_override: Option<&str>) -> Result<Self> {
        let os = os_name(std::env::consts::OS);
        let arch = arch_override.unwrap_or_else(|| arch_name(std::env::consts::ARCH));
        Self::new(os, arch)
    }

    /// The operating system name, e.g. `darwin`.
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// The architecture name, e.g. `amd64`.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Whether binaries on this platform carry an `.exe` suffix.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// The executable file name for `tool` on this platform.
    #[must_use]
    pub fn binary_name(&self, tool: &str) -> String {
        if self.is_windows() {
            format!("{tool}.exe")
        } else {
            tool.to_owned()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

fn os_name(rust_os: &str) -> &str {
    match rust_os {
        "macos" => "darwin",
        other => other,
    }
}

fn arch_name(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}
