//! Release asset naming.
//!
//! Assets are named `{tool}_{version}_{os}_{arch}{extension}` and the
//! checksum manifest `{tool}_{version}_SHA256SUMS`. Asset names never carry
//! the tag prefix, so the version here is always the normalised form.

use crate::platform::Platform;
use std::fmt;
use tvm_version::Version;

/// Suffix of the checksum manifest asset.
const CHECKSUMS_SUFFIX: &str = "SHA256SUMS";

/// The archive asset name for one version on one platform.
///
/// # Examples
///
/// ```
/// use tvm_installer::catalog::naming::AssetName;
/// use tvm_installer::platform::Platform;
/// use tvm_version::Version;
///
/// let platform = Platform::new("linux", "amd64").expect("supported platform");
/// let name = AssetName::new("tofu", &Version::new(1, 6, 0), &platform, ".zip");
/// assert_eq!(name.archive(), "tofu_1.6.0_linux_amd64.zip");
/// assert_eq!(name.checksums(), "tofu_1.6.0_SHA256SUMS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetName {
    tool: String,
    version: String,
    os: String,
    arch: String,
    extension: String,
}

impl AssetName {
    /// Name the assets of `tool` at `version` for `platform`.
    #[must_use]
    pub fn new(tool: &str, version: &Version, platform: &Platform, extension: &str) -> Self {
        Self {
            tool: tool.to_owned(),
            version: version.to_string(),
            os: platform.os().to_owned(),
            arch: platform.arch().to_owned(),
            extension: extension.to_owned(),
        }
    }

    /// The archive file name.
    #[must_use]
    pub fn archive(&self) -> String {
        format!(
            "{}_{}_{}_{}{}",
            self.tool, self.version, self.os, self.arch, self.extension
        )
    }

    /// The checksum manifest file name for the same release.
    #[must_use]
    pub fn checksums(&self) -> String {
        format!("{}_{}_{CHECKSUMS_SUFFIX}", self.tool, self.version)
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.archive())
    }
}
