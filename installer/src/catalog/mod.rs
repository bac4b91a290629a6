//! Published releases of the managed tool.
//!
//! - [`github`] - the GitHub releases API implementation
//! - [`naming`] - asset and checksum manifest file names
//!
//! The [`ReleaseCatalog`] trait is the seam between resolution and the
//! network. Entries keep their raw tag; callers normalise it with
//! [`ReleaseEntry::version`] only when comparing.

pub mod github;
pub mod naming;

pub use github::GithubCatalog;
pub use naming::AssetName;

use crate::download::DownloadError;
use serde::Deserialize;
use tvm_version::{Version, VersionError, strip_tag_prefix};

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// File name.
    pub name: String,
    /// Download URL.
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

/// One published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    /// The tag exactly as published.
    pub tag: String,
    /// Files attached to the release.
    pub assets: Vec<Asset>,
}

impl ReleaseEntry {
    /// Parse the tag as a version after removing `tag_prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] when the tag is not a version.
    pub fn version(&self, tag_prefix: &str) -> std::result::Result<Version, VersionError> {
        parse_tag(&self.tag, tag_prefix)
    }

    /// The asset whose name is exactly `name`.
    #[must_use]
    pub fn find_asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Parse a raw tag as a version after removing `tag_prefix`.
///
/// # Errors
///
/// Returns [`VersionError`] when the remainder is not a version.
pub fn parse_tag(tag: &str, tag_prefix: &str) -> std::result::Result<Version, VersionError> {
    let trimmed = if tag_prefix.is_empty() {
        tag
    } else {
        tag.strip_prefix(tag_prefix).unwrap_or(tag)
    };
    strip_tag_prefix(trimmed).parse()
}

/// Errors arising from catalog queries.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The request could not be completed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The response was not the expected JSON shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode {
        /// The URL whose response failed to decode.
        url: String,
        /// Description of the decode failure.
        reason: String,
    },

    /// The release has no asset with the expected name.
    #[error("release {tag} has no asset named {name}")]
    AssetNotFound {
        /// The expected asset name.
        name: String,
        /// The release tag searched.
        tag: String,
    },
}

/// Result type alias using [`CatalogError`].
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Read access to the published releases of one tool.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseCatalog {
    /// Every published release, across all pages, in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when any page cannot be fetched or decoded.
    fn list_releases(&self) -> Result<Vec<ReleaseEntry>>;

    /// The tag of the release marked latest.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the release cannot be fetched or decoded.
    fn latest_release(&self) -> Result<String>;

    /// The release published under `tag`, with its complete asset list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the release cannot be fetched or decoded.
    fn release(&self, tag: &str) -> Result<ReleaseEntry>;
}

/// Resolve the download URL of the asset named `asset_name` in `tag`.
///
/// # Errors
///
/// Returns [`CatalogError::AssetNotFound`] when no asset has exactly that
/// name, or any error from [`ReleaseCatalog::release`].
pub fn download_asset_url(
    catalog: &dyn ReleaseCatalog,
    tag: &str,
    asset_name: &str,
) -> Result<String> {
    let release = catalog.release(tag)?;
    release
        .find_asset(asset_name)
        .map(|asset| asset.url.clone())
        .ok_or_else(|| CatalogError::AssetNotFound {
            name: asset_name.to_owned(),
            tag: tag.to_owned(),
        })
}
