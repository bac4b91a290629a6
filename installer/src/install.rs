//! Download, verification and extraction of one release.
//!
//! The order is fixed: the install directory is checked first so a repeat
//! install makes no network call; the archive kind is checked before any
//! download; the body is verified before the destination is created; and a
//! destination whose extraction fails is removed so its existence keeps
//! meaning "complete".

use crate::catalog::{AssetName, CatalogError, ReleaseCatalog, ReleaseEntry};
use crate::checksum::{ChecksumError, ChecksumManifest};
use crate::config::Config;
use crate::download::{HttpClient, HttpRequest};
use crate::error::Result;
use crate::extraction::{ArchiveKind, Extractor};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tvm_version::Version;

/// A concrete release ready to be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The normalised version; names the install directory.
    pub version: Version,
    /// The release tag as published.
    pub tag: String,
    /// The archive file name.
    pub asset_name: String,
    /// The archive download URL.
    pub asset_url: String,
    /// The checksum manifest download URL, when the release has one.
    pub checksums_url: Option<String>,
}

impl ResolvedVersion {
    /// Locate the archive for the configured platform, and the checksum
    /// manifest, among the assets of `release`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AssetNotFound`] when the release has no
    /// archive with exactly the expected name.
    pub fn from_release(
        config: &Config,
        version: Version,
        release: &ReleaseEntry,
    ) -> std::result::Result<Self, CatalogError> {
        let names = AssetName::new(
            &config.tool.binary,
            &version,
            &config.platform,
            &config.tool.archive_extension,
        );
        let asset_name = names.archive();
        let asset_url = release
            .find_asset(&asset_name)
            .map(|asset| asset.url.clone())
            .ok_or_else(|| CatalogError::AssetNotFound {
                name: asset_name.clone(),
                tag: release.tag.clone(),
            })?;
        let checksums_url = release
            .find_asset(&names.checksums())
            .map(|asset| asset.url.clone());
        Ok(Self {
            version,
            tag: release.tag.clone(),
            asset_name,
            asset_url,
            checksums_url,
        })
    }
}

/// What [`SecureInstaller::install`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The release was downloaded, verified and extracted.
    Installed(Utf8PathBuf),
    /// The install directory already existed; nothing was fetched.
    AlreadyInstalled(Utf8PathBuf),
}

impl InstallOutcome {
    /// The install directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Installed(path) | Self::AlreadyInstalled(path) => path,
        }
    }
}

/// Installs releases under [`Config::install_dir`].
pub struct SecureInstaller<'a> {
    config: &'a Config,
    client: &'a dyn HttpClient,
    catalog: &'a dyn ReleaseCatalog,
}

impl<'a> SecureInstaller<'a> {
    /// An installer fetching through `client` and `catalog`.
    #[must_use]
    pub fn new(
        config: &'a Config,
        client: &'a dyn HttpClient,
        catalog: &'a dyn ReleaseCatalog,
    ) -> Self {
        Self {
            config,
            client,
            catalog,
        }
    }

    /// Install `version`, published under `tag`.
    ///
    /// # Errors
    ///
    /// Returns the first catalog, download, checksum, or extraction error.
    pub fn install(&self, version: &Version, tag: &str) -> Result<InstallOutcome> {
        let dest = self.config.version_dir(&version.to_string());
        if dest.exists() {
            log::info!("{} {version} is already installed", self.config.tool.folder);
            return Ok(InstallOutcome::AlreadyInstalled(dest));
        }
        let release = self.catalog.release(tag)?;
        let resolved = ResolvedVersion::from_release(self.config, version.clone(), &release)?;
        self.install_resolved(&resolved)
    }

    /// Install an already located release.
    ///
    /// # Errors
    ///
    /// Returns the first download, checksum, or extraction error.
    pub fn install_resolved(&self, resolved: &ResolvedVersion) -> Result<InstallOutcome> {
        let dest = self.config.version_dir(&resolved.version.to_string());
        if dest.exists() {
            log::info!("{} {} is already installed", self.config.tool.folder, resolved.version);
            return Ok(InstallOutcome::AlreadyInstalled(dest));
        }
        let kind = ArchiveKind::from_name(&resolved.asset_name)?;

        log::info!("downloading {}", resolved.asset_url);
        let data = self.client.get(&HttpRequest::new(&resolved.asset_url))?;
        self.verify(resolved, &data)?;

        fs::create_dir_all(&dest)?;
        let extractor = Extractor::new(self.config.limits);
        match extractor.extract(kind, &data, &dest) {
            Ok(files) => {
                log::info!("installed {} files into {dest}", files.len());
                Ok(InstallOutcome::Installed(dest))
            }
            Err(err) => {
                discard(&dest);
                Err(err.into())
            }
        }
    }

    fn verify(&self, resolved: &ResolvedVersion, data: &[u8]) -> Result<()> {
        let outcome = match &resolved.checksums_url {
            Some(url) => {
                let body = self.client.get(&HttpRequest::new(url))?;
                ChecksumManifest::from_bytes(&body).verify(&resolved.asset_name, data)
            }
            None => Err(ChecksumError::SignatureNotFound {
                file: resolved.asset_name.clone(),
            }),
        };
        match outcome {
            Err(ChecksumError::SignatureNotFound { file })
                if !self.config.verification.require_checksum() =>
            {
                log::warn!("no checksum published for {file}, installing unverified");
                Ok(())
            }
            other => other.map_err(Into::into),
        }
    }
}

/// Remove a partially populated install directory.
fn discard(dest: &Utf8Path) {
    log::warn!("removing incomplete install at {dest}");
    if let Err(err) = fs::remove_dir_all(dest) {
        log::warn!("failed to remove {dest}: {err}");
    }
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
