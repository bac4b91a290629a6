//! The version manager facade.
//!
//! Ties resolution, selection and installation together behind the
//! operations the `tvm` binary exposes. Keywords and constraints are first
//! matched against installed versions unless [`Config::force_remote`] is
//! set; only when nothing installed fits is the catalog consulted.

use crate::catalog::{ReleaseCatalog, parse_tag};
use crate::config::Config;
use crate::download::HttpClient;
use crate::error::{InstallerError, Result};
use crate::install::SecureInstaller;
use crate::resolver::{Candidate, ConstraintResolver, EffectiveRequest, select};
use camino::Utf8PathBuf;
use std::fs;
use std::io;
use tvm_version::{Keyword, RequestedVersion, Version};

/// A version chosen for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    /// The concrete version.
    pub version: Version,
    /// Its install directory.
    pub path: Utf8PathBuf,
    /// Whether the install directory exists.
    pub installed: bool,
}

/// Resolution and installation operations for one tool.
pub struct VersionManager<'a> {
    config: &'a Config,
    resolver: ConstraintResolver,
    client: &'a dyn HttpClient,
    catalog: &'a dyn ReleaseCatalog,
}

impl<'a> VersionManager<'a> {
    /// A manager resolving with `resolver` and fetching through `client`
    /// and `catalog`.
    #[must_use]
    pub fn new(
        config: &'a Config,
        resolver: ConstraintResolver,
        client: &'a dyn HttpClient,
        catalog: &'a dyn ReleaseCatalog,
    ) -> Self {
        Self {
            config,
            resolver,
            client,
            catalog,
        }
    }

    /// Resolve the version the project asks for, installing it when
    /// [`Config::auto_install`] is set.
    ///
    /// # Errors
    ///
    /// Returns any resolution, catalog, or installation error.
    pub fn detect(&self) -> Result<Detected> {
        let effective = self.resolver.resolve(self.config)?;
        log::info!("{effective} requested by {}", effective.origin);
        self.provide(&effective, self.config.auto_install)
    }

    /// Install the version satisfying `requested`, regardless of
    /// [`Config::auto_install`].
    ///
    /// # Errors
    ///
    /// Returns any resolution, catalog, or installation error.
    pub fn install(&self, requested: RequestedVersion) -> Result<Detected> {
        let effective = self.resolver.explicit(self.config, requested)?;
        self.provide(&effective, true)
    }

    /// Resolve `requested` and pin the result, in the working directory or
    /// in the install root. Returns the file written.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::WriteFailed`] when the file cannot be
    /// written, or any error from resolution and installation.
    pub fn use_version(&self, requested: RequestedVersion, working_dir: bool) -> Result<Utf8PathBuf> {
        let effective = self.resolver.explicit(self.config, requested)?;
        let detected = self.provide(&effective, self.config.auto_install)?;
        let target = if working_dir {
            self.config.work_path.join(&self.config.tool.pinned_file)
        } else {
            self.config.root_pinned_file()
        };
        let write_failed = |source| InstallerError::WriteFailed {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        fs::write(&target, detected.version.to_string()).map_err(write_failed)?;
        log::info!("wrote {} to {target}", detected.version);
        Ok(target)
    }

    /// Installed versions, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] when the install directory exists but
    /// cannot be read.
    pub fn list_local(&self) -> Result<Vec<Version>> {
        Ok(sorted(self.local_candidates()?))
    }

    /// Published versions, ascending. Malformed tags are skipped.
    ///
    /// # Errors
    ///
    /// Returns any catalog error.
    pub fn list_remote(&self) -> Result<Vec<Version>> {
        Ok(sorted(self.remote_candidates()?))
    }

    /// Remove an installed version. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Version`] for a malformed version, or
    /// [`InstallerError::Io`] when removal fails.
    pub fn uninstall(&self, version: &str) -> Result<bool> {
        let version: Version = version.parse()?;
        let dir = self.config.version_dir(&version.to_string());
        if !dir.is_dir() {
            log::info!("{} {version} is not installed", self.config.tool.folder);
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        log::info!("removed {dir}");
        Ok(true)
    }

    /// Remove the pinned-version file from the install root. Returns
    /// whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] when removal fails.
    pub fn reset(&self) -> Result<bool> {
        let path = self.config.root_pinned_file();
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("removed {path}");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn provide(&self, effective: &EffectiveRequest, install: bool) -> Result<Detected> {
        if let Some(version) = effective.exact() {
            let tag = format!("{}{version}", self.config.tool.tag_prefix);
            return self.finish(version.clone(), &tag, install);
        }

        if !self.config.force_remote {
            let local = self.local_candidates()?;
            if let Some(found) = select(effective, &local) {
                log::info!("using installed version {}", found.version);
                return Ok(Detected {
                    version: found.version.clone(),
                    path: self.config.version_dir(&found.tag),
                    installed: true,
                });
            }
            if !install {
                return Err(InstallerError::NotInstalled {
                    version: effective.to_string(),
                });
            }
            log::info!("no installed version satisfies {effective}, searching releases");
        }

        let (version, tag) = self.remote_match(effective)?;
        self.finish(version, &tag, install)
    }

    fn finish(&self, version: Version, tag: &str, install: bool) -> Result<Detected> {
        if !install {
            let path = self.config.version_dir(&version.to_string());
            let installed = path.is_dir();
            return Ok(Detected {
                version,
                path,
                installed,
            });
        }
        let installer = SecureInstaller::new(self.config, self.client, self.catalog);
        let outcome = installer.install(&version, tag)?;
        Ok(Detected {
            version,
            path: outcome.path().to_owned(),
            installed: true,
        })
    }

    fn remote_match(&self, effective: &EffectiveRequest) -> Result<(Version, String)> {
        if effective.request == RequestedVersion::Keyword(Keyword::Latest) {
            let tag = self.catalog.latest_release()?;
            let version = parse_tag(&tag, &self.config.tool.tag_prefix)?;
            return Ok((version, tag));
        }
        let candidates = self.remote_candidates()?;
        select(effective, &candidates)
            .map(|found| (found.version.clone(), found.tag.clone()))
            .ok_or_else(|| InstallerError::ConstraintUnsatisfiable {
                requirement: effective.to_string(),
            })
    }

    fn remote_candidates(&self) -> Result<Vec<Candidate>> {
        let tags = self
            .catalog
            .list_releases()?
            .into_iter()
            .map(|release| release.tag);
        Ok(Candidate::parse_all(tags, &self.config.tool.tag_prefix))
    }

    fn local_candidates(&self) -> Result<Vec<Candidate>> {
        let dir = self.config.install_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => log::warn!("skipping non UTF-8 entry {} in {dir}", name.to_string_lossy()),
            }
        }
        Ok(Candidate::parse_all(names, ""))
    }
}

fn sorted(candidates: Vec<Candidate>) -> Vec<Version> {
    let mut versions: Vec<Version> = candidates.into_iter().map(|c| c.version).collect();
    versions.sort();
    versions
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
