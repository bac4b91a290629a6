//! Test support utilities for installer behavioural tests.
//!
//! Provides an isolated install root, in-memory stand-ins for the HTTP and
//! release catalog seams, and builders for the archives a release publishes.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;
use tempfile::TempDir;
use tvm_installer::catalog::{Asset, CatalogError, ReleaseCatalog, ReleaseEntry, parse_tag};
use tvm_installer::checksum::Sha256Digest;
use tvm_installer::config::{Config, ToolSpec};
use tvm_installer::download::{DownloadError, HttpClient, HttpRequest};
use tvm_installer::platform::Platform;
use zip::write::SimpleFileOptions;

/// Base URL every stub asset is served under.
pub const DOWNLOAD_BASE: &str = "https://releases.test/download";

/// A temporary install root, home directory, and project directory.
pub struct Sandbox {
    // Keep the directory alive for the lifetime of the scenario.
    _temp: TempDir,
    /// Config pointing into the sandbox for linux/amd64.
    pub config: Config,
}

impl Sandbox {
    /// Create the sandbox directories.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let base = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        let work = base.join("home").join("project");
        std::fs::create_dir_all(&work).expect("project dir");
        let config = Config::new(
            ToolSpec::opentofu(),
            base.join("root"),
            base.join("home"),
            work,
            Platform::new("linux", "amd64").expect("platform"),
        );
        Self {
            _temp: temp,
            config,
        }
    }

    /// Write `contents` to `relative` under the project directory.
    pub fn write_project_file(&self, relative: &str, contents: &str) {
        write_file(&self.config.work_path.join(relative), contents);
    }

    /// Create an empty install directory for `version`.
    pub fn seed_installed(&self, version: &str) {
        std::fs::create_dir_all(self.config.version_dir(version)).expect("seed install");
    }
}

/// Write a file, creating its parent directories.
pub fn write_file(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("parent dir");
    }
    std::fs::write(path, contents).expect("write file");
}

/// Serves canned bodies by URL and records every request.
#[derive(Default)]
pub struct StubHttp {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StubHttp {
    /// Answer requests for `url` with `body`.
    pub fn serve(&mut self, url: impl Into<String>, body: Vec<u8>) {
        self.bodies.insert(url.into(), body);
    }

    /// The URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock").clone()
    }
}

impl HttpClient for StubHttp {
    fn get(&self, request: &HttpRequest) -> Result<Vec<u8>, DownloadError> {
        self.requests.lock().expect("lock").push(request.url.clone());
        self.bodies
            .get(&request.url)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound {
                url: request.url.clone(),
            })
    }
}

/// A fixed list of releases.
#[derive(Default)]
pub struct StubCatalog {
    releases: Vec<ReleaseEntry>,
}

impl StubCatalog {
    /// Publish a release with no assets.
    pub fn publish_tag(&mut self, tag: &str) {
        self.releases.push(ReleaseEntry {
            tag: tag.to_owned(),
            assets: Vec::new(),
        });
    }

    /// Publish `version` with a linux/amd64 zip built from `entries` and,
    /// when `checksum` is given, a manifest listing it. The archive and
    /// manifest are registered with `http`.
    pub fn publish(
        &mut self,
        http: &mut StubHttp,
        version: &str,
        entries: &[(&str, &[u8])],
        checksum: Checksum,
    ) {
        let archive_name = format!("tofu_{version}_linux_amd64.zip");
        let sums_name = format!("tofu_{version}_SHA256SUMS");
        let archive_url = format!("{DOWNLOAD_BASE}/v{version}/{archive_name}");
        let sums_url = format!("{DOWNLOAD_BASE}/v{version}/{sums_name}");
        let data = zip_archive(entries);

        let mut assets = vec![Asset {
            name: archive_name.clone(),
            url: archive_url.clone(),
        }];
        let manifest_digest = match checksum {
            Checksum::Matching => Some(Sha256Digest::of(&data)),
            Checksum::Tampered => Some(Sha256Digest::of(b"a different archive")),
            Checksum::Missing => None,
        };
        if let Some(digest) = manifest_digest {
            http.serve(&sums_url, format!("{digest}  {archive_name}\n").into_bytes());
            assets.push(Asset {
                name: sums_name,
                url: sums_url,
            });
        }
        http.serve(&archive_url, data);
        self.releases.push(ReleaseEntry {
            tag: format!("v{version}"),
            assets,
        });
    }
}

impl ReleaseCatalog for StubCatalog {
    fn list_releases(&self) -> Result<Vec<ReleaseEntry>, CatalogError> {
        Ok(self.releases.clone())
    }

    fn latest_release(&self) -> Result<String, CatalogError> {
        self.releases
            .iter()
            .filter_map(|release| {
                parse_tag(&release.tag, "v")
                    .ok()
                    .filter(|version| !version.is_prerelease())
                    .map(|version| (version, release.tag.clone()))
            })
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, tag)| tag)
            .ok_or_else(|| not_found("latest"))
    }

    fn release(&self, tag: &str) -> Result<ReleaseEntry, CatalogError> {
        self.releases
            .iter()
            .find(|release| release.tag == tag)
            .cloned()
            .ok_or_else(|| not_found(tag))
    }
}

fn not_found(tag: &str) -> CatalogError {
    CatalogError::Download(DownloadError::NotFound {
        url: format!("{DOWNLOAD_BASE}/{tag}"),
    })
}

/// What the published checksum manifest says about the archive.
#[derive(Debug, Clone, Copy)]
pub enum Checksum {
    /// The manifest lists the archive's real digest.
    Matching,
    /// The manifest lists a digest of other bytes.
    Tampered,
    /// No manifest is published.
    Missing,
}

/// Build a zip archive in memory. Entry names are stored verbatim.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().unix_permissions(0o755);
    for (name, data) in entries {
        writer.start_file(*name, options).expect("start zip file");
        writer.write_all(data).expect("write zip file");
    }
    writer.finish().expect("finish zip").into_inner()
}
