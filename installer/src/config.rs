//! Configuration threaded through resolution and installation.
//!
//! Nothing in the pipeline reads the process environment directly. A
//! [`Config`] is built once, usually by [`Config::from_env`], and passed by
//! reference to every component that needs a path, a platform, or a policy.

use crate::dirs::{BaseDirs, SystemBaseDirs};
use crate::error::{InstallerError, Result};
use crate::extraction::ExtractionLimits;
use crate::platform::Platform;
use crate::verification::VerificationPolicy;
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;
use tvm_version::Keyword;

/// Environment variable naming the install root.
pub const ROOT_ENV: &str = "TVM_ROOT";
/// Environment variable overriding the release architecture.
pub const ARCH_ENV: &str = "TVM_ARCH";
/// Environment variable holding a GitHub token.
pub const TOKEN_ENV: &str = "TVM_GITHUB_TOKEN";
/// Fallback token variable shared with other GitHub tooling.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable overriding the release listing URL.
pub const REMOTE_URL_ENV: &str = "TVM_REMOTE_URL";
/// Environment variable forcing catalog lookups over installed versions.
pub const FORCE_REMOTE_ENV: &str = "TVM_FORCE_REMOTE";
/// Environment variable toggling automatic installation.
pub const AUTO_INSTALL_ENV: &str = "TVM_AUTO_INSTALL";
/// Environment variable toggling mandatory checksum verification.
pub const REQUIRE_CHECKSUM_ENV: &str = "TVM_REQUIRE_CHECKSUM";
/// Environment variable naming the fallback keyword.
pub const DEFAULT_CONSTRAINT_ENV: &str = "TVM_DEFAULT_CONSTRAINT";
/// Environment variable holding the HTTP timeout in seconds.
pub const HTTP_TIMEOUT_ENV: &str = "TVM_HTTP_TIMEOUT";

/// Describes the managed tool: where its versions come from and how its
/// releases are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Executable name without platform suffix.
    pub binary: String,
    /// Directory under the install root holding installed versions.
    pub folder: String,
    /// Environment variable carrying an exact version override.
    pub version_env: String,
    /// Pinned-version file name.
    pub pinned_file: String,
    /// Tool-switch TOML file name.
    pub switch_file: String,
    /// Top-level field of the tool-switch file naming the version.
    pub switch_field: String,
    /// File suffixes scanned for project constraints.
    pub project_extensions: Vec<String>,
    /// Top-level block holding the constraint attribute.
    pub project_block: String,
    /// Attribute holding the constraint expression.
    pub project_attribute: String,
    /// Release listing endpoint.
    pub releases_url: String,
    /// Prefix carried by release tags but not by asset names.
    pub tag_prefix: String,
    /// Archive suffix of the release assets, including the leading dot.
    pub archive_extension: String,
}

impl ToolSpec {
    /// The OpenTofu release layout.
    ///
    /// # Examples
    ///
    /// ```
    /// use tvm_installer::config::ToolSpec;
    ///
    /// let tool = ToolSpec::opentofu();
    /// assert_eq!(tool.binary, "tofu");
    /// assert_eq!(tool.pinned_file, ".opentofu-version");
    /// ```
    #[must_use]
    pub fn opentofu() -> Self {
        Self {
            binary: "tofu".to_owned(),
            folder: "OpenTofu".to_owned(),
            version_env: "TVM_TOFU_VERSION".to_owned(),
            pinned_file: ".opentofu-version".to_owned(),
            switch_file: ".tofuswitch.toml".to_owned(),
            switch_field: "version".to_owned(),
            project_extensions: [".tofu", ".tf", ".tofu.json", ".tf.json"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            project_block: "terraform".to_owned(),
            project_attribute: "required_version".to_owned(),
            releases_url: "https://api.github.com/repos/opentofu/opentofu/releases".to_owned(),
            tag_prefix: "v".to_owned(),
            archive_extension: ".zip".to_owned(),
        }
    }
}

/// Everything the pipeline needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct Config {
    /// The managed tool.
    pub tool: ToolSpec,
    /// Install root; versions live under `<root>/<folder>/<version>`.
    pub root_path: Utf8PathBuf,
    /// User-level directory searched after the project directory.
    pub user_path: Utf8PathBuf,
    /// Project directory searched first and walked for constraints.
    pub work_path: Utf8PathBuf,
    /// Release platform.
    pub platform: Platform,
    /// Bearer token for catalog requests.
    pub github_token: Option<String>,
    /// Checksum policy.
    pub verification: VerificationPolicy,
    /// Skip installed versions when resolving keywords and constraints.
    pub force_remote: bool,
    /// Install a resolved version that is not yet present.
    pub auto_install: bool,
    /// Keyword used when no source yields a requirement.
    pub fallback: Option<Keyword>,
    /// Archive extraction ceilings.
    pub limits: ExtractionLimits,
    /// Whole-request timeout for HTTP calls.
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// A config with defaults for `tool`, rooted at `root_path`.
    #[must_use]
    pub fn new(
        tool: ToolSpec,
        root_path: Utf8PathBuf,
        user_path: Utf8PathBuf,
        work_path: Utf8PathBuf,
        platform: Platform,
    ) -> Self {
        Self {
            tool,
            root_path,
            user_path,
            work_path,
            platform,
            github_token: None,
            verification: VerificationPolicy::default(),
            force_remote: false,
            auto_install: true,
            fallback: Some(Keyword::LatestAllowed),
            limits: ExtractionLimits::default(),
            http_timeout: None,
        }
    }

    /// Build a config from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env_with`].
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok(), &SystemBaseDirs)
    }

    /// Build a config from variables supplied by `lookup`.
    ///
    /// The working directory is the process's current directory; callers
    /// may replace [`Config::work_path`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] when the home directory cannot be
    /// found, or when a variable holds a value of the wrong shape.
    pub fn from_env_with<F>(lookup: F, base_dirs: &dyn BaseDirs) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let home = base_dirs.home_dir().ok_or_else(|| InstallerError::Config {
            reason: "could not determine home directory".to_owned(),
        })?;
        let root_path = var(ROOT_ENV).map_or_else(|| home.join(".tvm"), Utf8PathBuf::from);
        let work_path = current_dir()?;
        let platform = Platform::host(var(ARCH_ENV).as_deref())?;

        let mut tool = ToolSpec::opentofu();
        if let Some(url) = var(REMOTE_URL_ENV) {
            tool.releases_url = url;
        }

        let mut config = Self::new(tool, root_path, home, work_path, platform);
        config.github_token = var(TOKEN_ENV).or_else(|| var(GITHUB_TOKEN_ENV));
        let flag = |key: &str, default: bool| parse_flag(key, var(key).as_deref(), default);
        config.force_remote = flag(FORCE_REMOTE_ENV, false)?;
        config.auto_install = flag(AUTO_INSTALL_ENV, true)?;
        if !flag(REQUIRE_CHECKSUM_ENV, true)? {
            config.verification = VerificationPolicy::optional();
        }
        config.fallback = parse_fallback(lookup(DEFAULT_CONSTRAINT_ENV).as_deref())?;
        config.http_timeout = var(HTTP_TIMEOUT_ENV)
            .map(|value| parse_timeout(&value))
            .transpose()?;
        Ok(config)
    }

    /// Directory holding every installed version of the tool.
    #[must_use]
    pub fn install_dir(&self) -> Utf8PathBuf {
        self.root_path.join(&self.tool.folder)
    }

    /// Directory holding one installed version.
    #[must_use]
    pub fn version_dir(&self, version: &str) -> Utf8PathBuf {
        self.install_dir().join(version)
    }

    /// Directories searched for pinned and switch files, highest priority
    /// first: the working directory, the user directory, then the install
    /// root. A directory that appears twice is searched once.
    #[must_use]
    pub fn search_dirs(&self) -> Vec<&Utf8Path> {
        let mut dirs: Vec<&Utf8Path> = Vec::with_capacity(3);
        for dir in [&self.work_path, &self.user_path, &self.root_path] {
            if !dirs.contains(&dir.as_path()) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// The pinned-version file in the install root.
    #[must_use]
    pub fn root_pinned_file(&self) -> Utf8PathBuf {
        self.root_path.join(&self.tool.pinned_file)
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir()?;
    Utf8PathBuf::try_from(dir).map_err(|err| InstallerError::Config {
        reason: format!("working directory is not valid UTF-8: {err}"),
    })
}

fn parse_flag(key: &str, value: Option<&str>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(InstallerError::Config {
            reason: format!("{key} must be a boolean, got \"{other}\""),
        }),
    }
}

/// An unset variable keeps the default keyword; an explicitly empty one
/// disables the fallback.
fn parse_fallback(value: Option<&str>) -> Result<Option<Keyword>> {
    match value.map(str::trim) {
        None => Ok(Some(Keyword::LatestAllowed)),
        Some("") => Ok(None),
        Some(raw) => raw
            .parse::<Keyword>()
            .map(Some)
            .map_err(|err| InstallerError::Config {
                reason: format!("{DEFAULT_CONSTRAINT_ENV}: {err}"),
            }),
    }
}

fn parse_timeout(value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| InstallerError::Config {
            reason: format!("{HTTP_TIMEOUT_ENV} must be a number of seconds, got \"{value}\""),
        })
}
