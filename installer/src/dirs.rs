//! Directory resolution abstraction for platform-specific paths.
//!
//! Wraps `directories-next` behind a trait so configuration loading can be
//! exercised with fixed paths in tests.

use camino::Utf8PathBuf;

/// Source of the user-level directories tvm needs.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The user's home directory.
    fn home_dir(&self) -> Option<Utf8PathBuf>;
}

/// Production implementation backed by `directories-next`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        directories_next::BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::try_from(dirs.home_dir().to_path_buf()).ok())
    }
}

/// Fixed directories, for callers that already know where home is.
#[derive(Debug, Clone, Default)]
pub struct FixedBaseDirs {
    home: Option<Utf8PathBuf>,
}

impl FixedBaseDirs {
    /// Use `home` as the home directory.
    #[must_use]
    pub fn new(home: impl Into<Utf8PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }
}

impl BaseDirs for FixedBaseDirs {
    fn home_dir(&self) -> Option<Utf8PathBuf> {
        self.home.clone()
    }
}
