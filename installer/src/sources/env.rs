//! The version override environment variable.

use super::{Result, SourceKind, VersionRequirement, VersionSource};
use crate::config::Config;

type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Reads [`ToolSpec::version_env`](crate::config::ToolSpec::version_env).
/// Found iff set and non-empty after trimming.
pub struct EnvOverride {
    lookup: Lookup,
}

impl EnvOverride {
    /// Read from the process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup` instead of the process environment.
    #[must_use]
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl VersionSource for EnvOverride {
    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }

    fn probe(&self, config: &Config) -> Result<Option<VersionRequirement>> {
        let name = &config.tool.version_env;
        let found = (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        if let Some(value) = &found {
            log::debug!("{name} requests {value}");
        }
        Ok(found.map(|value| VersionRequirement::new(SourceKind::Environment, value)))
    }
}
