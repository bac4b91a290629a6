//! The tool-switch TOML file.

use super::{Result, SourceError, SourceKind, VersionRequirement, VersionSource, read_optional};
use crate::config::Config;
use camino::Utf8Path;

/// Reads the version field of
/// [`ToolSpec::switch_file`](crate::config::ToolSpec::switch_file) from each
/// of [`Config::search_dirs`] in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchFile;

impl VersionSource for SwitchFile {
    fn kind(&self) -> SourceKind {
        SourceKind::SwitchFile
    }

    fn probe(&self, config: &Config) -> Result<Option<VersionRequirement>> {
        for dir in config.search_dirs() {
            let path = dir.join(&config.tool.switch_file);
            let Some(text) = read_optional(&path)? else {
                continue;
            };
            if let Some(value) = version_field(&path, &text, &config.tool.switch_field)? {
                let requirement = VersionRequirement::new(SourceKind::SwitchFile, value).at(&path);
                requirement.parse()?;
                log::info!("resolved {requirement}");
                return Ok(Some(requirement));
            }
            log::debug!("{path} has no {} field", config.tool.switch_field);
        }
        Ok(None)
    }
}

/// The trimmed string value of `field`; absent or empty yields `None`.
fn version_field(path: &Utf8Path, text: &str, field: &str) -> Result<Option<String>> {
    let parse_error = |reason: String| SourceError::Parse {
        origin: path.to_string(),
        reason,
    };
    let table: toml::Table = text.parse().map_err(|err: toml::de::Error| parse_error(err.to_string()))?;
    match table.get(field) {
        None => Ok(None),
        Some(toml::Value::String(value)) => {
            let value = value.trim();
            Ok((!value.is_empty()).then(|| value.to_owned()))
        }
        Some(other) => Err(parse_error(format!(
            "{field} must be a string, found {}",
            other.type_str()
        ))),
    }
}
