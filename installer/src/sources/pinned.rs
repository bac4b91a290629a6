//! The pinned-version file.
//!
//! A single line naming a version, keyword, or constraint. An empty file is
//! skipped and the search continues; content that does not parse is a hard
//! error because the file was put there on purpose.

use super::{Result, SourceKind, VersionRequirement, VersionSource, read_optional};
use crate::config::Config;

/// Reads [`ToolSpec::pinned_file`](crate::config::ToolSpec::pinned_file)
/// from each of [`Config::search_dirs`] in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinnedFile;

impl VersionSource for PinnedFile {
    fn kind(&self) -> SourceKind {
        SourceKind::PinnedFile
    }

    fn probe(&self, config: &Config) -> Result<Option<VersionRequirement>> {
        for dir in config.search_dirs() {
            let path = dir.join(&config.tool.pinned_file);
            let Some(text) = read_optional(&path)? else {
                continue;
            };
            let value = text.trim();
            if value.is_empty() {
                log::debug!("{path} is empty, ignoring");
                continue;
            }
            let requirement = VersionRequirement::new(SourceKind::PinnedFile, value).at(&path);
            requirement.parse()?;
            log::info!("resolved {requirement}");
            return Ok(Some(requirement));
        }
        Ok(None)
    }
}
