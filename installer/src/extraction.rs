//! Archive extraction into the install tree.
//!
//! Every entry passes the same gate, in order:
//!
//! 1. its path is resolved lexically against the destination and rejected
//!    if it climbs out ([`ExtractionError::PathTraversalRejected`]);
//! 2. only directories and regular files are accepted
//!    ([`ExtractionError::UnsupportedEntryType`]);
//! 3. the optional entry filter may skip it;
//! 4. its declared size is checked against the ceiling before any content
//!    is read ([`ExtractionError::EntryTooLarge`]);
//! 5. files are created with `create_new`, so an existing file is an
//!    [`ExtractionError::InstallConflict`] rather than an overwrite.
//!
//! Any failure aborts the whole extraction. Files written for earlier
//! entries are left in place; the caller owns cleanup of the destination.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read};

/// Default per-entry size ceiling: 200 MiB.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 200 * 1024 * 1024;

/// Mode applied to extracted files on Unix.
#[cfg(unix)]
const FILE_MODE: u32 = 0o755;

/// File type bits (`S_IFMT` and friends) a zip entry's Unix mode may carry.
const UNIX_TYPE_MASK: u32 = 0o170_000;
const UNIX_REGULAR: u32 = 0o100_000;
const UNIX_DIRECTORY: u32 = 0o040_000;
const UNIX_SYMLINK: u32 = 0o120_000;
const UNIX_CHAR_DEVICE: u32 = 0o020_000;
const UNIX_BLOCK_DEVICE: u32 = 0o060_000;
const UNIX_FIFO: u32 = 0o010_000;
const UNIX_SOCKET: u32 = 0o140_000;

/// Resource ceilings applied during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Largest accepted uncompressed size of a single entry, in bytes.
    pub max_entry_size: u64,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The asset name has no recognised archive suffix.
    #[error("unknown archive kind for {name}; expected .zip or .tar.gz")]
    UnknownArchiveKind {
        /// The asset name.
        name: String,
    },

    /// An entry resolves outside the destination directory.
    #[error("archive entry escapes the destination: {path}")]
    PathTraversalRejected {
        /// The entry path as stored in the archive.
        path: String,
    },

    /// An entry is neither a directory nor a regular file.
    #[error("unsupported archive entry type {kind} for {path}")]
    UnsupportedEntryType {
        /// The entry path as stored in the archive.
        path: String,
        /// Description of the entry type.
        kind: String,
    },

    /// An entry exceeds the size ceiling.
    #[error("archive entry {path} is {size} bytes, above the {limit} byte limit")]
    EntryTooLarge {
        /// The entry path as stored in the archive.
        path: String,
        /// Declared or observed size.
        size: u64,
        /// The ceiling in force.
        limit: u64,
    },

    /// The target file already exists.
    #[error("refusing to overwrite existing file {path}")]
    InstallConflict {
        /// The destination path.
        path: Utf8PathBuf,
    },

    /// The archive container itself is malformed.
    #[error("malformed archive: {reason}")]
    Archive {
        /// Description of the problem.
        reason: String,
    },

    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias using [`ExtractionError`].
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Supported archive containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A zip archive.
    Zip,
    /// A gzip-compressed tarball.
    TarGz,
}

impl ArchiveKind {
    /// Detect the kind from the asset file name suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnknownArchiveKind`] for any other suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use tvm_installer::extraction::ArchiveKind;
    ///
    /// let kind = ArchiveKind::from_name("tofu_1.6.0_linux_amd64.zip").ok();
    /// assert_eq!(kind, Some(ArchiveKind::Zip));
    /// assert!(ArchiveKind::from_name("tofu_1.6.0_linux_amd64.tar.zst").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Ok(Self::Zip)
        } else if lower.ends_with(".tar.gz") {
            Ok(Self::TarGz)
        } else {
            Err(ExtractionError::UnknownArchiveKind {
                name: name.to_owned(),
            })
        }
    }
}

/// Decides which validated entries are materialised.
pub trait EntryFilter {
    /// Whether to write the entry at `path`, relative to the destination.
    fn keep(&self, path: &Utf8Path) -> bool;
}

impl<F> EntryFilter for F
where
    F: Fn(&Utf8Path) -> bool,
{
    fn keep(&self, path: &Utf8Path) -> bool {
        self(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

/// Extracts archives under one set of limits and an optional filter.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use tvm_installer::extraction::{ArchiveKind, ExtractionLimits, Extractor};
///
/// let data = std::fs::read("tofu_1.6.0_linux_amd64.zip")?;
/// let keep_binary = |path: &Utf8Path| path.as_str() == "tofu";
/// let written = Extractor::new(ExtractionLimits::default())
///     .with_filter(&keep_binary)
///     .extract(ArchiveKind::Zip, &data, Utf8Path::new("/opt/tvm/OpenTofu/1.6.0"))?;
/// assert_eq!(written.len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy)]
pub struct Extractor<'a> {
    limits: ExtractionLimits,
    filter: Option<&'a dyn EntryFilter>,
}

impl<'a> Extractor<'a> {
    /// An extractor that writes every entry.
    #[must_use]
    pub fn new(limits: ExtractionLimits) -> Self {
        Self {
            limits,
            filter: None,
        }
    }

    /// Only write entries accepted by `filter`.
    #[must_use]
    pub fn with_filter(self, filter: &'a dyn EntryFilter) -> Self {
        Self {
            filter: Some(filter),
            ..self
        }
    }

    /// Extract `data` into the existing directory `dest`.
    ///
    /// Returns the destination-relative paths of the files written.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExtractionError`] raised by any entry.
    pub fn extract(
        &self,
        kind: ArchiveKind,
        data: &[u8],
        dest: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>> {
        log::debug!("extracting {kind:?} archive ({} bytes) into {dest}", data.len());
        match kind {
            ArchiveKind::Zip => self.extract_zip(data, dest),
            ArchiveKind::TarGz => self.extract_tar_gz(data, dest),
        }
    }

    fn extract_zip(&self, data: &[u8], dest: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(archive_error)?;
        let mut written = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index(index).map_err(archive_error)?;
            let name = entry.name().to_owned();
            let relative = resolve_entry_path(&name)?;
            let kind = zip_entry_kind(&name, entry.is_dir(), entry.is_file(), entry.unix_mode())?;
            let size = entry.size();
            if let Some(path) = self.write_entry(dest, &name, &relative, kind, size, entry)? {
                written.push(path);
            }
        }
        Ok(written)
    }

    fn extract_tar_gz(&self, data: &[u8], dest: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let mut archive = tar::Archive::new(GzDecoder::new(data));
        let mut written = Vec::new();
        for entry in archive.entries()? {
            let entry = entry?;
            let entry_type = entry.header().entry_type();
            if entry_type == tar::EntryType::XGlobalHeader {
                continue;
            }
            let name = {
                let raw_path = entry.path()?;
                raw_path.to_str().map(str::to_owned).ok_or_else(|| {
                    ExtractionError::Archive {
                        reason: format!("entry path is not UTF-8: {}", raw_path.display()),
                    }
                })?
            };
            let relative = resolve_entry_path(&name)?;
            let kind = tar_entry_kind(entry_type, &name)?;
            let size = entry.size();
            if let Some(path) = self.write_entry(dest, &name, &relative, kind, size, entry)? {
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Apply the filter and size ceiling, then materialise one entry.
    fn write_entry(
        &self,
        dest: &Utf8Path,
        name: &str,
        relative: &Utf8Path,
        kind: EntryKind,
        declared_size: u64,
        reader: impl Read,
    ) -> Result<Option<Utf8PathBuf>> {
        if relative.as_str().is_empty() {
            // The destination itself; only a directory can name it.
            return match kind {
                EntryKind::Directory => Ok(None),
                EntryKind::File => Err(ExtractionError::PathTraversalRejected {
                    path: name.to_owned(),
                }),
            };
        }
        if self.filter.is_some_and(|filter| !filter.keep(relative)) {
            log::trace!("skipping filtered entry {name}");
            return Ok(None);
        }

        let target = dest.join(relative);
        match kind {
            EntryKind::Directory => {
                fs::create_dir_all(&target)?;
                Ok(None)
            }
            EntryKind::File => {
                let limit = self.limits.max_entry_size;
                if declared_size > limit {
                    return Err(too_large(name, declared_size, limit));
                }
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = create_new(&target)?;
                let copied = io::copy(&mut reader.take(limit.saturating_add(1)), &mut file)?;
                if copied > limit {
                    return Err(too_large(name, copied, limit));
                }
                log::trace!("wrote {target} ({copied} bytes)");
                Ok(Some(relative.to_owned()))
            }
        }
    }
}

/// Resolve an archive entry path lexically, relative to the destination.
///
/// `.` segments are dropped and `..` pops a segment; popping past the root,
/// an absolute path, or a drive prefix is rejected.
fn resolve_entry_path(name: &str) -> Result<Utf8PathBuf> {
    let rejected = || ExtractionError::PathTraversalRejected {
        path: name.to_owned(),
    };
    if name.starts_with(['/', '\\']) {
        return Err(rejected());
    }
    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or_else(rejected)?;
            }
            other if other.contains(':') => return Err(rejected()),
            other => segments.push(other),
        }
    }
    Ok(segments.into_iter().collect())
}

fn zip_entry_kind(
    name: &str,
    is_dir: bool,
    is_file: bool,
    unix_mode: Option<u32>,
) -> Result<EntryKind> {
    let special = match unix_mode.map_or(0, |mode| mode & UNIX_TYPE_MASK) {
        0 | UNIX_REGULAR | UNIX_DIRECTORY => None,
        UNIX_SYMLINK => Some("symlink"),
        UNIX_CHAR_DEVICE => Some("char device"),
        UNIX_BLOCK_DEVICE => Some("block device"),
        UNIX_FIFO => Some("fifo"),
        UNIX_SOCKET => Some("socket"),
        _ => Some("unknown"),
    };
    if let Some(kind) = special {
        return Err(ExtractionError::UnsupportedEntryType {
            path: name.to_owned(),
            kind: kind.to_owned(),
        });
    }
    if is_dir {
        Ok(EntryKind::Directory)
    } else if is_file {
        Ok(EntryKind::File)
    } else {
        Err(ExtractionError::UnsupportedEntryType {
            path: name.to_owned(),
            kind: "unknown".to_owned(),
        })
    }
}

fn tar_entry_kind(entry_type: tar::EntryType, name: &str) -> Result<EntryKind> {
    match entry_type {
        tar::EntryType::Directory => Ok(EntryKind::Directory),
        tar::EntryType::Regular | tar::EntryType::Continuous => Ok(EntryKind::File),
        other => Err(ExtractionError::UnsupportedEntryType {
            path: name.to_owned(),
            kind: format!("{other:?}").to_lowercase(),
        }),
    }
}

fn create_new(path: &Utf8Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options.open(path).map_err(|err| {
        if err.kind() == io::ErrorKind::AlreadyExists {
            ExtractionError::InstallConflict {
                path: path.to_owned(),
            }
        } else {
            ExtractionError::Io(err)
        }
    })
}

fn too_large(name: &str, size: u64, limit: u64) -> ExtractionError {
    ExtractionError::EntryTooLarge {
        path: name.to_owned(),
        size,
        limit,
    }
}

fn archive_error(err: zip::result::ZipError) -> ExtractionError {
    match err {
        zip::result::ZipError::Io(io) => ExtractionError::Io(io),
        other => ExtractionError::Archive {
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
