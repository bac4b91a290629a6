//! SHA-256 checksum manifests.
//!
//! A manifest is newline-delimited `<digest> <file name>` text, as produced
//! by `sha256sum`. Digests are accepted hex-encoded (64 characters) or
//! standard base64; anything that does not decode to 32 bytes is rejected.
//! File names match exactly or at a `/` boundary, so `./dist/tofu.zip`
//! answers for `tofu.zip` but `mytofu.zip` does not.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a raw SHA-256 digest in bytes.
const DIGEST_LEN: usize = 32;

/// Length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// Errors arising from checksum verification.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The computed digest differs from the manifest entry.
    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The verified file name.
        file: String,
        /// Digest recorded in the manifest.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// The manifest has no entry for the file.
    #[error("no checksum found for {file}")]
    SignatureNotFound {
        /// The file name looked up.
        file: String,
    },

    /// The manifest entry for the file is not a SHA-256 digest.
    #[error("invalid checksum for {file}: {reason}")]
    InvalidDigest {
        /// The file name looked up.
        file: String,
        /// Description of the problem.
        reason: String,
    },
}

/// A raw SHA-256 digest.
///
/// # Examples
///
/// ```
/// use tvm_installer::checksum::Sha256Digest;
///
/// let digest = Sha256Digest::of(b"");
/// assert_eq!(
///     digest.to_string(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Digest([u8; DIGEST_LEN]);

impl Sha256Digest {
    /// Digest `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Decode a hex or base64 digest token.
    ///
    /// # Errors
    ///
    /// Returns the decode failure as a message.
    pub fn decode(token: &str) -> Result<Self, String> {
        let bytes = if token.len() == DIGEST_HEX_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
        {
            hex::decode(token).map_err(|err| err.to_string())?
        } else {
            STANDARD
                .decode(token)
                .map_err(|err| format!("neither hex nor base64: {err}"))?
        };
        let raw: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| format!("expected {DIGEST_LEN} bytes, got {}", bytes.len()))?;
        Ok(Self(raw))
    }

    /// The digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ManifestLine {
    digest: String,
    file: String,
}

/// A parsed checksum manifest.
///
/// Lines are split eagerly but digests decode only on lookup, so a
/// malformed entry for another platform does not spoil the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    lines: Vec<ManifestLine>,
}

impl ChecksumManifest {
    /// Split `text` into digest and file-name columns. Blank and
    /// single-column lines are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .filter_map(|line| {
                let mut columns = line.split_whitespace();
                let digest = columns.next()?;
                let file = columns.next()?;
                Some(ManifestLine {
                    digest: digest.to_owned(),
                    file: file.trim_start_matches('*').to_owned(),
                })
            })
            .collect();
        Self { lines }
    }

    /// Parse a downloaded manifest body.
    #[must_use]
    pub fn from_bytes(body: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(body))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the manifest has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The expected digest for `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::SignatureNotFound`] when no line names the
    /// file, or [`ChecksumError::InvalidDigest`] when its digest does not
    /// decode.
    pub fn lookup(&self, file_name: &str) -> Result<Sha256Digest, ChecksumError> {
        let line = self
            .lines
            .iter()
            .find(|line| names_file(&line.file, file_name))
            .ok_or_else(|| ChecksumError::SignatureNotFound {
                file: file_name.to_owned(),
            })?;
        Sha256Digest::decode(&line.digest).map_err(|reason| ChecksumError::InvalidDigest {
            file: file_name.to_owned(),
            reason,
        })
    }

    /// Check `data` against the entry for `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::ChecksumMismatch`] when the digests differ,
    /// or any error from [`ChecksumManifest::lookup`].
    pub fn verify(&self, file_name: &str, data: &[u8]) -> Result<(), ChecksumError> {
        let expected = self.lookup(file_name)?;
        let actual = Sha256Digest::of(data);
        if expected != actual {
            return Err(ChecksumError::ChecksumMismatch {
                file: file_name.to_owned(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        log::debug!("checksum verified for {file_name}");
        Ok(())
    }
}

fn names_file(column: &str, file_name: &str) -> bool {
    column == file_name
        || column
            .strip_suffix(file_name)
            .is_some_and(|prefix| prefix.ends_with('/'))
}
