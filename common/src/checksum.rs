//! Catalog checksum (`addons.xml.md5`).
//!
//! Clients fetch the sidecar first and only download the catalog when the
//! digest changed, so the sidecar holds nothing but the lowercase hex digest
//! of the exact catalog bytes.

use crate::error::DigestError;
use camino::Utf8Path;
use md5::{Digest, Md5};
use std::fmt;
use std::fs;
use std::io;

/// File name of the checksum sidecar.
pub const CHECKSUM_FILE_NAME: &str = "addons.xml.md5";

/// Expected length of a hex-encoded MD5 digest.
const DIGEST_HEX_LEN: usize = 32;

/// A validated, lowercase hex-encoded MD5 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Md5Digest(String);

impl Md5Digest {
    /// Compute the digest of `bytes`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kodi_repo_common::checksum::Md5Digest;
    ///
    /// let digest = Md5Digest::of(b"abc");
    /// assert_eq!(digest.as_str(), "900150983cd24fb0d6963f7d28e17f72");
    /// ```
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Md5::digest(bytes)))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Md5Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != DIGEST_HEX_LEN {
            return Err(DigestError {
                reason: format!(
                    "expected {DIGEST_HEX_LEN} hex characters, got {}",
                    value.len()
                ),
            });
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(DigestError {
                reason: format!("character '{bad}' is not lowercase hex"),
            });
        }
        Ok(Self(value.to_owned()))
    }
}

impl fmt::Display for Md5Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write `digest` to `path` with no trailing newline.
///
/// # Errors
///
/// Returns any I/O error from writing the file.
pub fn write_sidecar(path: &Utf8Path, digest: &Md5Digest) -> io::Result<()> {
    fs::write(path, digest.as_str())
}

/// True when `sidecar` holds the digest of `bytes`.
///
/// Surrounding whitespace in the sidecar is ignored so hand-edited files
/// with a trailing newline still verify.
#[must_use]
pub fn verify(bytes: &[u8], sidecar: &str) -> bool {
    Md5Digest::try_from(sidecar.trim()).is_ok_and(|expected| expected == Md5Digest::of(bytes))
}
