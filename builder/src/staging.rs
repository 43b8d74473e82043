//! Private staging area for one repository build.
//!
//! Each worker writes its archive and auxiliary files into a slot directory
//! keyed by its submission index. Once every worker has reported and ids are
//! known to be unique, each slot is promoted to `staging/{id}`. The pipeline
//! writes the catalog and checksum at the staging root. Nothing reaches the
//! target until every worker succeeded. The directory is removed when the
//! [`StagingArea`] drops, whatever the build outcome.

use crate::error::{ArchiveError, BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use kodi_repo_common::catalog::CATALOG_FILE_NAME;
use kodi_repo_common::checksum::CHECKSUM_FILE_NAME;
use kodi_repo_common::metadata::PackageId;
use std::fs;
use std::io;
use tempfile::TempDir;

const STAGING_DIR_PREFIX: &str = "repo-";

/// `@` is outside the add-on id alphabet, so slots never collide with
/// promoted package directories.
const SLOT_PREFIX: char = '@';

/// Scoped staging directory partitioned by add-on id.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
    root: Utf8PathBuf,
}

impl StagingArea {
    /// Create a fresh staging directory under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Staging`] if the directory cannot be created or
    /// its path is not UTF-8.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir()
            .map_err(|source| BuildError::Staging {
                path: Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().into_owned()),
                source,
            })?;
        let root = Utf8Path::from_path(dir.path())
            .ok_or_else(|| BuildError::Staging {
                path: Utf8PathBuf::from(dir.path().to_string_lossy().into_owned()),
                source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
            })?
            .to_owned();
        Ok(Self { dir, root })
    }

    /// Root of the staging directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory reserved for the add-on `id`.
    #[must_use]
    pub fn package_dir(&self, id: &PackageId) -> Utf8PathBuf {
        self.root.join(id.as_str())
    }

    /// Working directory of the worker at submission index `slot`.
    #[must_use]
    pub fn slot_dir(&self, slot: usize) -> Utf8PathBuf {
        self.root.join(format!("{SLOT_PREFIX}{slot}"))
    }

    /// Create the slot directory for the worker at submission index `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if the directory cannot be created,
    /// including when the slot was already taken.
    pub fn claim_slot(&self, slot: usize) -> std::result::Result<Utf8PathBuf, ArchiveError> {
        let dir = self.slot_dir(slot);
        fs::create_dir(&dir).map_err(|source| ArchiveError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Rename a worker's slot directory to `staging/{id}`.
    ///
    /// Callers must have checked that `id` is unique within the build.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Staging`] if the rename fails.
    pub fn promote(&self, slot_dir: &Utf8Path, id: &PackageId) -> Result<Utf8PathBuf> {
        let package_dir = self.package_dir(id);
        fs::rename(slot_dir, &package_dir).map_err(|source| BuildError::Staging {
            path: slot_dir.to_owned(),
            source,
        })?;
        Ok(package_dir)
    }

    /// Where the catalog is written before commit.
    #[must_use]
    pub fn catalog_path(&self) -> Utf8PathBuf {
        self.root.join(CATALOG_FILE_NAME)
    }

    /// Where the checksum sidecar is written before commit.
    #[must_use]
    pub fn checksum_path(&self) -> Utf8PathBuf {
        self.root.join(CHECKSUM_FILE_NAME)
    }

    /// Remove the staging directory now, reporting any failure.
    ///
    /// Dropping the area removes it too, silently.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Staging`] if removal fails.
    pub fn close(self) -> Result<()> {
        let root = self.root;
        self.dir
            .close()
            .map_err(|source| BuildError::Staging { path: root, source })
    }
}
