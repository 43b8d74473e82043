//! Copying a finished build from staging into the target repository.
//!
//! The committer only runs once every package has been staged and the
//! catalog and checksum exist. Files are copied one at a time and a failure
//! stops the copy; files already copied stay where they are.

use crate::archive::AUXILIARY_FILES;
use crate::error::PublishError;
use crate::orchestrator::BuiltPackage;
use crate::staging::StagingArea;
use camino::{Utf8Path, Utf8PathBuf};
use kodi_repo_common::catalog::CATALOG_FILE_NAME;
use kodi_repo_common::checksum::CHECKSUM_FILE_NAME;
use log::{debug, info};
use std::fs;

const WRITE_PROBE_NAME: &str = ".kodi-repo-write-test";

/// Summary of a completed commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Every file written under the target, in copy order.
    pub files: Vec<Utf8PathBuf>,
    /// Number of packages published.
    pub packages: usize,
}

/// Copies staged artefacts into the target directory.
#[derive(Debug)]
pub struct OutputCommitter {
    target: Utf8PathBuf,
}

impl OutputCommitter {
    /// Create a committer for `target`.
    #[must_use]
    pub fn new(target: Utf8PathBuf) -> Self {
        Self { target }
    }

    /// The target directory.
    #[must_use]
    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// Create the target (and its parents) and check it is writable.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::TargetNotWritable`] if the directory cannot be
    /// created or a probe file cannot be written.
    pub fn prepare(&self) -> Result<(), PublishError> {
        let not_writable = |reason: String| PublishError::TargetNotWritable {
            path: self.target.clone(),
            reason,
        };

        fs::create_dir_all(&self.target).map_err(|e| not_writable(e.to_string()))?;

        let probe = self.target.join(WRITE_PROBE_NAME);
        match fs::write(&probe, b"probe") {
            Ok(()) => {
                let _ = fs::remove_file(&probe);
                Ok(())
            }
            Err(e) => Err(not_writable(e.to_string())),
        }
    }

    /// Copy the catalog, the checksum and every package into the target.
    ///
    /// For each package, `target/{id}` is created and receives its present
    /// auxiliary files followed by its archive.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::CreateDir`] or [`PublishError::Copy`] for the
    /// first operation that fails.
    pub fn commit(
        &self,
        staging: &StagingArea,
        packages: &[BuiltPackage],
    ) -> Result<PublishReport, PublishError> {
        let mut report = PublishReport::default();

        copy_file(
            &staging.catalog_path(),
            &self.target.join(CATALOG_FILE_NAME),
            &mut report,
        )?;
        copy_file(
            &staging.checksum_path(),
            &self.target.join(CHECKSUM_FILE_NAME),
            &mut report,
        )?;

        for package in packages {
            self.commit_package(package, &mut report)?;
            report.packages += 1;
        }

        info!(
            "published {} package(s) and {} file(s) to {}",
            report.packages,
            report.files.len(),
            self.target
        );
        Ok(report)
    }

    fn commit_package(
        &self,
        package: &BuiltPackage,
        report: &mut PublishReport,
    ) -> Result<(), PublishError> {
        let artefacts = &package.artefacts;
        let package_dir = self.target.join(artefacts.id.as_str());
        fs::create_dir_all(&package_dir).map_err(|source| PublishError::CreateDir {
            path: package_dir.clone(),
            source,
        })?;

        for name in AUXILIARY_FILES {
            let staged = artefacts.package_dir.join(name);
            if artefacts.auxiliary_files.contains(&staged) {
                copy_file(&staged, &package_dir.join(name), report)?;
            }
        }

        if let Some(archive_name) = artefacts.archive_path.file_name() {
            copy_file(
                &artefacts.archive_path,
                &package_dir.join(archive_name),
                report,
            )?;
        }
        Ok(())
    }
}

fn copy_file(
    from: &Utf8Path,
    to: &Utf8Path,
    report: &mut PublishReport,
) -> Result<(), PublishError> {
    debug!("copying {from} to {to}");
    fs::copy(from, to).map_err(|source| PublishError::Copy {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    })?;
    report.files.push(to.to_owned());
    Ok(())
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
