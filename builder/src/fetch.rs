//! Fetching one add-on source tree.
//!
//! [`SourceFetcher::fetch`] clones a locator's address into a private
//! temporary directory, checks out its ref, and hands back a
//! [`FetchedSource`]. The clone directory lives exactly as long as the
//! `FetchedSource`: it is removed when the value drops, including on every
//! error path inside `fetch`.

use crate::archive::{ArchiveSummary, create_zip_archive};
use crate::error::{ArchiveError, FetchError};
use crate::git::SourceControl;
use camino::{Utf8Path, Utf8PathBuf};
use kodi_repo_common::locator::{DEFAULT_SUBPATH, PackageLocator};
use log::debug;
use tempfile::TempDir;

/// Prefix for scoped clone directories.
const CLONE_DIR_PREFIX: &str = "repo-";

/// Fetches add-on sources through a [`SourceControl`] capability.
pub struct SourceFetcher<'a> {
    source_control: &'a dyn SourceControl,
}

impl<'a> SourceFetcher<'a> {
    /// Create a fetcher using `source_control` for clone and checkout.
    #[must_use]
    pub fn new(source_control: &'a dyn SourceControl) -> Self {
        Self { source_control }
    }

    /// Clone and check out the source named by `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the clone directory cannot be created, clone
    /// or checkout fails, or the subpath does not exist.
    pub fn fetch(&self, locator: &PackageLocator) -> Result<FetchedSource, FetchError> {
        let clone_dir = tempfile::Builder::new()
            .prefix(CLONE_DIR_PREFIX)
            .tempdir()
            .map_err(FetchError::TempDir)?;
        let clone_root = Utf8PathBuf::try_from(clone_dir.path().to_path_buf()).map_err(|e| {
            FetchError::NonUtf8Path {
                path: e.into_path_buf(),
            }
        })?;

        debug!("cloning {} into {clone_root}", locator.address());
        self.source_control
            .clone_repository(locator.address(), &clone_root)?;

        if let Some(reference) = locator.reference() {
            debug!("checking out {reference} in {clone_root}");
            self.source_control.checkout(&clone_root, reference)?;
        }

        let working_tree = match locator.subpath().as_str() {
            DEFAULT_SUBPATH => clone_root,
            subpath => clone_root.join(subpath),
        };
        if !working_tree.is_dir() {
            return Err(FetchError::MissingSubpath {
                address: locator.address().to_owned(),
                subpath: locator.subpath().to_owned(),
            });
        }

        Ok(FetchedSource {
            _clone_dir: clone_dir,
            working_tree,
        })
    }
}

/// A checked-out add-on tree backed by a scoped clone directory.
#[derive(Debug)]
pub struct FetchedSource {
    // Dropping this removes the clone.
    _clone_dir: TempDir,
    working_tree: Utf8PathBuf,
}

impl FetchedSource {
    /// Root of the add-on inside the clone (`clone_dir/subpath`).
    #[must_use]
    pub fn working_tree(&self) -> &Utf8Path {
        &self.working_tree
    }

    /// Write a zip of the working tree to `output`, every entry rooted under
    /// `prefix/`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the tree cannot be read or the archive
    /// cannot be written.
    pub fn archive_subtree(
        &self,
        prefix: &str,
        output: &Utf8Path,
    ) -> Result<ArchiveSummary, ArchiveError> {
        create_zip_archive(&self.working_tree, prefix, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockSourceControl;
    use std::fs;
    use std::sync::{Arc, Mutex};

    fn locator(input: &str) -> PackageLocator {
        PackageLocator::parse(input).expect("valid locator")
    }

    #[test]
    fn fetch_returns_subpath_of_clone() {
        let mut source_control = MockSourceControl::new();
        source_control
            .expect_clone_repository()
            .withf(|address, _| address == "https://host/r.git")
            .times(1)
            .returning(|_, destination| {
                fs::create_dir_all(destination.join("plugin.x")).expect("create subpath");
                Ok(())
            });
        source_control.expect_checkout().never();

        let fetched = SourceFetcher::new(&source_control)
            .fetch(&locator("https://host/r.git:plugin.x"))
            .expect("fetch succeeds");

        assert!(fetched.working_tree().ends_with("plugin.x"));
        assert!(fetched.working_tree().is_dir());
    }

    #[test]
    fn fetch_checks_out_reference_inside_clone() {
        let cloned_into = Arc::new(Mutex::new(None));
        let recorded = Arc::clone(&cloned_into);

        let mut source_control = MockSourceControl::new();
        source_control
            .expect_clone_repository()
            .returning(move |_, destination| {
                *recorded.lock().expect("lock") = Some(destination.to_owned());
                Ok(())
            });
        let expected_clone = Arc::clone(&cloned_into);
        source_control
            .expect_checkout()
            .withf(move |repository, reference| {
                reference == "rel-1.0"
                    && expected_clone.lock().expect("lock").as_deref() == Some(repository)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        SourceFetcher::new(&source_control)
            .fetch(&locator("https://host/r.git#rel-1.0"))
            .expect("fetch succeeds");
    }

    #[test]
    fn clone_directory_is_removed_when_source_drops() {
        let mut source_control = MockSourceControl::new();
        source_control
            .expect_clone_repository()
            .returning(|_, _| Ok(()));

        let fetched = SourceFetcher::new(&source_control)
            .fetch(&locator("https://host/r.git"))
            .expect("fetch succeeds");
        let clone_root = fetched.working_tree().to_owned();
        assert!(clone_root.exists());

        drop(fetched);
        assert!(!clone_root.exists());
    }

    #[test]
    fn clone_directory_is_removed_on_checkout_failure() {
        let cloned_into = Arc::new(Mutex::new(None));
        let recorded = Arc::clone(&cloned_into);

        let mut source_control = MockSourceControl::new();
        source_control
            .expect_clone_repository()
            .returning(move |_, destination| {
                *recorded.lock().expect("lock") = Some(destination.to_owned());
                Ok(())
            });
        source_control.expect_checkout().returning(|_, reference| {
            Err(FetchError::Git {
                operation: "checkout",
                address: "https://host/r.git".to_owned(),
                message: format!("pathspec '{reference}' did not match"),
            })
        });

        let err = SourceFetcher::new(&source_control)
            .fetch(&locator("https://host/r.git#nope"))
            .expect_err("checkout fails");
        assert!(matches!(err, FetchError::Git { operation: "checkout", .. }));

        let clone_root: Utf8PathBuf = cloned_into
            .lock()
            .expect("lock")
            .clone()
            .expect("clone was attempted");
        assert!(!clone_root.exists());
    }

    #[test]
    fn missing_subpath_is_reported() {
        let mut source_control = MockSourceControl::new();
        source_control
            .expect_clone_repository()
            .returning(|_, _| Ok(()));

        let err = SourceFetcher::new(&source_control)
            .fetch(&locator("https://host/r.git:plugin.absent"))
            .expect_err("subpath missing");
        assert!(matches!(err, FetchError::MissingSubpath { ref subpath, .. }
            if subpath == "plugin.absent"));
    }

    #[test]
    fn clone_failure_propagates() {
        let mut source_control = MockSourceControl::new();
        source_control.expect_clone_repository().returning(|address, _| {
            Err(FetchError::Git {
                operation: "clone",
                address: address.to_owned(),
                message: "not found".to_owned(),
            })
        });

        let err = SourceFetcher::new(&source_control)
            .fetch(&locator("https://host/gone.git"))
            .expect_err("clone fails");
        assert!(err.to_string().contains("https://host/gone.git"));
    }
}
