//! Shared test utilities for the builder crate.
//!
//! [`FixtureSource`] stands in for git: "cloning" an address copies a local
//! directory tree into the clone destination, and checking out a ref swaps
//! in the tree registered for that ref. Failures and per-address delays can
//! be injected to exercise the orchestrator.

use crate::error::FetchError;
use crate::git::SourceControl;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

#[derive(Debug, Default)]
struct FixtureRepository {
    default_tree: Option<Utf8PathBuf>,
    references: HashMap<String, Utf8PathBuf>,
}

/// A [`SourceControl`] backed by local directories.
#[derive(Debug, Default)]
pub struct FixtureSource {
    repositories: HashMap<String, FixtureRepository>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    clones: Mutex<HashMap<Utf8PathBuf, String>>,
}

impl FixtureSource {
    /// Create a source with no repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `tree` when `address` is cloned.
    #[must_use]
    pub fn with_repository(mut self, address: &str, tree: &Utf8Path) -> Self {
        self.repositories
            .entry(address.to_owned())
            .or_default()
            .default_tree = Some(tree.to_owned());
        self
    }

    /// Serve `tree` when `reference` is checked out in a clone of `address`.
    #[must_use]
    pub fn with_reference(mut self, address: &str, reference: &str, tree: &Utf8Path) -> Self {
        self.repositories
            .entry(address.to_owned())
            .or_default()
            .references
            .insert(reference.to_owned(), tree.to_owned());
        self
    }

    /// Make every clone of `address` fail with `message`.
    #[must_use]
    pub fn with_failure(mut self, address: &str, message: &str) -> Self {
        self.failures
            .insert(address.to_owned(), message.to_owned());
        self
    }

    /// Sleep for `delay` before cloning `address`.
    #[must_use]
    pub fn with_delay(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_owned(), delay);
        self
    }

    fn clone_failure(address: &str, message: impl Into<String>) -> FetchError {
        FetchError::Git {
            operation: "clone",
            address: address.to_owned(),
            message: message.into(),
        }
    }
}

impl SourceControl for FixtureSource {
    fn clone_repository(&self, address: &str, destination: &Utf8Path) -> Result<(), FetchError> {
        if let Some(delay) = self.delays.get(address) {
            thread::sleep(*delay);
        }
        if let Some(message) = self.failures.get(address) {
            return Err(Self::clone_failure(address, message.as_str()));
        }
        let tree = self
            .repositories
            .get(address)
            .and_then(|repository| repository.default_tree.as_deref())
            .ok_or_else(|| Self::clone_failure(address, "repository not found"))?;

        copy_tree(tree, destination)
            .map_err(|e| Self::clone_failure(address, e.to_string()))?;
        self.clones
            .lock()
            .map_err(|_| Self::clone_failure(address, "fixture state poisoned"))?
            .insert(destination.to_owned(), address.to_owned());
        Ok(())
    }

    fn checkout(&self, repository: &Utf8Path, reference: &str) -> Result<(), FetchError> {
        let checkout_failure = |message: String| FetchError::Git {
            operation: "checkout",
            address: repository.to_string(),
            message,
        };
        let address = self
            .clones
            .lock()
            .map_err(|_| checkout_failure("fixture state poisoned".to_owned()))?
            .get(repository)
            .cloned()
            .ok_or_else(|| checkout_failure("not a fixture clone".to_owned()))?;
        let tree = self
            .repositories
            .get(&address)
            .and_then(|fixture| fixture.references.get(reference))
            .ok_or_else(|| {
                checkout_failure(format!(
                    "pathspec '{reference}' did not match any file(s) known to git"
                ))
            })?;

        clear_dir(repository).map_err(|e| checkout_failure(e.to_string()))?;
        copy_tree(tree, repository).map_err(|e| checkout_failure(e.to_string()))
    }
}

/// Write a minimal add-on tree under `dir`: an `addon.xml` with `id` and
/// `version`, plus each `(relative path, contents)` pair in `extras`.
///
/// # Errors
///
/// Returns any I/O error from creating the files.
pub fn write_addon_fixture(
    dir: &Utf8Path,
    id: &str,
    version: &str,
    extras: &[(&str, &str)],
) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(
        dir.join("addon.xml"),
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<addon id=\"{id}\" version=\"{version}\" name=\"{id}\" provider-name=\"fixtures\">\n",
                "  <extension point=\"xbmc.addon.metadata\"/>\n",
                "</addon>\n"
            ),
            id = id,
            version = version
        ),
    )?;
    for (relative, contents) in extras {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }
    Ok(())
}

fn copy_tree(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.as_std_path().join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn clear_dir(dir: &Utf8Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
