//! Repository manifest and resolved build settings.
//!
//! A manifest is an optional TOML file naming the add-ons of a repository:
//!
//! ```toml
//! git_timeout_secs = 120
//! addons = [
//!   "https://github.com/org/plugin.video.x.git#v1.2.0:plugin.video.x",
//! ]
//! ```
//!
//! [`BuildSettings::resolve`] merges it with the command line. Manifest
//! add-ons are submitted first, in file order, followed by `--addon` flags.

use crate::cli::Cli;
use crate::error::{ConfigError, Result};
use crate::git::DEFAULT_GIT_TIMEOUT;
use camino::{Utf8Path, Utf8PathBuf};
use kodi_repo_common::locator::PackageLocator;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Contents of a repository manifest file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryManifest {
    /// Add-on locators in submission order.
    pub addons: Vec<String>,
    /// Per-operation git timeout in seconds.
    pub git_timeout_secs: Option<u64>,
}

impl RepositoryManifest {
    /// Parse manifest text; `path` is only used in the error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys.
    pub fn parse(path: &Utf8Path, source: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// Read and parse the manifest at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read, or
/// [`ConfigError::Parse`] if it is not a valid manifest.
pub fn load_manifest(path: &Utf8Path) -> std::result::Result<RepositoryManifest, ConfigError> {
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    RepositoryManifest::parse(path, &source)
}

/// Everything a build needs, resolved from the CLI and manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildSettings {
    /// Directory the repository is written to.
    pub target: Utf8PathBuf,
    /// Parsed locators in submission order.
    pub locators: Vec<PackageLocator>,
    /// Per-operation git timeout.
    pub git_timeout: Duration,
    /// Only print the plan.
    pub dry_run: bool,
    /// Suppress progress output.
    pub quiet: bool,
    /// Log verbosity from `-v` flags.
    pub verbosity: u8,
}

impl BuildSettings {
    /// Resolve settings from parsed arguments, loading the manifest if one
    /// was given.
    ///
    /// The git timeout is `--git-timeout`, else the manifest's
    /// `git_timeout_secs`, else five minutes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BuildError::Config`] if the manifest cannot be
    /// loaded and [`crate::error::BuildError::Locator`] for the first locator
    /// that does not parse.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let manifest = match &cli.manifest {
            Some(path) => load_manifest(path)?,
            None => RepositoryManifest::default(),
        };

        let locators = manifest
            .addons
            .iter()
            .chain(&cli.addon)
            .map(|input| PackageLocator::parse(input))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let git_timeout = cli
            .git_timeout
            .or(manifest.git_timeout_secs)
            .map_or(DEFAULT_GIT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            target: cli.target.clone(),
            locators,
            git_timeout,
            dry_run: cli.dry_run,
            quiet: cli.quiet,
            verbosity: cli.verbosity,
        })
    }
}
