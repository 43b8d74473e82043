//! Error types for the repository build.
//!
//! Each pipeline stage has its own enum so a worker can record exactly what
//! went wrong; [`BuildError`] is the single error the CLI reports.

use camino::Utf8PathBuf;
use kodi_repo_common::error::{LocatorParseError, ValidationError};
use kodi_repo_common::metadata::PackageId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while obtaining a working tree from version control.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A git command exited unsuccessfully.
    #[error("git {operation} of {address} failed: {message}")]
    Git {
        /// The git operation that failed (clone, checkout).
        operation: &'static str,
        /// The repository address being fetched.
        address: String,
        /// Trimmed stderr of the command.
        message: String,
    },

    /// A git command did not finish within the configured timeout.
    #[error("git {operation} of {address} timed out after {seconds} seconds")]
    Timeout {
        /// The git operation that timed out.
        operation: &'static str,
        /// The repository address being fetched.
        address: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// The git executable could not be started.
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// The locator's subpath does not exist in the checked-out tree.
    #[error("subpath {subpath} not found in {address}")]
    MissingSubpath {
        /// The repository address.
        address: String,
        /// The subpath that was expected.
        subpath: Utf8PathBuf,
    },

    /// The scoped clone directory could not be created.
    #[error("failed to create clone directory: {0}")]
    TempDir(#[source] std::io::Error),

    /// A filesystem path was not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },
}

/// Failures while archiving a package or copying its auxiliary files.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The path being read or written.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Walking the working tree failed.
    #[error("failed to walk working tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// The zip writer rejected an entry.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An earlier locator in submission order resolved to the same id.
    #[error("duplicate add-on id {id}: already built from {first}")]
    DuplicatePackageId {
        /// The contested id.
        id: PackageId,
        /// The earlier locator that keeps the id.
        first: String,
    },

    /// A filesystem path was not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },
}

/// Any failure inside one package worker.
#[derive(Debug, Error)]
pub enum PackageError {
    /// Fetching the source failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The descriptor was missing or invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Archiving or staging failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The worker thread could not be started.
    #[error("failed to start worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Failures of the orchestration itself rather than of a package.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A worker terminated without producing an outcome.
    #[error("worker for {locator} did not report a result")]
    WorkerDidNotReport {
        /// The locator the worker was processing.
        locator: String,
    },
}

/// Failures while copying artefacts into the target repository.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The target directory could not be created or written to.
    #[error("target directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// The target directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Copying one artefact failed.
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        /// Source path in staging.
        from: Utf8PathBuf,
        /// Destination path in the target.
        to: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Creating a per-package directory failed.
    #[error("failed to create {path}: {source}")]
    CreateDir {
        /// The directory being created.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Failures while loading the repository manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file could not be read.
    #[error("cannot read manifest {path}: {source}")]
    Read {
        /// Path of the manifest.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or has unknown keys.
    #[error("invalid manifest {path}: {source}")]
    Parse {
        /// Path of the manifest.
        path: Utf8PathBuf,
        /// The deserialization error.
        #[source]
        source: toml::de::Error,
    },
}

/// The single error reported for a failed repository build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A locator string could not be parsed.
    #[error(transparent)]
    Locator(#[from] LocatorParseError),

    /// The manifest could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The first failing package, in submission order.
    #[error("{locator}: {source}")]
    Package {
        /// The locator of the failing package.
        locator: String,
        /// What went wrong in its worker.
        #[source]
        source: PackageError,
    },

    /// The orchestration itself broke down.
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    /// Staging area creation or catalog writing failed.
    #[error("staging failed at {path}: {source}")]
    Staging {
        /// The staging path involved.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Publishing into the target failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Result type alias using [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;
