//! kodi-repo builder library.
//!
//! Turns a list of add-on locators into a Kodi add-on repository: each
//! locator is cloned, validated and zipped by its own worker, and once every
//! worker has succeeded the archives, `addons.xml` and `addons.xml.md5` are
//! published to a target directory. Used by the `kodi-repo` binary and by
//! integration tests through the `test-support` feature.
//!
//! # Modules
//!
//! - [`archive`] - Zip archives and auxiliary files per add-on
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Repository manifest and resolved build settings
//! - [`error`] - Error types for every build stage
//! - [`fetch`] - Scoped clone and checkout of one locator
//! - [`git`] - Version-control capability and the `git` implementation
//! - [`logging`] - Diagnostic logging setup
//! - [`orchestrator`] - Concurrent workers with a join barrier
//! - [`output`] - Progress and dry-run text
//! - [`pipeline`] - End-to-end build and publish
//! - [`publish`] - Copying staged output into the target
//! - [`staging`] - Private staging area partitioned by add-on id

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod git;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod staging;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::{BuildError, Result};
