//! End-to-end repository build.
//!
//! Stages run strictly in order: every locator is built concurrently into a
//! private staging area; only if all of them succeed are the catalog and its
//! checksum written and everything copied into the target. Staging is
//! removed whatever the outcome.

use crate::error::{BuildError, Result};
use crate::git::SourceControl;
use crate::orchestrator::{BuiltPackage, WorkerOrchestrator};
use crate::output::{success_message, write_stderr_line};
use crate::publish::{OutputCommitter, PublishReport};
use crate::staging::StagingArea;
use camino::Utf8Path;
use kodi_repo_common::catalog::Catalog;
use kodi_repo_common::checksum::{Md5Digest, write_sidecar};
use kodi_repo_common::locator::PackageLocator;
use log::{info, warn};
use std::fs;
use std::io::Write;

/// Context for a repository build.
pub struct PipelineContext<'a> {
    /// Directory the repository is written to.
    pub target: &'a Utf8Path,
    /// Locators in submission order.
    pub locators: &'a [PackageLocator],
    /// Suppress progress output.
    pub quiet: bool,
}

/// What a successful build produced.
#[derive(Debug)]
pub struct BuildSummary {
    /// Published packages in submission order.
    pub packages: Vec<BuiltPackage>,
    /// Digest of the published catalog.
    pub digest: Md5Digest,
    /// Files written to the target.
    pub report: PublishReport,
}

/// Build every locator and publish the repository to `context.target`.
///
/// Prints progress to stderr if not in quiet mode.
///
/// # Errors
///
/// Returns the first package failure in submission order, or any staging or
/// publishing error. On a package failure nothing is written to the target.
pub fn create_repository(
    context: &PipelineContext<'_>,
    source_control: &dyn SourceControl,
    stderr: &mut dyn Write,
) -> Result<BuildSummary> {
    if !context.quiet {
        write_stderr_line(
            stderr,
            format!("Building {} add-on(s)...", context.locators.len()),
        );
        for locator in context.locators {
            write_stderr_line(stderr, format!("  - {locator}"));
        }
    }

    let staging = StagingArea::create()?;
    let packages = WorkerOrchestrator::new(source_control, &staging).run(context.locators)?;
    let digest = write_catalog(&staging, &packages)?;

    if !context.quiet {
        write_stderr_line(stderr, format!("Publishing to {}...", context.target));
    }

    let committer = OutputCommitter::new(context.target.to_owned());
    committer.prepare()?;
    let report = committer.commit(&staging, &packages)?;

    if let Err(e) = staging.close() {
        warn!("{e}");
    }

    if !context.quiet {
        write_stderr_line(stderr, "");
        write_stderr_line(stderr, success_message(packages.len(), context.target));
    }

    Ok(BuildSummary {
        packages,
        digest,
        report,
    })
}

/// Write `addons.xml` and `addons.xml.md5` into staging.
fn write_catalog(staging: &StagingArea, packages: &[BuiltPackage]) -> Result<Md5Digest> {
    let catalog = Catalog::from_metadata(packages.iter().map(|package| &package.metadata));
    let bytes = catalog.to_bytes();

    let catalog_path = staging.catalog_path();
    fs::write(&catalog_path, &bytes).map_err(|source| BuildError::Staging {
        path: catalog_path,
        source,
    })?;

    let digest = Md5Digest::of(&bytes);
    let checksum_path = staging.checksum_path();
    write_sidecar(&checksum_path, &digest).map_err(|source| BuildError::Staging {
        path: checksum_path,
        source,
    })?;

    info!("catalog lists {} add-on(s), md5 {digest}", catalog.len());
    Ok(digest)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
