//! Concurrent fetch, validate and archive of every submitted locator.
//!
//! One scoped thread runs per locator and all of them are started before any
//! is joined. Each thread's join handle carries that worker's single
//! [`WorkerOutcome`] back to the orchestrator, so no shared state is needed.
//! Outcomes are only inspected once every worker has finished, and then in
//! submission order: the first failure is the build's error and every
//! success is discarded with it. A locator whose id was already produced by
//! an earlier locator counts as a failure at its own position.
//!
//! Workers stage into slots keyed by submission index, so nothing they write
//! depends on which of them finished first. Slots are promoted to
//! `staging/{id}` only after the whole build has settled.

use crate::archive::{PackageArtefacts, build_package};
use crate::error::{ArchiveError, BuildError, OrchestrationError, PackageError, Result};
use crate::fetch::SourceFetcher;
use crate::git::SourceControl;
use crate::staging::StagingArea;
use kodi_repo_common::locator::PackageLocator;
use kodi_repo_common::metadata::{PackageId, PackageMetadata, read_metadata};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::thread;

/// Lifecycle of one package worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStage {
    /// Created, not yet started.
    Pending,
    /// Cloning and checking out the source.
    Fetching,
    /// Reading and validating `addon.xml`.
    Validating,
    /// Writing the archive and auxiliary files into staging.
    Archiving,
    /// All stages completed.
    Succeeded,
    /// A stage failed.
    Failed,
}

impl fmt::Display for WorkerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Validating => "validating",
            Self::Archiving => "archiving",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A package that made it through every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPackage {
    /// The locator the package was built from.
    pub locator: PackageLocator,
    /// Validated descriptor fields.
    pub metadata: PackageMetadata,
    /// Files written to staging.
    pub artefacts: PackageArtefacts,
}

/// The single value each worker reports.
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The package was staged.
    Success(BuiltPackage),
    /// The worker stopped at the stage that failed.
    Failure(PackageError),
}

/// Runs one worker per locator against a shared staging area.
pub struct WorkerOrchestrator<'a> {
    source_control: &'a dyn SourceControl,
    staging: &'a StagingArea,
}

impl<'a> WorkerOrchestrator<'a> {
    /// Create an orchestrator fetching through `source_control` and writing
    /// into `staging`.
    #[must_use]
    pub fn new(source_control: &'a dyn SourceControl, staging: &'a StagingArea) -> Self {
        Self {
            source_control,
            staging,
        }
    }

    /// Build every locator concurrently and return the packages in
    /// submission order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Package`] for the first failing locator in
    /// submission order, [`BuildError::Orchestration`] if a worker ended
    /// without reporting, or [`BuildError::Staging`] if a slot cannot be
    /// promoted.
    pub fn run(&self, locators: &[PackageLocator]) -> Result<Vec<BuiltPackage>> {
        let outcomes = self.run_workers(locators);
        settle(locators, outcomes)?
            .into_iter()
            .map(|package| self.promote(package))
            .collect()
    }

    /// Move a settled package from its slot to `staging/{id}`.
    fn promote(&self, package: BuiltPackage) -> Result<BuiltPackage> {
        let BuiltPackage {
            locator,
            metadata,
            artefacts,
        } = package;
        let package_dir = self.staging.promote(&artefacts.package_dir, &metadata.id)?;
        Ok(BuiltPackage {
            locator,
            metadata,
            artefacts: artefacts.relocate(package_dir),
        })
    }

    /// Spawn every worker, then join every worker.
    ///
    /// A `None` slot means the worker panicked before reporting.
    fn run_workers(&self, locators: &[PackageLocator]) -> Vec<Option<WorkerOutcome>> {
        thread::scope(|scope| {
            let handles: Vec<_> = locators
                .iter()
                .enumerate()
                .map(|(index, locator)| {
                    thread::Builder::new()
                        .name(format!("package-{index}"))
                        .spawn_scoped(scope, move || self.process(index, locator))
                })
                .collect();

            handles
                .into_iter()
                .map(|spawned| match spawned {
                    Ok(handle) => handle.join().ok(),
                    Err(e) => Some(WorkerOutcome::Failure(PackageError::Spawn(e))),
                })
                .collect()
        })
    }

    fn process(&self, slot: usize, locator: &PackageLocator) -> WorkerOutcome {
        let mut stage = StageTracker::new(locator);
        match self.build(slot, locator, &mut stage) {
            Ok(package) => {
                stage.advance(WorkerStage::Succeeded);
                WorkerOutcome::Success(package)
            }
            Err(e) => {
                debug!("{locator}: {} failed: {e}", stage.current);
                stage.advance(WorkerStage::Failed);
                WorkerOutcome::Failure(e)
            }
        }
    }

    fn build(
        &self,
        slot: usize,
        locator: &PackageLocator,
        stage: &mut StageTracker<'_>,
    ) -> std::result::Result<BuiltPackage, PackageError> {
        stage.advance(WorkerStage::Fetching);
        let source = SourceFetcher::new(self.source_control).fetch(locator)?;

        stage.advance(WorkerStage::Validating);
        let metadata = read_metadata(source.working_tree())?;

        stage.advance(WorkerStage::Archiving);
        let artefacts = build_package(&source, &metadata, self.staging, slot)?;

        Ok(BuiltPackage {
            locator: locator.clone(),
            metadata,
            artefacts,
        })
    }
}

struct StageTracker<'a> {
    locator: &'a PackageLocator,
    current: WorkerStage,
}

impl<'a> StageTracker<'a> {
    fn new(locator: &'a PackageLocator) -> Self {
        Self {
            locator,
            current: WorkerStage::Pending,
        }
    }

    fn advance(&mut self, next: WorkerStage) {
        debug!("{}: {} -> {next}", self.locator, self.current);
        self.current = next;
    }
}

/// Turn joined outcomes into the build result.
///
/// `outcomes[i]` belongs to `locators[i]`; missing trailing slots count as
/// workers that never reported.
///
/// # Errors
///
/// Returns the first failure in submission order as
/// [`BuildError::Package`], or [`OrchestrationError::WorkerDidNotReport`]
/// for the first empty slot reached before any failure. A success whose id
/// an earlier locator already produced fails with
/// [`ArchiveError::DuplicatePackageId`] at its own position.
pub fn settle(
    locators: &[PackageLocator],
    outcomes: Vec<Option<WorkerOutcome>>,
) -> Result<Vec<BuiltPackage>> {
    let mut built = Vec::with_capacity(locators.len());
    let mut claimed: HashMap<PackageId, &PackageLocator> = HashMap::new();
    let slots = outcomes.into_iter().chain(iter::repeat_with(|| None));

    for (locator, outcome) in locators.iter().zip(slots) {
        match outcome {
            Some(WorkerOutcome::Success(package)) => {
                if let Some(first) = claimed.get(&package.metadata.id) {
                    return Err(BuildError::Package {
                        locator: locator.to_string(),
                        source: PackageError::Archive(ArchiveError::DuplicatePackageId {
                            id: package.metadata.id,
                            first: first.to_string(),
                        }),
                    });
                }
                claimed.insert(package.metadata.id.clone(), locator);
                built.push(package);
            }
            Some(WorkerOutcome::Failure(source)) => {
                return Err(BuildError::Package {
                    locator: locator.to_string(),
                    source,
                });
            }
            None => {
                return Err(OrchestrationError::WorkerDidNotReport {
                    locator: locator.to_string(),
                }
                .into());
            }
        }
    }
    Ok(built)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
