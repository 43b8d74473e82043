//! Behaviour-driven tests for the end-to-end repository build.
//!
//! Sources are served by `FixtureSource`, so these scenarios exercise the
//! orchestrator, catalog, checksum and publishing without network access.

#![expect(
    clippy::expect_used,
    reason = "step helpers panic with a short message on broken fixtures"
)]

use camino::Utf8PathBuf;
use kodi_repo::error::BuildError;
use kodi_repo::pipeline::{BuildSummary, PipelineContext, create_repository};
use kodi_repo::test_utils::{FixtureSource, write_addon_fixture};
use kodi_repo_common::checksum::verify;
use kodi_repo_common::locator::PackageLocator;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

struct RepositoryWorld {
    _temp_dir: TempDir,
    root: Utf8PathBuf,
    source: Option<FixtureSource>,
    result: Option<Result<BuildSummary, BuildError>>,
}

#[fixture]
fn world() -> RepositoryWorld {
    let temp_dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf-8 temp dir");
    RepositoryWorld {
        _temp_dir: temp_dir,
        root,
        source: Some(FixtureSource::new()),
        result: None,
    }
}

impl RepositoryWorld {
    fn target(&self) -> Utf8PathBuf {
        self.root.join("repo")
    }

    fn tree_for(&self, address: &str, suffix: &str) -> Utf8PathBuf {
        let slug: String = address
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.root.join("sources").join(slug).join(suffix)
    }

    fn update_source(&mut self, update: impl FnOnce(FixtureSource) -> FixtureSource) {
        let source = self.source.take().expect("source set");
        self.source = Some(update(source));
    }

    fn build(&mut self, inputs: &[&str]) {
        let locators: Vec<PackageLocator> = inputs
            .iter()
            .map(|input| PackageLocator::parse(input).expect("valid locator"))
            .collect();
        let target = self.target();
        let context = PipelineContext {
            target: &target,
            locators: &locators,
            quiet: true,
        };
        let source = self.source.as_ref().expect("source set");
        let mut stderr = Vec::new();
        self.result = Some(create_repository(&context, source, &mut stderr));
    }

    fn summary(&self) -> &BuildSummary {
        self.result
            .as_ref()
            .expect("build ran")
            .as_ref()
            .expect("build succeeded")
    }

    fn error(&self) -> &BuildError {
        self.result
            .as_ref()
            .expect("build ran")
            .as_ref()
            .expect_err("build failed")
    }

    fn catalog(&self) -> String {
        fs::read_to_string(self.target().join("addons.xml")).expect("catalog readable")
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("an add-on source \"{address}\" with id \"{id}\" and version \"{version}\"")]
fn given_source(world: &mut RepositoryWorld, address: String, id: String, version: String) {
    let tree = world.tree_for(&address, "default");
    write_addon_fixture(&tree, &id, &version, &[("changelog.txt", "initial")])
        .expect("fixture written");
    world.update_source(|source| source.with_repository(&address, &tree));
}

#[given(
    "ref \"{reference}\" of \"{address}\" holds id \"{id}\" version \"{version}\" under \"{subpath}\""
)]
fn given_reference(
    world: &mut RepositoryWorld,
    reference: String,
    address: String,
    id: String,
    version: String,
    subpath: String,
) {
    let tree = world.tree_for(&address, &reference);
    write_addon_fixture(&tree.join(&subpath), &id, &version, &[]).expect("fixture written");
    world.update_source(|source| source.with_reference(&address, &reference, &tree));
}

#[given("cloning \"{address}\" takes {millis:u64} milliseconds")]
fn given_delay(world: &mut RepositoryWorld, address: String, millis: u64) {
    world.update_source(|source| source.with_delay(&address, Duration::from_millis(millis)));
}

#[when("the repository is built from \"{first}\" and \"{second}\"")]
fn when_built_from_two(world: &mut RepositoryWorld, first: String, second: String) {
    world.build(&[first.as_str(), second.as_str()]);
}

#[when("the repository is built from the single locator \"{locator}\"")]
fn when_built_from_one(world: &mut RepositoryWorld, locator: String) {
    world.build(&[locator.as_str()]);
}

#[then("the build succeeds")]
fn then_succeeds(world: &mut RepositoryWorld) {
    let _ = world.summary();
}

#[then("the target contains \"{relative}\"")]
fn then_target_contains(world: &mut RepositoryWorld, relative: String) {
    let path = world.target().join(&relative);
    assert!(path.is_file(), "expected {path} to be published");
}

#[then("the checksum matches the catalog")]
fn then_checksum_matches(world: &mut RepositoryWorld) {
    let target = world.target();
    let catalog = fs::read(target.join("addons.xml")).expect("catalog readable");
    let sidecar = fs::read_to_string(target.join("addons.xml.md5")).expect("sidecar readable");
    assert!(verify(&catalog, &sidecar));
    assert_eq!(sidecar, world.summary().digest.as_str());
}

#[then("the catalog lists \"{first}\" before \"{second}\"")]
fn then_catalog_order(world: &mut RepositoryWorld, first: String, second: String) {
    let catalog = world.catalog();
    let first_at = catalog
        .find(&format!("id=\"{first}\""))
        .expect("first id listed");
    let second_at = catalog
        .find(&format!("id=\"{second}\""))
        .expect("second id listed");
    assert!(first_at < second_at);
}

#[then("the catalog includes \"{id}\"")]
fn then_catalog_lists(world: &mut RepositoryWorld, id: String) {
    assert!(world.catalog().contains(&format!("id=\"{id}\"")));
}

#[then("the build fails naming \"{address}\"")]
fn then_fails_naming(world: &mut RepositoryWorld, address: String) {
    let err = world.error();
    assert!(
        matches!(err, BuildError::Package { locator, .. } if locator.starts_with(&address)),
        "unexpected error: {err}"
    );
}

#[then("the error mentions \"{text}\"")]
fn then_error_mentions(world: &mut RepositoryWorld, text: String) {
    assert!(world.error().to_string().contains(&text));
}

#[then("the target directory does not exist")]
fn then_target_absent(world: &mut RepositoryWorld) {
    assert!(!world.target().exists());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/repository.feature",
    name = "Two add-ons are published with catalog and checksum"
)]
fn scenario_two_addons(world: RepositoryWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/repository.feature",
    name = "Catalog order follows submission order when workers finish in reverse"
)]
fn scenario_submission_order(world: RepositoryWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/repository.feature",
    name = "A failing add-on publishes nothing"
)]
fn scenario_failure_publishes_nothing(world: RepositoryWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/repository.feature",
    name = "An add-on at a ref inside a subdirectory"
)]
fn scenario_ref_and_subpath(world: RepositoryWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/repository.feature",
    name = "Two locators resolving to the same id are rejected"
)]
fn scenario_duplicate_ids(world: RepositoryWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/repository.feature",
    name = "The later locator is blamed for a duplicate id even when the earlier one finishes last"
)]
fn scenario_duplicate_ids_earlier_slow(world: RepositoryWorld) {
    let _ = world;
}
