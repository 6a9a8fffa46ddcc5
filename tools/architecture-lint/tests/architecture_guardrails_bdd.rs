//! Behaviour tests for the architecture guardrails.

use std::sync::Mutex;

use architecture_lint::{ArchitectureLintError, LintSource, Violation};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

const VALID_REGISTRY: &str = "pub enum Entity { Bookmark } pub struct EntityDef;";
const VALID_FILTER: &str =
    "use crate::registry::Entity; use crate::walk::Walker; pub fn parse(_: Entity, _: Walker) {}";
const VALID_PAYLOAD: &str = concat!(
    "use crate::filter::parse; use crate::projection::reject_unknown_arguments; ",
    "fn create() { let payload = 1; let _ = payload; }"
);
const VALID_VALIDATOR: &str =
    "use crate::delete::DeletePlan; use crate::payload::CreatePayload; pub struct QueryValidator;";

#[derive(Debug, Default)]
struct LintWorld {
    sources: Vec<LintSource>,
    result: Option<Result<(), ArchitectureLintError>>,
}

#[fixture]
fn world() -> Mutex<LintWorld> {
    Mutex::new(LintWorld::default())
}

fn add_source(world: &Mutex<LintWorld>, file: &str, contents: &str) {
    let mut world = world.lock().expect("world lock");
    world.sources.push(LintSource {
        file: Utf8PathBuf::from(file),
        contents: contents.to_owned(),
    });
}

#[given("a filter module that imports the payload layer")]
fn filter_imports_payload(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "filter/relation.rs",
        "use crate::payload::nested::parse_relation_write; fn f() { parse_relation_write(); }",
    );
}

#[given("a registry module that imports the walker")]
fn registry_imports_walker(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "registry/catalogue.rs",
        "use crate::walk::Walker; pub fn describe(_: &Walker) {}",
    );
}

#[given("a projection module that imports the configuration loader")]
fn projection_imports_config(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "projection/pagination.rs",
        "use ortho_config::OrthoConfig; #[derive(OrthoConfig)] struct PageSize;",
    );
}

#[given("a delete module that reads a file")]
fn delete_reads_a_file(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "delete.rs",
        "use std::fs; fn plan() { let _ = fs::read_to_string(\"cascade.json\"); }",
    );
}

#[given("valid registry, filter, payload and validator modules")]
fn valid_modules(world: &Mutex<LintWorld>) {
    add_valid_modules(world);
}

#[given("valid modules mixed with multiple boundary violations")]
fn valid_modules_with_multiple_violations(world: &Mutex<LintWorld>) {
    add_valid_modules(world);
    add_source(
        world,
        "filter/bad_cross_layer.rs",
        "use query_schema::validator::QueryValidator; fn f(_: QueryValidator) {}",
    );
    add_source(
        world,
        "value.rs",
        "use tracing_subscriber::fmt; fn init() { let _ = fmt(); }",
    );
}

fn add_valid_modules(world: &Mutex<LintWorld>) {
    add_source(world, "registry/mod.rs", VALID_REGISTRY);
    add_source(world, "filter/mod.rs", VALID_FILTER);
    add_source(world, "payload/create.rs", VALID_PAYLOAD);
    add_source(world, "validator.rs", VALID_VALIDATOR);
}

#[when("the architecture lint runs")]
fn run_architecture_lint(world: &Mutex<LintWorld>) {
    let sources = {
        let world = world.lock().expect("world lock");
        world.sources.clone()
    };

    let temp_dir = TempDir::new().expect("tempdir");
    let crate_dir =
        Utf8PathBuf::from_path_buf(temp_dir.path().join("query-schema")).expect("utf-8 path");
    let root = Dir::open_ambient_dir(temp_dir.path(), ambient_authority()).expect("open tempdir");
    for source in &sources {
        let path = Utf8Path::new("query-schema").join("src").join(&source.file);
        if let Some(parent) = path.parent() {
            root.create_dir_all(parent).expect("create parent directories");
        }
        root.write(&path, &source.contents).expect("write source file");
    }
    // lib.rs sits outside every layer and must be skipped.
    root.write("query-schema/src/lib.rs", "pub mod filter;")
        .expect("write crate root");

    let result = architecture_lint::lint_crate_sources(&crate_dir);
    let mut world = world.lock().expect("world lock");
    world.result = Some(result);
}

#[then("the lint succeeds")]
fn lint_succeeds(world: &Mutex<LintWorld>) {
    let world = world.lock().expect("world lock");
    let outcome = world.result.as_ref().expect("lint must have run");
    assert!(outcome.is_ok(), "expected success, got: {outcome:?}");
}

fn assert_violation_in_file_contains(
    world: &Mutex<LintWorld>,
    expected_file: &str,
    expected_substring: &str,
) {
    let violations = violations(world);
    assert!(
        violations.iter().any(|violation| {
            violation.file == expected_file && violation.message.contains(expected_substring)
        }),
        "expected violation in '{expected_file}' containing '{expected_substring}', \
         got: {violations:?}"
    );
}

fn violations(world: &Mutex<LintWorld>) -> Vec<Violation> {
    let world = world.lock().expect("world lock");
    let outcome = world.result.as_ref().expect("lint must have run");
    extract_violations(outcome).expect("expected violations")
}

#[then("the lint fails due to payload access from filter")]
fn lint_fails_due_to_payload_access(world: &Mutex<LintWorld>) {
    assert_violation_in_file_contains(world, "filter/relation.rs", "crate::payload");
}

#[then("the lint fails due to walker access from the registry")]
fn lint_fails_due_to_walker_access(world: &Mutex<LintWorld>) {
    assert_violation_in_file_contains(world, "registry/catalogue.rs", "crate::walk");
}

#[then("the lint fails due to configuration crate usage")]
fn lint_fails_due_to_configuration_crate(world: &Mutex<LintWorld>) {
    assert_violation_in_file_contains(
        world,
        "projection/pagination.rs",
        "external crate `ortho_config`",
    );
}

#[then("the lint fails due to filesystem access")]
fn lint_fails_due_to_filesystem_access(world: &Mutex<LintWorld>) {
    assert_violation_in_file_contains(world, "delete.rs", "`std::fs`");
}

#[then("the lint fails")]
fn lint_fails(world: &Mutex<LintWorld>) {
    let world = world.lock().expect("world lock");
    let outcome = world.result.as_ref().expect("lint must have run");
    assert!(outcome.is_err(), "expected failure, got: {outcome:?}");
}

#[then("all boundary violations are reported")]
fn all_boundary_violations_are_reported(world: &Mutex<LintWorld>) {
    let violations = violations(world);
    assert!(
        violations.len() >= 2,
        "expected at least 2 violations, got: {violations:?}"
    );
    assert_violation_in_file_contains(world, "filter/bad_cross_layer.rs", "crate::validator");
    assert_violation_in_file_contains(world, "value.rs", "external crate `tracing_subscriber`");
}

fn extract_violations(outcome: &Result<(), ArchitectureLintError>) -> Option<Vec<Violation>> {
    match outcome {
        Ok(()) => None,
        Err(ArchitectureLintError::Violations(violations)) => Some(violations.clone()),
        Err(other) => panic!("expected violations error, got: {other:?}"),
    }
}

#[scenario(path = "tests/features/architecture_guardrails.feature", index = 0)]
fn filter_must_not_reach_payload(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(path = "tests/features/architecture_guardrails.feature", index = 1)]
fn registry_must_not_reach_walker(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(path = "tests/features/architecture_guardrails.feature", index = 2)]
fn layers_must_not_read_configuration(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(path = "tests/features/architecture_guardrails.feature", index = 3)]
fn layers_must_not_touch_the_filesystem(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(path = "tests/features/architecture_guardrails.feature", index = 4)]
fn well_layered_modules_pass(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(path = "tests/features/architecture_guardrails.feature", index = 5)]
fn every_violation_is_reported(world: Mutex<LintWorld>) {
    let _ = world;
}
