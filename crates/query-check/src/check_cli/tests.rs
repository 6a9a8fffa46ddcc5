//! Unit tests for the query check CLI helpers.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs::Dir};
use query_schema::registry::Entity;
use query_schema::{LimitBound, ValidationErrorKind};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

struct InputDir {
    temp: TempDir,
    dir: Dir,
}

impl InputDir {
    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        self.dir.write(name, contents).expect("write input");
        Utf8PathBuf::from_path_buf(self.temp.path().join(name)).expect("utf-8 temp path")
    }
}

#[fixture]
fn input_dir() -> InputDir {
    let temp = tempfile::tempdir().expect("temp dir");
    let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open temp dir");
    InputDir { temp, dir }
}

fn args(entity: &str, operation: &str, input: &Utf8Path) -> CliArgs {
    CliArgs::try_parse_from([
        "query-check",
        "--entity",
        entity,
        "--operation",
        operation,
        "--input",
        input.as_str(),
    ])
    .expect("parse args")
}

#[rstest]
fn parses_entity_and_operation_names() {
    let parsed = args("bookmark", "find-many", Utf8Path::new("query.json"));

    assert_eq!(parsed.entity, Entity::Bookmark);
    assert_eq!(parsed.operation, Operation::FindMany);
    assert!(!parsed.pretty);
}

#[rstest]
#[case::unknown_entity(["--entity", "Article", "--operation", "where", "--input", "q.json"])]
#[case::unknown_operation(["--entity", "Tag", "--operation", "findMany", "--input", "q.json"])]
fn rejects_unknown_names(#[case] flags: [&str; 6]) {
    let argv = std::iter::once("query-check").chain(flags);

    assert!(CliArgs::try_parse_from(argv).is_err());
}

#[rstest]
fn renders_a_validated_document(input_dir: InputDir) {
    let path = input_dir.write("filter.json", r#"{"title": {"contains": "rust"}}"#);

    let validated =
        check(&args("Bookmark", "where", &path), ValidationLimits::default()).expect("valid");
    let rendered: Value =
        serde_json::from_str(&render(&validated, false).expect("render")).expect("JSON output");

    assert_eq!(rendered["entity"], "Bookmark");
    assert!(render(&validated, true).expect("render").contains('\n'));
}

#[rstest]
fn rejection_carries_the_validation_error(input_dir: InputDir) {
    let path = input_dir.write("filter.json", r#"{"colour": "red"}"#);

    let error = check(&args("Bookmark", "where", &path), ValidationLimits::default())
        .expect_err("unknown field");
    let validation = error.validation().expect("validation failure");
    let report: Value = serde_json::from_str(&failure_report(validation)).expect("JSON report");

    assert_eq!(report["code"], "unknown_field");
    assert_eq!(report["path"], "colour");
}

#[rstest]
fn limits_are_applied(input_dir: InputDir) {
    let path = input_dir.write("filter.json", r#"{"category": {"is": {"name": "x"}}}"#);

    let error = check(&args("Bookmark", "where", &path), ValidationLimits::new(2, 64))
        .expect_err("too deep");

    assert_eq!(
        error.validation().map(|failure| &failure.kind),
        Some(&ValidationErrorKind::StructuralOverflow {
            bound: LimitBound::Depth,
            limit: 2,
        })
    );
}

#[rstest]
fn malformed_json_is_reported(input_dir: InputDir) {
    let path = input_dir.write("broken.json", "{\"title\": ");

    let error = check(&args("Bookmark", "where", &path), ValidationLimits::default())
        .expect_err("malformed JSON");

    assert!(matches!(error, CliError::InvalidJson { .. }));
}

#[rstest]
fn missing_file_is_reported(input_dir: InputDir) {
    let path = Utf8PathBuf::from_path_buf(input_dir.temp.path().join("missing.json"))
        .expect("utf-8 temp path");

    let error = read_document(&path).expect_err("missing file");

    assert!(matches!(error, CliError::Read { .. }));
    assert!(error.to_string().contains("missing.json"));
}
