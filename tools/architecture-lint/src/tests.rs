//! Unit tests for the architecture lint.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest::rstest;

use super::*;

#[derive(Clone, Copy)]
struct LintSingle;

impl LintSingle {
    fn lint(self, file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
        lint_sources(&[LintSource {
            file: Utf8PathBuf::from(file),
            contents: contents.to_owned(),
        }])
    }
}

#[fixture]
fn lint_single() -> LintSingle {
    LintSingle
}

#[rstest]
#[case::projection_reads_filter(
    "projection/find.rs",
    "use crate::filter::{WhereInput, parse_where}; fn f() -> Option<WhereInput> { None }",
    true
)]
#[case::payload_reads_projection(
    "payload/nested.rs",
    "use crate::projection::reject_unknown_arguments; fn f() {}",
    true
)]
#[case::foundation_reads_registry(
    "error.rs",
    "use crate::registry::Entity; fn f(_: Entity) {}",
    true
)]
#[case::sibling_submodule(
    "filter/relation.rs",
    "use super::scalar::mismatch; fn f() { let filter = 1; let _ = filter; }",
    true
)]
#[case::filter_reads_payload(
    "filter/mod.rs",
    "use crate::payload::FieldWrite; fn f(_: FieldWrite) {}",
    false
)]
#[case::filter_reads_projection_by_crate_name(
    "filter/scalar.rs",
    "use query_schema::projection::OrderBy; fn f(_: OrderBy) {}",
    false
)]
#[case::projection_reads_validator(
    "projection/order.rs",
    "fn f() { let _ = super::super::validator::QueryValidator::default(); }",
    false
)]
#[case::registry_reads_walker(
    "registry/field.rs",
    "use crate::walk::Walker; fn f(_: Walker) {}",
    false
)]
#[case::foundation_reads_filter(
    "walk.rs",
    "use crate::filter::WhereInput; fn f(_: WhereInput) {}",
    false
)]
#[case::delete_reads_filesystem(
    "delete.rs",
    "fn f() { let _ = std::fs::read_to_string(\"plan.json\"); }",
    false
)]
#[case::validator_reads_config(
    "validator.rs",
    "use ortho_config::OrthoConfig; fn f() {}",
    false
)]
fn detects_boundary_violations(
    lint_single: LintSingle,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] ok: bool,
) {
    let result = lint_single.lint(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
fn files_outside_the_layers_are_rejected(lint_single: LintSingle) {
    let result = lint_single.lint("lib.rs", "pub mod filter;");

    assert!(matches!(result, Err(ArchitectureLintError::Parse { .. })));
}

#[rstest]
fn violations_name_the_layer_and_module(lint_single: LintSingle) {
    let Err(ArchitectureLintError::Violations(violations)) =
        lint_single.lint("registry/mod.rs", "use crate::error::ValidationError;")
    else {
        panic!("expected a violation");
    };

    assert_eq!(
        violations,
        vec![Violation {
            file: Utf8PathBuf::from("registry/mod.rs"),
            message: "registry module must not depend on crate::error".to_owned(),
        }]
    );
}
