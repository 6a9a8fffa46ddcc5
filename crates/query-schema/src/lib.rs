//! Recursively validated query filter algebra.
//!
//! Callers hand in untrusted JSON documents (filters, orderings,
//! projections, create and update payloads, delete scopes) and get back
//! strongly typed structures checked against the static entity
//! [`registry`]. Every failure is a single [`ValidationError`] naming the
//! path of the offending node.
//!
//! The free functions below apply [`ValidationLimits::default`]; use
//! [`QueryValidator`] to choose other budgets.
//!
//! # Examples
//!
//! ```
//! use query_schema::registry::Entity;
//! use serde_json::json;
//!
//! let filter = query_schema::validate_where(
//!     Entity::Bookmark,
//!     &json!({
//!         "OR": [
//!             {"title": {"contains": "rust", "mode": "insensitive"}},
//!             {"tags": {"some": {"tag": {"name": "rust"}}}}
//!         ],
//!         "archived": false
//!     }),
//! )
//! .expect("valid filter");
//! assert_eq!(filter.or().map(<[_]>::len), Some(2));
//!
//! let err = query_schema::validate_where(
//!     Entity::Bookmark,
//!     &json!({"archived": {"contains": "yes"}}),
//! )
//! .expect_err("booleans have no substring operator");
//! assert_eq!(err.path.to_string(), "archived.contains");
//! ```

pub mod filter;
pub mod payload;
pub mod projection;
pub mod registry;

mod delete;
mod error;
mod isolation;
mod limits;
mod validator;
mod value;
mod walk;

use serde_json::Value;

pub use delete::{CascadeStep, DeletePlan, DeleteScope, cascade_plan};
pub use error::{FieldPath, LimitBound, PathSegment, ValidationError, ValidationErrorKind};
pub use isolation::{TransactionIsolationLevel, UnknownIsolationLevel};
pub use limits::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, ValidationLimits};
pub use validator::{Operation, QueryValidator, UnknownOperation, ValidatedQuery};
pub use value::{NullSentinel, NullableJson, ScalarValue, transform_json_null};
pub use walk::Validated;

use filter::{WhereInput, WhereUniqueInput};
use payload::{CreatePayload, UpdatePayload};
use projection::{FindManyArgs, GroupByArgs, Include, OrderBy, Select};
use registry::Entity;

/// Validates a `where` filter with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_where(entity: Entity, input: &Value) -> Validated<WhereInput> {
    QueryValidator::default().validate_where(entity, input)
}

/// Validates a unique lookup with default limits.
///
/// # Errors
///
/// Fails unless the input names at least one complete unique key.
pub fn validate_where_unique(entity: Entity, input: &Value) -> Validated<WhereUniqueInput> {
    QueryValidator::default().validate_where_unique(entity, input)
}

/// Validates an `orderBy` argument with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_order_by(entity: Entity, input: &Value) -> Validated<Vec<OrderBy>> {
    QueryValidator::default().validate_order_by(entity, input)
}

/// Validates the data of a new row with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_create(entity: Entity, input: &Value) -> Validated<CreatePayload> {
    QueryValidator::default().validate_create(entity, input)
}

/// Validates changes to existing rows with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_update(entity: Entity, input: &Value) -> Validated<UpdatePayload> {
    QueryValidator::default().validate_update(entity, input)
}

/// Validates a `select` projection with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_select(entity: Entity, input: &Value) -> Validated<Select> {
    QueryValidator::default().validate_select(entity, input)
}

/// Validates an `include` projection with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_include(entity: Entity, input: &Value) -> Validated<Include> {
    QueryValidator::default().validate_include(entity, input)
}

/// Validates list query arguments with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_find_many(entity: Entity, input: &Value) -> Validated<FindManyArgs> {
    QueryValidator::default().validate_find_many(entity, input)
}

/// Validates grouped query arguments with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_group_by(entity: Entity, input: &Value) -> Validated<GroupByArgs> {
    QueryValidator::default().validate_group_by(entity, input)
}

/// Validates a single-row delete with default limits.
///
/// # Errors
///
/// Fails unless the input names at least one complete unique key.
pub fn validate_delete(entity: Entity, input: &Value) -> Validated<DeletePlan> {
    QueryValidator::default().validate_delete(entity, input)
}

/// Validates a bulk delete with default limits.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_delete_many(entity: Entity, input: &Value) -> Validated<DeletePlan> {
    QueryValidator::default().validate_delete_many(entity, input)
}
