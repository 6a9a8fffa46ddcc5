//! Entry points validating one input document per call.
//!
//! [`QueryValidator`] owns the structural budgets and hands every document
//! to a fresh [`Walker`]. Each operation returns the validated structure or
//! the first error found; nothing is cached between calls.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::delete::DeletePlan;
use crate::filter::{WhereInput, WhereScope, WhereUniqueInput, parse_where, parse_where_unique};
use crate::limits::ValidationLimits;
use crate::payload::{CreatePayload, UpdatePayload, parse_create, parse_update};
use crate::projection::{
    ArgsScope, FindManyArgs, GroupByArgs, Include, OrderBy, Select, parse_include,
    parse_order_by, parse_select,
};
use crate::registry::Entity;
use crate::walk::{Validated, Walker};

/// Validates query input against the entity registry.
///
/// # Examples
///
/// ```
/// use query_schema::registry::Entity;
/// use query_schema::{QueryValidator, ValidationLimits};
/// use serde_json::json;
///
/// let validator = QueryValidator::new(ValidationLimits::new(4, 64));
/// let filter = validator
///     .validate_where(Entity::Bookmark, &json!({"archived": false}))
///     .expect("valid filter");
/// assert!(filter.condition("archived").is_some());
///
/// let err = validator
///     .validate_where(Entity::Bookmark, &json!({"colour": "red"}))
///     .expect_err("unknown field");
/// assert_eq!(err.code(), "unknown_field");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryValidator {
    limits: ValidationLimits,
}

impl QueryValidator {
    /// Creates a validator enforcing `limits`.
    #[must_use]
    pub const fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Budgets applied to every document.
    #[must_use]
    pub const fn limits(&self) -> ValidationLimits {
        self.limits
    }

    /// Validates a `where` filter.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_where(&self, entity: Entity, input: &Value) -> Validated<WhereInput> {
        self.run(Operation::Where, entity, input, |walker, value| {
            parse_where(walker, entity, value, WhereScope::Full)
        })
    }

    /// Validates a unique lookup.
    ///
    /// # Errors
    ///
    /// Fails unless the input names at least one complete unique key.
    pub fn validate_where_unique(
        &self,
        entity: Entity,
        input: &Value,
    ) -> Validated<WhereUniqueInput> {
        self.run(Operation::WhereUnique, entity, input, |walker, value| {
            parse_where_unique(walker, entity, value)
        })
    }

    /// Validates an `orderBy` argument.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_order_by(&self, entity: Entity, input: &Value) -> Validated<Vec<OrderBy>> {
        self.run(Operation::OrderBy, entity, input, |walker, value| {
            parse_order_by(walker, entity, value)
        })
    }

    /// Validates the data of a new row.
    ///
    /// # Errors
    ///
    /// Fails on unknown fields, missing required fields or relations, and
    /// relations set both by foreign key and by relation write.
    pub fn validate_create(&self, entity: Entity, input: &Value) -> Validated<CreatePayload> {
        self.run(Operation::Create, entity, input, |walker, value| {
            parse_create(walker, entity, value, None, true)
        })
    }

    /// Validates changes to existing rows.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_update(&self, entity: Entity, input: &Value) -> Validated<UpdatePayload> {
        self.run(Operation::Update, entity, input, |walker, value| {
            parse_update(walker, entity, value, None, true)
        })
    }

    /// Validates a `select` projection.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_select(&self, entity: Entity, input: &Value) -> Validated<Select> {
        self.run(Operation::Select, entity, input, |walker, value| {
            parse_select(walker, entity, value)
        })
    }

    /// Validates an `include` projection.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_include(&self, entity: Entity, input: &Value) -> Validated<Include> {
        self.run(Operation::Include, entity, input, |walker, value| {
            parse_include(walker, entity, value)
        })
    }

    /// Validates the arguments of a list query.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_find_many(&self, entity: Entity, input: &Value) -> Validated<FindManyArgs> {
        self.run(Operation::FindMany, entity, input, |walker, value| {
            FindManyArgs::parse(walker, entity, value, ArgsScope::Root)
        })
    }

    /// Validates the arguments of a grouped aggregate query.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_group_by(&self, entity: Entity, input: &Value) -> Validated<GroupByArgs> {
        self.run(Operation::GroupBy, entity, input, |walker, value| {
            GroupByArgs::parse(walker, entity, value)
        })
    }

    /// Validates the unique lookup of a single-row delete and plans its
    /// cascades.
    ///
    /// # Errors
    ///
    /// Fails unless the input names at least one complete unique key.
    pub fn validate_delete(&self, entity: Entity, input: &Value) -> Validated<DeletePlan> {
        self.run(Operation::Delete, entity, input, |walker, value| {
            DeletePlan::parse_unique(walker, entity, value)
        })
    }

    /// Validates the filter of a bulk delete and plans its cascades.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate_delete_many(&self, entity: Entity, input: &Value) -> Validated<DeletePlan> {
        self.run(Operation::DeleteMany, entity, input, |walker, value| {
            DeletePlan::parse_many(walker, entity, value)
        })
    }

    /// Runs `operation` and returns its result as one serialisable value.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`](crate::ValidationError) found.
    pub fn validate(
        &self,
        operation: Operation,
        entity: Entity,
        input: &Value,
    ) -> Validated<ValidatedQuery> {
        match operation {
            Operation::Where => self.validate_where(entity, input).map(ValidatedQuery::Where),
            Operation::WhereUnique => self
                .validate_where_unique(entity, input)
                .map(ValidatedQuery::WhereUnique),
            Operation::OrderBy => self
                .validate_order_by(entity, input)
                .map(ValidatedQuery::OrderBy),
            Operation::Create => self.validate_create(entity, input).map(ValidatedQuery::Create),
            Operation::Update => self.validate_update(entity, input).map(ValidatedQuery::Update),
            Operation::Select => self.validate_select(entity, input).map(ValidatedQuery::Select),
            Operation::Include => self
                .validate_include(entity, input)
                .map(ValidatedQuery::Include),
            Operation::FindMany => self
                .validate_find_many(entity, input)
                .map(|args| ValidatedQuery::FindMany(Box::new(args))),
            Operation::GroupBy => self
                .validate_group_by(entity, input)
                .map(|args| ValidatedQuery::GroupBy(Box::new(args))),
            Operation::Delete => self.validate_delete(entity, input).map(ValidatedQuery::Delete),
            Operation::DeleteMany => self
                .validate_delete_many(entity, input)
                .map(ValidatedQuery::Delete),
        }
    }

    fn run<T>(
        &self,
        operation: Operation,
        entity: Entity,
        input: &Value,
        parse: impl FnOnce(&mut Walker, &Value) -> Validated<T>,
    ) -> Validated<T> {
        let mut walker = Walker::new(self.limits);
        let outcome = parse(&mut walker, input);
        match &outcome {
            Ok(_) => debug!(%entity, %operation, "query input accepted"),
            Err(error) => debug!(
                %entity,
                %operation,
                code = error.code(),
                path = %error.path,
                "query input rejected"
            ),
        }
        outcome
    }
}

/// Operations a document can be validated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// A `where` filter.
    Where,
    /// A unique lookup.
    WhereUnique,
    /// An `orderBy` argument.
    OrderBy,
    /// Data of a new row.
    Create,
    /// Changes to existing rows.
    Update,
    /// A `select` projection.
    Select,
    /// An `include` projection.
    Include,
    /// Arguments of a list query.
    FindMany,
    /// Arguments of a grouped query.
    GroupBy,
    /// A single-row delete.
    Delete,
    /// A bulk delete.
    DeleteMany,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Self; 11] = [
        Self::Where,
        Self::WhereUnique,
        Self::OrderBy,
        Self::Create,
        Self::Update,
        Self::Select,
        Self::Include,
        Self::FindMany,
        Self::GroupBy,
        Self::Delete,
        Self::DeleteMany,
    ];

    /// Name as accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Where => "where",
            Self::WhereUnique => "where-unique",
            Self::OrderBy => "order-by",
            Self::Create => "create",
            Self::Update => "update",
            Self::Select => "select",
            Self::Include => "include",
            Self::FindMany => "find-many",
            Self::GroupBy => "group-by",
            Self::Delete => "delete",
            Self::DeleteMany => "delete-many",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an operation name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation '{name}'")]
pub struct UnknownOperation {
    /// The rejected input.
    pub name: String,
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|operation| operation.as_str() == s)
            .ok_or_else(|| UnknownOperation { name: s.to_owned() })
    }
}

/// Output of [`QueryValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValidatedQuery {
    /// A validated filter.
    Where(WhereInput),
    /// A validated unique lookup.
    WhereUnique(WhereUniqueInput),
    /// Validated ordering criteria.
    OrderBy(Vec<OrderBy>),
    /// A validated create payload.
    Create(CreatePayload),
    /// A validated update payload.
    Update(UpdatePayload),
    /// A validated `select`.
    Select(Select),
    /// A validated `include`.
    Include(Include),
    /// Validated list query arguments.
    FindMany(Box<FindManyArgs>),
    /// Validated grouped query arguments.
    GroupBy(Box<GroupByArgs>),
    /// A validated delete and its cascade plan.
    Delete(DeletePlan),
}
