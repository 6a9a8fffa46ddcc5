//! Arguments of list queries, at the root and nested under relations.

use serde::Serialize;
use serde_json::{Map, Value};

use super::order::{OrderBy, parse_order_by};
use super::pagination::Pagination;
use super::select::{Projection, parse_include, parse_select, reject_unknown_arguments};
use crate::error::ValidationErrorKind;
use crate::filter::{WhereInput, WhereScope, parse_where};
use crate::registry::Entity;
use crate::walk::{Validated, Walker};

const LIST_ARGUMENTS: &[&str] = &[
    "cursor", "distinct", "include", "orderBy", "select", "skip", "take", "where",
];
const TO_ONE_ARGUMENTS: &[&str] = &["include", "select"];

/// Where a set of arguments appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgsScope {
    /// A root `findMany`.
    Root,
    /// Nested under a to-many relation.
    ToMany,
    /// Nested under a to-one relation: only `select` and `include`.
    ToOne,
}

impl ArgsScope {
    const fn allowed(self) -> &'static [&'static str] {
        match self {
            Self::Root | Self::ToMany => LIST_ARGUMENTS,
            Self::ToOne => TO_ONE_ARGUMENTS,
        }
    }
}

/// Validated arguments of a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyArgs {
    entity: Entity,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<WhereInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<OrderBy>,
    projection: Projection,
    #[serde(flatten)]
    pagination: Pagination,
}

impl FindManyArgs {
    /// Entity queried.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Row filter, when `where` was supplied.
    #[must_use]
    pub const fn filter(&self) -> Option<&WhereInput> {
        self.filter.as_ref()
    }

    /// Ordering criteria, most significant first.
    #[must_use]
    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Shape of each returned row.
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Windowing arguments.
    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub(crate) fn parse(
        walker: &mut Walker,
        entity: Entity,
        value: &Value,
        scope: ArgsScope,
    ) -> Validated<Self> {
        let arguments = walker.object(value)?;
        reject_unknown_arguments(walker, arguments, scope.allowed())?;

        let filter = arguments
            .get("where")
            .map(|filter| {
                walker.at_key("where", |inner| {
                    parse_where(inner, entity, filter, WhereScope::Full)
                })
            })
            .transpose()?;
        let order_by = match arguments.get("orderBy") {
            Some(order) => walker.at_key("orderBy", |inner| parse_order_by(inner, entity, order))?,
            None => Vec::new(),
        };
        let projection = parse_projection(walker, entity, arguments)?;
        let pagination = Pagination::parse(walker, entity, arguments)?;
        Ok(Self {
            entity,
            filter,
            order_by,
            projection,
            pagination,
        })
    }
}

/// Reads `select` or `include`; supplying both is an error.
pub(crate) fn parse_projection(
    walker: &mut Walker,
    entity: Entity,
    arguments: &Map<String, Value>,
) -> Validated<Projection> {
    match (arguments.get("select"), arguments.get("include")) {
        (Some(_), Some(_)) => walker.fail(ValidationErrorKind::SelectIncludeConflict),
        (Some(select), None) => walker
            .at_key("select", |inner| parse_select(inner, entity, select))
            .map(Projection::Select),
        (None, Some(include)) => walker
            .at_key("include", |inner| parse_include(inner, entity, include))
            .map(Projection::Include),
        (None, None) => Ok(Projection::Default),
    }
}
