//! Grouped aggregate queries.

use serde::Serialize;
use serde_json::Value;

use super::order::{NullsOrder, SortOrder, direction, parse_sort, single_entry};
use super::pagination::{parse_skip, parse_take, scalar_name};
use super::select::reject_unknown_arguments;
use crate::error::ValidationErrorKind;
use crate::filter::{WhereInput, WhereScope, aggregate_operand, parse_where};
use crate::registry::{Entity, ScalarField};
use crate::walk::{Validated, Walker};

const GROUP_BY_ARGUMENTS: &[&str] = &[
    "_avg", "_count", "_max", "_min", "_sum", "by", "having", "orderBy", "skip", "take", "where",
];

/// Aggregate function over the rows of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Aggregate {
    /// Number of non-null values, or of rows with `_all`.
    #[serde(rename = "_count")]
    Count,
    /// Smallest value.
    #[serde(rename = "_min")]
    Min,
    /// Largest value.
    #[serde(rename = "_max")]
    Max,
    /// Arithmetic mean.
    #[serde(rename = "_avg")]
    Avg,
    /// Sum.
    #[serde(rename = "_sum")]
    Sum,
}

impl Aggregate {
    /// Every aggregate, in argument order.
    pub const ALL: [Self; 5] = [Self::Count, Self::Min, Self::Max, Self::Avg, Self::Sum];

    /// Argument key of the aggregate, such as `_count`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Count => "_count",
            Self::Min => "_min",
            Self::Max => "_max",
            Self::Avg => "_avg",
            Self::Sum => "_sum",
        }
    }

    /// Looks an aggregate up by its argument key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|aggregate| aggregate.key() == key)
    }
}

/// Columns an aggregate is computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateSelection {
    /// The aggregate function.
    pub aggregate: Aggregate,
    /// Count every row of the group, `_count` only.
    #[serde(rename = "_all", skip_serializing_if = "std::ops::Not::not")]
    pub all: bool,
    /// Aggregated columns.
    pub fields: Vec<&'static str>,
}

/// Ordering of groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupOrderBy {
    /// Order by a grouped column.
    Field {
        /// Column name; always one of `by`.
        field: &'static str,
        /// Direction.
        sort: SortOrder,
        /// NULL placement.
        #[serde(skip_serializing_if = "Option::is_none")]
        nulls: Option<NullsOrder>,
    },
    /// Order by an aggregate of any column.
    Aggregate {
        /// The aggregate function.
        aggregate: Aggregate,
        /// Aggregated column.
        field: &'static str,
        /// Direction.
        sort: SortOrder,
    },
}

/// Validated arguments of a grouped query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByArgs {
    /// Entity grouped.
    pub entity: Entity,
    /// Grouping columns; never empty.
    pub by: Vec<&'static str>,
    /// Filter applied before grouping.
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<WhereInput>,
    /// Filter applied to groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub having: Option<WhereInput>,
    /// Group ordering.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<GroupOrderBy>,
    /// Requested aggregates, in argument order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregates: Vec<AggregateSelection>,
    /// Number of groups to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
    /// Number of groups to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

impl GroupByArgs {
    /// The selection for `aggregate`, if requested.
    #[must_use]
    pub fn aggregate(&self, aggregate: Aggregate) -> Option<&AggregateSelection> {
        self.aggregates
            .iter()
            .find(|selection| selection.aggregate == aggregate)
    }

    pub(crate) fn parse(walker: &mut Walker, entity: Entity, value: &Value) -> Validated<Self> {
        let arguments = walker.object(value)?;
        reject_unknown_arguments(walker, arguments, GROUP_BY_ARGUMENTS)?;

        let Some(by_value) = arguments.get("by") else {
            return walker.fail(ValidationErrorKind::MissingRequiredField { field: "by" });
        };
        let by = walker.at_key("by", |inner| {
            let columns = inner.one_or_many(by_value, |item_walker, item| {
                scalar_name(item_walker, entity, item)
            })?;
            if columns.is_empty() {
                return inner.invalid("at least one scalar field");
            }
            Ok(columns)
        })?;

        let filter = arguments
            .get("where")
            .map(|filter| {
                walker.at_key("where", |inner| {
                    parse_where(inner, entity, filter, WhereScope::Full)
                })
            })
            .transpose()?;
        let having = arguments
            .get("having")
            .map(|having| {
                walker.at_key("having", |inner| {
                    parse_where(inner, entity, having, WhereScope::Having { by: &by })
                })
            })
            .transpose()?;
        let order_by = match arguments.get("orderBy") {
            Some(order) => walker.at_key("orderBy", |inner| {
                inner.one_or_many(order, |item_walker, item| {
                    parse_group_order(item_walker, entity, &by, item)
                })
            })?,
            None => Vec::new(),
        };

        let mut aggregates = Vec::new();
        for aggregate in Aggregate::ALL {
            if let Some(selection) = arguments.get(aggregate.key()) {
                let parsed = walker.at_key(aggregate.key(), |inner| {
                    parse_aggregate(inner, entity, aggregate, selection)
                })?;
                aggregates.extend(parsed);
            }
        }

        let take = arguments
            .get("take")
            .map(|take| walker.at_key("take", |inner| parse_take(inner, take)))
            .transpose()?;
        let skip = arguments
            .get("skip")
            .map(|skip| walker.at_key("skip", |inner| parse_skip(inner, skip)))
            .transpose()?;
        if (take.is_some() || skip.is_some()) && order_by.is_empty() {
            return walker.invalid("orderBy alongside take or skip");
        }

        Ok(Self {
            entity,
            by,
            filter,
            having,
            order_by,
            aggregates,
            take,
            skip,
        })
    }
}

fn column(walker: &Walker, entity: Entity, name: &str) -> Validated<&'static ScalarField> {
    entity.def().scalar(name).map_or_else(
        || {
            walker.fail(ValidationErrorKind::UnknownField {
                entity,
                field: name.to_owned(),
            })
        },
        Ok,
    )
}

fn parse_group_order(
    walker: &mut Walker,
    entity: Entity,
    by: &[&'static str],
    value: &Value,
) -> Validated<GroupOrderBy> {
    let (key, argument) = single_entry(walker, value)?;
    walker.at_key(key, |inner| {
        if let Some(aggregate) = Aggregate::from_key(key) {
            let (name, sort_value) = single_entry(inner, argument)?;
            return inner.at_key(name, |item_walker| {
                let field = column(item_walker, entity, name)?;
                aggregate_operand(item_walker, field, key)?;
                Ok(GroupOrderBy::Aggregate {
                    aggregate,
                    field: field.name,
                    sort: direction(item_walker, sort_value)?,
                })
            });
        }
        let field = column(inner, entity, key)?;
        if !by.contains(&field.name) {
            return inner.fail(ValidationErrorKind::FieldNotGrouped {
                field: field.name.to_owned(),
            });
        }
        let (sort, nulls) = parse_sort(inner, field, argument)?;
        Ok(GroupOrderBy::Field {
            field: field.name,
            sort,
            nulls,
        })
    })
}

fn parse_aggregate(
    walker: &mut Walker,
    entity: Entity,
    aggregate: Aggregate,
    value: &Value,
) -> Validated<Option<AggregateSelection>> {
    let mut selection = AggregateSelection {
        aggregate,
        all: false,
        fields: Vec::new(),
    };
    if aggregate == Aggregate::Count && value.is_boolean() {
        selection.all = walker.boolean(value)?;
        return Ok(selection.all.then_some(selection));
    }
    let requested = walker.object(value)?;
    for (name, flag) in requested {
        walker.at_key(name, |inner| {
            let wanted = inner.boolean(flag)?;
            if aggregate == Aggregate::Count && name == "_all" {
                selection.all = wanted;
                return Ok(());
            }
            let field = column(inner, entity, name)?;
            aggregate_operand(inner, field, aggregate.key())?;
            if wanted {
                selection.fields.push(field.name);
            }
            Ok(())
        })?;
    }
    if selection.all || !selection.fields.is_empty() {
        Ok(Some(selection))
    } else {
        Ok(None)
    }
}
