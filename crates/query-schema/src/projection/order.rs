//! Result ordering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationErrorKind;
use crate::filter::{Operand, mismatch};
use crate::registry::{Entity, FieldKind, RelationField, RelevanceField, ScalarField, ScalarType};
use crate::walk::{Validated, Walker};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Placement of NULL values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    /// NULLs before all values.
    First,
    /// NULLs after all values.
    Last,
}

/// Ranking by full-text relevance to a search string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelevanceOrder {
    /// Text columns searched; never empty.
    pub fields: Vec<RelevanceField>,
    /// Search expression.
    pub search: String,
    /// Most relevant first (`desc`) or last (`asc`).
    pub sort: SortOrder,
}

/// One ordering criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    /// Order by a scalar column.
    Field {
        /// Column name.
        field: &'static str,
        /// Direction.
        sort: SortOrder,
        /// NULL placement, nullable columns only.
        #[serde(skip_serializing_if = "Option::is_none")]
        nulls: Option<NullsOrder>,
    },
    /// Order by a column of a to-one relation.
    Relation {
        /// Relation name.
        field: &'static str,
        /// Criterion on the related entity.
        order: Box<OrderBy>,
    },
    /// Order by the number of rows in a to-many relation.
    RelationCount {
        /// Relation name.
        field: &'static str,
        /// Direction.
        sort: SortOrder,
    },
    /// Order by text relevance.
    Relevance(RelevanceOrder),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSort {
    sort: SortOrder,
    nulls: Option<NullsOrder>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFields {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRelevance {
    fields: RawFields,
    search: Option<String>,
    sort: SortOrder,
}

/// Parses `orderBy`: one criterion object or an array of them.
pub(crate) fn parse_order_by(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
) -> Validated<Vec<OrderBy>> {
    walker.one_or_many(value, |inner, item| parse_criterion(inner, entity, item))
}

fn parse_criterion(walker: &mut Walker, entity: Entity, value: &Value) -> Validated<OrderBy> {
    let (key, argument) = single_entry(walker, value)?;
    walker.at_key(key, |inner| {
        if key == "_relevance" {
            return parse_relevance(inner, entity, argument).map(OrderBy::Relevance);
        }
        match entity.def().field(key) {
            Some(FieldKind::Scalar(field)) => {
                let (sort, nulls) = parse_sort(inner, field, argument)?;
                Ok(OrderBy::Field {
                    field: field.name,
                    sort,
                    nulls,
                })
            }
            Some(FieldKind::Relation(relation)) => parse_relation_order(inner, relation, argument),
            None => inner.fail(ValidationErrorKind::UnknownField {
                entity,
                field: key.to_owned(),
            }),
        }
    })
}

/// Returns the only key of an ordering object.
pub(crate) fn single_entry<'v>(
    walker: &Walker,
    value: &'v Value,
) -> Validated<(&'v str, &'v Value)> {
    let entries = walker.object(value)?;
    let mut iter = entries.iter();
    match (iter.next(), iter.next()) {
        (Some((key, argument)), None) => Ok((key.as_str(), argument)),
        _ => walker.fail(ValidationErrorKind::AmbiguousOrdering {
            count: entries.len(),
        }),
    }
}

/// Reads `asc`, `desc` or `{ sort, nulls? }` for a scalar column.
pub(crate) fn parse_sort(
    walker: &Walker,
    field: &ScalarField,
    value: &Value,
) -> Validated<(SortOrder, Option<NullsOrder>)> {
    if field.list || field.scalar == ScalarType::Json {
        return mismatch(walker, "orderBy", Operand::of(field).describe());
    }
    if value.is_string() {
        return direction(walker, value).map(|sort| (sort, None));
    }
    let raw = RawSort::deserialize(value).map_err(|err| {
        walker.error(ValidationErrorKind::InvalidValue {
            expected: format!("'asc', 'desc' or {{ sort, nulls }} ({err})"),
        })
    })?;
    if raw.nulls.is_some() && !field.nullable {
        return mismatch(walker, "nulls", Operand::of(field).describe());
    }
    Ok((raw.sort, raw.nulls))
}

pub(crate) fn direction(walker: &Walker, value: &Value) -> Validated<SortOrder> {
    SortOrder::deserialize(value).map_or_else(|_| walker.invalid("'asc' or 'desc'"), Ok)
}

fn parse_relation_order(
    walker: &mut Walker,
    relation: &RelationField,
    value: &Value,
) -> Validated<OrderBy> {
    if !relation.cardinality.is_many() {
        let order = parse_criterion(walker, relation.target, value)?;
        return Ok(OrderBy::Relation {
            field: relation.name,
            order: Box::new(order),
        });
    }
    let (key, argument) = single_entry(walker, value)?;
    if key != "_count" {
        return mismatch(walker, key, relation.cardinality.describe().to_owned());
    }
    let sort = walker.at_key(key, |inner| direction(inner, argument))?;
    Ok(OrderBy::RelationCount {
        field: relation.name,
        sort,
    })
}

fn parse_relevance(walker: &Walker, entity: Entity, value: &Value) -> Validated<RelevanceOrder> {
    let raw = RawRelevance::deserialize(value).map_err(|err| {
        walker.error(ValidationErrorKind::InvalidValue {
            expected: format!("{{ fields, search, sort }} ({err})"),
        })
    })?;
    let Some(search) = raw.search else {
        return walker.fail(ValidationErrorKind::MissingRelevanceSearch);
    };
    let names = match raw.fields {
        RawFields::One(name) => vec![name],
        RawFields::Many(names) => names,
    };
    if names.is_empty() {
        return walker.fail(ValidationErrorKind::EmptyRelevanceFields);
    }
    let fields = names
        .iter()
        .map(|name| {
            RelevanceField::parse(entity, name).ok_or_else(|| {
                walker.error(ValidationErrorKind::InvalidValue {
                    expected: format!(
                        "relevance fields drawn from: {}",
                        RelevanceField::field_names(entity).join(", ")
                    ),
                })
            })
        })
        .collect::<Validated<Vec<_>>>()?;
    Ok(RelevanceOrder {
        fields,
        search,
        sort: raw.sort,
    })
}
