//! Filter algebra.
//!
//! A [`WhereInput`] is a boolean tree over one entity: explicit `AND`,
//! `OR` and `NOT` combinators plus per-field conditions that are implicitly
//! AND-ed. Conditions on scalar columns pick their operator set from the
//! column type; conditions on relations recurse into the target entity.
//!
//! The same grammar serves three scopes: full filters, scalar-only filters
//! used by nested `updateMany`/`deleteMany`, and aggregate `having` filters
//! of grouped queries.

mod aggregate;
mod json;
mod list;
mod relation;
mod scalar;
mod unique;

use serde::Serialize;
use serde_json::Value;

pub use aggregate::AggregateFilter;
pub use json::{JsonComparison, JsonFilter, JsonFilterValue};
pub use list::{ListComparison, ListFilter};
pub use relation::{RelationFilter, RelationMatch};
pub use scalar::{Comparison, NotFilter, QueryMode, ScalarFilter};
pub use unique::{UniqueSelector, WhereUniqueInput};

pub(crate) use aggregate::aggregate_operand;
pub(crate) use scalar::{Operand, mismatch};
pub(crate) use unique::parse_where_unique;

use crate::error::ValidationErrorKind;
use crate::registry::{Entity, FieldKind, ScalarField, ScalarType};
use crate::walk::{Validated, Walker};

/// Filter on one scalar column, by column kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldFilter {
    /// String, number, boolean or timestamp column.
    Scalar(ScalarFilter),
    /// JSON column.
    Json(JsonFilter),
    /// List column.
    List(ListFilter),
}

impl FieldFilter {
    pub(crate) fn parse(
        walker: &mut Walker,
        field: &ScalarField,
        value: &Value,
    ) -> Validated<Self> {
        if field.list {
            ListFilter::parse(walker, field, value).map(Self::List)
        } else if field.scalar == ScalarType::Json {
            JsonFilter::parse(walker, Operand::of(field), value).map(Self::Json)
        } else {
            ScalarFilter::parse(walker, Operand::of(field), value).map(Self::Scalar)
        }
    }
}

/// A predicate on one field of the filtered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// Predicate on a scalar column.
    Field {
        /// Column name.
        field: &'static str,
        /// The predicate.
        filter: FieldFilter,
    },
    /// Predicate on related rows.
    Relation {
        /// Relation name.
        field: &'static str,
        /// The predicate.
        filter: RelationFilter,
    },
    /// Predicate on a grouped column or its aggregates.
    Aggregate {
        /// Column name.
        field: &'static str,
        /// The predicate.
        filter: AggregateFilter,
    },
}

impl Condition {
    /// Name of the field the condition applies to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Field { field, .. }
            | Self::Relation { field, .. }
            | Self::Aggregate { field, .. } => field,
        }
    }

    fn normalize(self) -> Self {
        match self {
            Self::Relation { field, filter } => Self::Relation {
                field,
                filter: filter.normalize(),
            },
            other => other,
        }
    }
}

/// Validated boolean filter over one entity.
///
/// A row matches when every condition, every `AND` child and at least one
/// `OR` child match, and no `NOT` child matches. An empty input matches
/// every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhereInput {
    entity: Entity,
    #[serde(rename = "AND", skip_serializing_if = "Vec::is_empty")]
    and: Vec<WhereInput>,
    #[serde(rename = "OR", skip_serializing_if = "Option::is_none")]
    or: Option<Vec<WhereInput>>,
    #[serde(rename = "NOT", skip_serializing_if = "Vec::is_empty")]
    not: Vec<WhereInput>,
    conditions: Vec<Condition>,
}

impl WhereInput {
    /// A filter matching every row of `entity`.
    #[must_use]
    pub const fn empty(entity: Entity) -> Self {
        Self {
            entity,
            and: Vec::new(),
            or: None,
            not: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Entity the filter applies to.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Children that must all match.
    #[must_use]
    pub fn and(&self) -> &[Self] {
        &self.and
    }

    /// Children of which at least one must match, when `OR` was supplied.
    ///
    /// An empty `OR` list matches nothing.
    #[must_use]
    pub fn or(&self) -> Option<&[Self]> {
        self.or.as_deref()
    }

    /// Children that must not match.
    #[must_use]
    pub fn not(&self) -> &[Self] {
        &self.not
    }

    /// Per-field conditions, in field-name order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// First condition on `field`, if any.
    #[must_use]
    pub fn condition(&self, field: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|condition| condition.field() == field)
    }

    /// Returns `true` when the filter places no constraint.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.and.is_empty()
            && self.or.is_none()
            && self.not.is_empty()
            && self.conditions.is_empty()
    }

    /// Rewrites the filter into a canonical form with the same row set.
    ///
    /// `AND` children without an `OR` are merged into the parent, repeated
    /// conditions and children are dropped, and conditions are ordered by
    /// field name. Filters on related rows are normalised the same way, so
    /// two filters that differ only in how they nest conjunctions, at any
    /// relation depth, normalise to equal values.
    #[must_use]
    pub fn normalize(self) -> Self {
        let mut merged = Self {
            entity: self.entity,
            and: Vec::new(),
            or: self.or.map(|children| dedup(children.into_iter().map(Self::normalize))),
            not: Vec::new(),
            conditions: Vec::new(),
        };
        merged.absorb(self.conditions, self.not);
        for child in self.and {
            let normalised = child.normalize();
            if normalised.or.is_none() {
                merged.absorb(normalised.conditions, normalised.not);
                merged.and.extend(normalised.and);
            } else {
                merged.and.push(normalised);
            }
        }
        merged.conditions = dedup(merged.conditions.into_iter().map(Condition::normalize));
        merged.conditions.sort_by_key(Condition::field);
        merged.and = dedup(merged.and);
        merged.not = dedup(merged.not.into_iter().map(Self::normalize));
        merged
    }

    fn absorb(&mut self, conditions: Vec<Condition>, not: Vec<Self>) {
        self.conditions.extend(conditions);
        self.not.extend(not);
    }
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique: Vec<T> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// Which fields a filter may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WhereScope<'a> {
    /// Scalar columns and relations.
    Full,
    /// Scalar columns only.
    ScalarOnly,
    /// Scalar columns with aggregate predicates; plain predicates only on
    /// the grouped columns in `by`.
    Having { by: &'a [&'static str] },
}

pub(crate) fn parse_where(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
    scope: WhereScope<'_>,
) -> Validated<WhereInput> {
    let fields = walker.object(value)?;
    let mut filter = WhereInput::empty(entity);
    for (key, argument) in fields {
        walker.at_key(key, |inner| apply_key(inner, &mut filter, key, argument, scope))?;
    }
    filter.conditions.sort_by_key(Condition::field);
    Ok(filter)
}

fn apply_key(
    walker: &mut Walker,
    filter: &mut WhereInput,
    key: &str,
    argument: &Value,
    scope: WhereScope<'_>,
) -> Validated<()> {
    let entity = filter.entity;
    let nested = |inner: &mut Walker, item: &Value| parse_where(inner, entity, item, scope);
    match key {
        "AND" => filter.and = walker.one_or_many(argument, nested)?,
        "OR" => {
            let children = walker.array(argument)?;
            filter.or = Some(walker.each(children, nested)?);
        }
        "NOT" => filter.not = walker.one_or_many(argument, nested)?,
        _ => {
            let condition = parse_condition(walker, entity, key, argument, scope)?;
            filter.conditions.push(condition);
        }
    }
    Ok(())
}

fn parse_condition(
    walker: &mut Walker,
    entity: Entity,
    key: &str,
    argument: &Value,
    scope: WhereScope<'_>,
) -> Validated<Condition> {
    let unknown = || ValidationErrorKind::UnknownField {
        entity,
        field: key.to_owned(),
    };
    match (entity.def().field(key), scope) {
        (None, _)
        | (
            Some(FieldKind::Relation(_)),
            WhereScope::ScalarOnly | WhereScope::Having { .. },
        ) => walker.fail(unknown()),
        (Some(FieldKind::Relation(relation)), WhereScope::Full) => {
            let filter = RelationFilter::parse(walker, relation, argument)?;
            Ok(Condition::Relation {
                field: relation.name,
                filter,
            })
        }
        (Some(FieldKind::Scalar(field)), WhereScope::Having { by }) => {
            let grouped = by.contains(&field.name);
            let filter = AggregateFilter::parse(walker, field, argument, grouped)?;
            Ok(Condition::Aggregate {
                field: field.name,
                filter,
            })
        }
        (Some(FieldKind::Scalar(field)), WhereScope::Full | WhereScope::ScalarOnly) => {
            let filter = FieldFilter::parse(walker, field, argument)?;
            Ok(Condition::Field {
                field: field.name,
                filter,
            })
        }
    }
}
