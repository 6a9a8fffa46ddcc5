//! Field selection and relation inclusion.
//!
//! `_count` is a reserved key in both shapes: no entity declares a field
//! with that name, so relation counts never collide with real columns.

use serde::Serialize;
use serde_json::{Map, Value};

use super::find::{ArgsScope, FindManyArgs};
use crate::error::ValidationErrorKind;
use crate::filter::{WhereInput, WhereScope, parse_where};
use crate::registry::{Entity, FieldKind, RelationField};
use crate::walk::{Validated, Walker};

/// Reserved key for relation counts.
pub const COUNT_KEY: &str = "_count";

/// Which columns and relations a query materialises.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Projection {
    /// Every scalar column, no relations.
    #[default]
    Default,
    /// Exactly the listed fields.
    Select(Select),
    /// Every scalar column plus the listed relations.
    Include(Include),
}

/// A related entity to materialise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationSelection {
    /// Relation name.
    pub field: &'static str,
    /// Entity on the far side.
    pub target: Entity,
    /// Nested arguments, or `None` for the default shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Box<FindManyArgs>>,
}

/// A to-many relation whose rows are counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountedRelation {
    /// Relation name.
    pub field: &'static str,
    /// Only rows matching this filter are counted.
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<WhereInput>,
}

/// The `_count` projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CountSelection {
    /// Count every to-many relation.
    All,
    /// Count the listed relations.
    Relations(Vec<CountedRelation>),
}

/// Explicit list of fields to materialise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Select {
    /// Entity selected from.
    pub entity: Entity,
    /// Selected scalar columns.
    pub scalars: Vec<&'static str>,
    /// Selected relations.
    pub relations: Vec<RelationSelection>,
    /// Relation counts.
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<CountSelection>,
}

/// Relations materialised alongside every scalar column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Include {
    /// Entity included from.
    pub entity: Entity,
    /// Included relations.
    pub relations: Vec<RelationSelection>,
    /// Relation counts.
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<CountSelection>,
}

impl Select {
    /// Returns `true` when `field` is a selected scalar column.
    #[must_use]
    pub fn selects(&self, field: &str) -> bool {
        self.scalars.contains(&field)
    }

    /// The selection for `relation`, if it is selected.
    #[must_use]
    pub fn relation(&self, relation: &str) -> Option<&RelationSelection> {
        self.relations.iter().find(|selection| selection.field == relation)
    }
}

impl Include {
    /// The selection for `relation`, if it is included.
    #[must_use]
    pub fn relation(&self, relation: &str) -> Option<&RelationSelection> {
        self.relations.iter().find(|selection| selection.field == relation)
    }
}

#[derive(Default)]
struct Entries {
    scalars: Vec<&'static str>,
    relations: Vec<RelationSelection>,
    count: Option<CountSelection>,
}

pub(crate) fn parse_select(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
) -> Validated<Select> {
    let fields = walker.object(value)?;
    let entries = parse_entries(walker, entity, fields, true)?;
    Ok(Select {
        entity,
        scalars: entries.scalars,
        relations: entries.relations,
        count: entries.count,
    })
}

pub(crate) fn parse_include(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
) -> Validated<Include> {
    let fields = walker.object(value)?;
    let entries = parse_entries(walker, entity, fields, false)?;
    Ok(Include {
        entity,
        relations: entries.relations,
        count: entries.count,
    })
}

fn parse_entries(
    walker: &mut Walker,
    entity: Entity,
    fields: &Map<String, Value>,
    allow_scalars: bool,
) -> Validated<Entries> {
    let mut entries = Entries::default();
    for (key, argument) in fields {
        walker.at_key(key, |inner| {
            if key == COUNT_KEY {
                entries.count = parse_count(inner, entity, argument)?;
                return Ok(());
            }
            match entity.def().field(key) {
                Some(FieldKind::Scalar(field)) if allow_scalars => {
                    if inner.boolean(argument)? {
                        entries.scalars.push(field.name);
                    }
                }
                Some(FieldKind::Relation(relation)) => {
                    if let Some(selection) = parse_relation(inner, relation, argument)? {
                        entries.relations.push(selection);
                    }
                }
                _ => {
                    return inner.fail(ValidationErrorKind::UnknownField {
                        entity,
                        field: key.clone(),
                    });
                }
            }
            Ok(())
        })?;
    }
    Ok(entries)
}

fn parse_relation(
    walker: &mut Walker,
    relation: &RelationField,
    value: &Value,
) -> Validated<Option<RelationSelection>> {
    let args = match value {
        Value::Bool(false) => return Ok(None),
        Value::Bool(true) => None,
        Value::Object(_) => {
            let scope = if relation.cardinality.is_many() {
                ArgsScope::ToMany
            } else {
                ArgsScope::ToOne
            };
            Some(Box::new(FindManyArgs::parse(
                walker,
                relation.target,
                value,
                scope,
            )?))
        }
        _ => return walker.invalid("true, false or a nested arguments object"),
    };
    Ok(Some(RelationSelection {
        field: relation.name,
        target: relation.target,
        args,
    }))
}

fn parse_count(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
) -> Validated<Option<CountSelection>> {
    let arguments = match value {
        Value::Bool(true) => return Ok(Some(CountSelection::All)),
        Value::Bool(false) => return Ok(None),
        Value::Object(arguments) => arguments,
        _ => return walker.invalid("true, false or { select }"),
    };
    reject_unknown_arguments(walker, arguments, &["select"])?;
    let Some(selected) = arguments.get("select") else {
        return Ok(Some(CountSelection::All));
    };
    let counted = walker.at_key("select", |inner| {
        let relations = inner.object(selected)?;
        let mut listed = Vec::with_capacity(relations.len());
        for (name, argument) in relations {
            let relation = inner.at_key(name, |item_walker| {
                counted_relation(item_walker, entity, name, argument)
            })?;
            listed.extend(relation);
        }
        Ok(listed)
    })?;
    Ok(Some(CountSelection::Relations(counted)))
}

fn counted_relation(
    walker: &mut Walker,
    entity: Entity,
    name: &str,
    value: &Value,
) -> Validated<Option<CountedRelation>> {
    let relation = match entity.def().field(name) {
        Some(FieldKind::Relation(relation)) if relation.cardinality.is_many() => relation,
        Some(_) => return walker.invalid("a to-many relation"),
        None => {
            return walker.fail(ValidationErrorKind::UnknownField {
                entity,
                field: name.to_owned(),
            });
        }
    };
    let filter = match value {
        Value::Bool(false) => return Ok(None),
        Value::Bool(true) => None,
        Value::Object(arguments) => {
            reject_unknown_arguments(walker, arguments, &["where"])?;
            arguments
                .get("where")
                .map(|filter| {
                    walker.at_key("where", |inner| {
                        parse_where(inner, relation.target, filter, WhereScope::Full)
                    })
                })
                .transpose()?
        }
        _ => return walker.invalid("true, false or { where }"),
    };
    Ok(Some(CountedRelation {
        field: relation.name,
        filter,
    }))
}

/// Fails on the first key not listed in `allowed`.
pub(crate) fn reject_unknown_arguments(
    walker: &mut Walker,
    arguments: &Map<String, Value>,
    allowed: &[&str],
) -> Validated<()> {
    let Some(unknown) = arguments
        .keys()
        .find(|key| !allowed.contains(&key.as_str()))
    else {
        return Ok(());
    };
    walker.at_key(unknown, |inner| {
        inner.fail(ValidationErrorKind::UnknownArgument {
            argument: unknown.clone(),
        })
    })
}
