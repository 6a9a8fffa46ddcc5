//! Lookups that identify at most one row.
//!
//! A lookup must name at least one complete unique key: the primary key, a
//! single-column unique such as `email`, or every column of a compound key.
//! Compound keys are accepted nested under their name
//! (`{"url_userId": {"url": .., "userId": ..}}`) or flat
//! (`{"url": .., "userId": ..}`). Anything else in the object is an
//! ordinary filter on the located row.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{WhereInput, WhereScope, parse_where};
use crate::error::ValidationErrorKind;
use crate::registry::{Entity, EntityDef, UniqueKey};
use crate::value::{ScalarValue, coerce};
use crate::walk::{Validated, Walker};

/// A complete unique key with its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueSelector {
    /// Name of the unique key.
    pub key: &'static str,
    /// Value of every key column.
    pub values: BTreeMap<&'static str, ScalarValue>,
}

/// Validated single-row lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhereUniqueInput {
    entity: Entity,
    selectors: Vec<UniqueSelector>,
    #[serde(rename = "where", skip_serializing_if = "WhereInput::is_empty")]
    filter: WhereInput,
}

impl WhereUniqueInput {
    /// Entity the lookup applies to.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Every complete unique key supplied, in catalogue order.
    #[must_use]
    pub fn selectors(&self) -> &[UniqueSelector] {
        &self.selectors
    }

    /// The first complete unique key supplied.
    #[must_use]
    pub fn selector(&self) -> Option<&UniqueSelector> {
        self.selectors.first()
    }

    /// Additional conditions the located row must satisfy.
    #[must_use]
    pub const fn filter(&self) -> &WhereInput {
        &self.filter
    }
}

/// How far a flat compound key got.
struct PartialKey {
    key: &'static UniqueKey,
    missing: Vec<&'static str>,
}

pub(crate) fn parse_where_unique(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
) -> Validated<WhereUniqueInput> {
    let def = entity.def();
    let fields = walker.object(value)?;
    let mut selectors = Vec::new();
    let mut consumed: Vec<&str> = Vec::new();
    let mut partial: Option<PartialKey> = None;

    for key in def.unique_keys {
        if let Some(nested) = fields.get(key.name).filter(|_| key.is_compound()) {
            let selector = walker.at_key(key.name, |inner| nested_key(inner, def, key, nested))?;
            selectors.push(selector);
            consumed.push(key.name);
            continue;
        }
        let present: Vec<&'static str> = key
            .fields
            .iter()
            .copied()
            .filter(|field| fields.get(*field).is_some_and(is_key_literal))
            .collect();
        if present.len() == key.fields.len() {
            selectors.push(flat_key(walker, def, key, fields)?);
            consumed.extend(key.fields.iter().copied());
        } else if !present.is_empty() && partial.is_none() {
            let missing = key
                .fields
                .iter()
                .copied()
                .filter(|field| !present.contains(field))
                .collect();
            partial = Some(PartialKey { key, missing });
        }
    }

    if selectors.is_empty() {
        return walker.fail(match partial {
            Some(PartialKey { key, missing }) => ValidationErrorKind::IncompleteCompoundKey {
                key: key.name,
                missing,
            },
            None => ValidationErrorKind::MissingUniqueKey {
                expected: def.unique_keys.iter().map(|key| key.name).collect(),
            },
        });
    }

    let remaining: Map<String, Value> = fields
        .iter()
        .filter(|(name, _)| !consumed.contains(&name.as_str()))
        .map(|(name, argument)| (name.clone(), argument.clone()))
        .collect();
    let filter = parse_where(walker, entity, &Value::Object(remaining), WhereScope::Full)?;
    Ok(WhereUniqueInput {
        entity,
        selectors,
        filter,
    })
}

/// Literal values identify rows; objects and `null` are filters.
const fn is_key_literal(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Null)
}

fn flat_key(
    walker: &mut Walker,
    def: &EntityDef,
    key: &'static UniqueKey,
    fields: &Map<String, Value>,
) -> Validated<UniqueSelector> {
    let mut values = BTreeMap::new();
    for field in key.fields {
        let Some(argument) = fields.get(*field) else {
            return walker.fail(ValidationErrorKind::IncompleteCompoundKey {
                key: key.name,
                missing: vec![*field],
            });
        };
        let value = walker.at_key(field, |inner| key_value(inner, def, field, argument))?;
        values.insert(*field, value);
    }
    Ok(UniqueSelector {
        key: key.name,
        values,
    })
}

fn nested_key(
    walker: &mut Walker,
    def: &EntityDef,
    key: &'static UniqueKey,
    value: &Value,
) -> Validated<UniqueSelector> {
    let supplied = walker.object(value)?;
    if let Some(unknown) = supplied
        .keys()
        .find(|name| !key.fields.contains(&name.as_str()))
    {
        return walker.at_key(unknown, |inner| {
            inner.fail(ValidationErrorKind::UnknownField {
                entity: def.entity,
                field: unknown.clone(),
            })
        });
    }
    let missing: Vec<&'static str> = key
        .fields
        .iter()
        .copied()
        .filter(|field| !supplied.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return walker.fail(ValidationErrorKind::IncompleteCompoundKey {
            key: key.name,
            missing,
        });
    }
    flat_key(walker, def, key, supplied)
}

fn key_value(
    walker: &Walker,
    def: &EntityDef,
    field: &str,
    argument: &Value,
) -> Validated<ScalarValue> {
    let Some(column) = def.scalar(field) else {
        return walker.fail(ValidationErrorKind::UnknownField {
            entity: def.entity,
            field: field.to_owned(),
        });
    };
    if argument.is_null() {
        return walker.invalid(format!("a non-null {}", column.scalar));
    }
    coerce(walker, column.scalar, argument)
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "test code uses expect for clear failure messages"
    )]

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::limits::ValidationLimits;

    fn parse(entity: Entity, value: &Value) -> Validated<WhereUniqueInput> {
        parse_where_unique(&mut Walker::new(ValidationLimits::default()), entity, value)
    }

    fn text(value: &str) -> ScalarValue {
        ScalarValue::String(value.to_owned())
    }

    #[rstest]
    #[case::flat(json!({"url": "https://x", "userId": "u1"}))]
    #[case::nested(json!({"url_userId": {"url": "https://x", "userId": "u1"}}))]
    fn resolves_bookmark_compound_key(#[case] input: Value) {
        let lookup = parse(Entity::Bookmark, &input).expect("complete key");

        let selector = lookup.selector().expect("selector");
        assert_eq!(selector.key, "url_userId");
        assert_eq!(selector.values.get("url"), Some(&text("https://x")));
        assert_eq!(selector.values.get("userId"), Some(&text("u1")));
        assert!(lookup.filter().is_empty());
    }

    #[test]
    fn partial_compound_key_is_rejected() {
        let err = parse(Entity::Bookmark, &json!({"url": "https://x"})).expect_err("partial key");

        assert_eq!(
            err.kind,
            ValidationErrorKind::IncompleteCompoundKey {
                key: "url_userId",
                missing: vec!["userId"],
            }
        );
    }

    #[test]
    fn nested_compound_key_must_be_complete() {
        let err = parse(Entity::Bookmark, &json!({"url_userId": {"url": "https://x"}}))
            .expect_err("partial nested key");

        assert_eq!(err.code(), "incomplete_compound_key");
        assert_eq!(err.path.to_string(), "url_userId");
    }

    #[test]
    fn remaining_keys_become_filters() {
        let lookup = parse(
            Entity::Bookmark,
            &json!({"id": "b1", "url": "https://x", "archived": false}),
        )
        .expect("id lookup");

        assert_eq!(lookup.selectors().len(), 1);
        assert_eq!(lookup.selector().map(|selector| selector.key), Some("id"));
        assert!(lookup.filter().condition("url").is_some());
        assert!(lookup.filter().condition("archived").is_some());
    }

    #[test]
    fn filter_objects_do_not_count_as_keys() {
        let err = parse(Entity::User, &json!({"email": {"contains": "@"}}))
            .expect_err("filters are not keys");

        assert_eq!(
            err.kind,
            ValidationErrorKind::MissingUniqueKey {
                expected: vec!["id", "email"],
            }
        );
    }

    #[test]
    fn join_entity_requires_both_sides() {
        let lookup = parse(
            Entity::BookmarkTag,
            &json!({"bookmarkId_tagId": {"bookmarkId": "b1", "tagId": "t1"}}),
        )
        .expect("join key");
        assert_eq!(lookup.selectors().len(), 1);

        let err =
            parse(Entity::BookmarkTag, &json!({"tagId": "t1"})).expect_err("partial join key");
        assert_eq!(err.code(), "incomplete_compound_key");
    }

    #[test]
    fn nested_key_rejects_foreign_columns() {
        let err = parse(
            Entity::Bookmark,
            &json!({"url_userId": {"url": "https://x", "userId": "u1", "title": "t"}}),
        )
        .expect_err("unknown column in key");

        assert_eq!(err.code(), "unknown_field");
        assert_eq!(err.path.to_string(), "url_userId.title");
    }
}
