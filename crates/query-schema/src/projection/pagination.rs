//! Windowing arguments of list queries.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationErrorKind;
use crate::filter::{WhereUniqueInput, parse_where_unique};
use crate::registry::{Entity, FieldKind};
use crate::walk::{Validated, Walker};

/// `take`, `skip`, `cursor` and `distinct`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Number of rows to return; negative values page backwards from the
    /// cursor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
    /// Number of rows to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    /// Row to start from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<WhereUniqueInput>,
    /// Columns whose value combinations must be unique in the result.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub distinct: Vec<&'static str>,
}

impl Pagination {
    /// Returns `true` when no windowing argument was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.take.is_none()
            && self.skip.is_none()
            && self.cursor.is_none()
            && self.distinct.is_empty()
    }

    pub(crate) fn parse(
        walker: &mut Walker,
        entity: Entity,
        arguments: &Map<String, Value>,
    ) -> Validated<Self> {
        let mut pagination = Self::default();
        if let Some(value) = arguments.get("take") {
            pagination.take = Some(walker.at_key("take", |inner| parse_take(inner, value))?);
        }
        if let Some(value) = arguments.get("skip") {
            pagination.skip = Some(walker.at_key("skip", |inner| parse_skip(inner, value))?);
        }
        if let Some(value) = arguments.get("cursor") {
            pagination.cursor = Some(walker.at_key("cursor", |inner| {
                parse_where_unique(inner, entity, value)
            })?);
        }
        if let Some(value) = arguments.get("distinct") {
            pagination.distinct = walker.at_key("distinct", |inner| {
                inner.one_or_many(value, |item_walker, item| scalar_name(item_walker, entity, item))
            })?;
        }
        Ok(pagination)
    }
}

pub(crate) fn parse_take(walker: &Walker, value: &Value) -> Validated<i64> {
    value.as_i64().map_or_else(|| walker.invalid("an integer"), Ok)
}

pub(crate) fn parse_skip(walker: &Walker, value: &Value) -> Validated<u64> {
    value
        .as_u64()
        .map_or_else(|| walker.invalid("a non-negative integer"), Ok)
}

/// Resolves a column name, rejecting relations and unknown names.
pub(crate) fn scalar_name(
    walker: &Walker,
    entity: Entity,
    value: &Value,
) -> Validated<&'static str> {
    let name = walker.string(value)?;
    match entity.def().field(name) {
        Some(FieldKind::Scalar(field)) => Ok(field.name),
        Some(FieldKind::Relation(_)) => {
            walker.invalid(format!("a scalar field, not relation '{name}'"))
        }
        None => walker.fail(ValidationErrorKind::UnknownField {
            entity,
            field: name.to_owned(),
        }),
    }
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

    fn parse(value: &Value) -> Validated<Pagination> {
        let Value::Object(arguments) = value else {
            panic!("pagination fixtures are objects");
        };
        Pagination::parse(
            &mut Walker::new(ValidationLimits::default()),
            Entity::FeedEntry,
            arguments,
        )
    }

    #[test]
    fn reads_every_window_argument() {
        let pagination = parse(&json!({
            "take": -10,
            "skip": 5,
            "cursor": {"id": "e1"},
            "distinct": ["feedId", "author"],
        }))
        .expect("valid pagination");

        assert_eq!(pagination.take, Some(-10));
        assert_eq!(pagination.skip, Some(5));
        assert!(pagination.cursor.is_some());
        assert_eq!(pagination.distinct, ["feedId", "author"]);
    }

    #[rstest]
    #[case::negative_skip(json!({"skip": -1}), "invalid_value", "skip")]
    #[case::fractional_take(json!({"take": 1.5}), "invalid_value", "take")]
    #[case::cursor_without_key(json!({"cursor": {"title": "x"}}), "missing_unique_key", "cursor")]
    #[case::distinct_relation(json!({"distinct": "feed"}), "invalid_value", "distinct")]
    #[case::distinct_unknown(json!({"distinct": ["nope"]}), "unknown_field", "distinct[0]")]
    fn rejects_invalid_windows(#[case] input: Value, #[case] code: &str, #[case] path: &str) {
        let err = parse(&input).expect_err("invalid pagination");

        assert_eq!(err.code(), code);
        assert_eq!(err.path.to_string(), path);
    }
}
