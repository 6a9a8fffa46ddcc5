//! Typed scalar values and the JSON null sentinels.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::ValidationErrorKind;
use crate::registry::ScalarType;
use crate::walk::{Validated, Walker};

/// A literal coerced to the type of the column it is compared with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Text.
    String(String),
    /// 32-bit integer.
    Int(i32),
    /// Any JSON number, kept exact.
    Float(Number),
    /// Boolean flag.
    Boolean(bool),
    /// Timestamp with the offset supplied by the caller.
    DateTime(DateTime<FixedOffset>),
    /// Arbitrary JSON document.
    Json(Value),
}

impl ScalarValue {
    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

/// Reserved strings that distinguish SQL NULL from JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NullSentinel {
    /// The column is SQL NULL.
    DbNull,
    /// The column holds the JSON literal `null`.
    JsonNull,
    /// Either of the above; only meaningful in filters.
    AnyNull,
}

impl NullSentinel {
    /// Recognises a sentinel string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DbNull" => Some(Self::DbNull),
            "JsonNull" => Some(Self::JsonNull),
            "AnyNull" => Some(Self::AnyNull),
            _ => None,
        }
    }

    /// Recognises a JSON string holding a sentinel.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }

    /// The sentinel as it appears in input.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DbNull => "DbNull",
            Self::JsonNull => "JsonNull",
            Self::AnyNull => "AnyNull",
        }
    }
}

/// Write intent for a nullable JSON column.
///
/// Keeps "leave unchanged", "store JSON `null`" and "store SQL NULL" apart
/// so the executor never has to guess.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum NullableJson {
    /// The payload does not touch the column.
    #[default]
    Unset,
    /// Store the document as-is.
    Literal(Value),
    /// Store the JSON literal `null`.
    JsonNull,
    /// Store SQL NULL.
    DbNull,
}

/// Maps a nullable JSON write value to its storage intent.
///
/// Absent input, JSON `null` and the `"DbNull"` sentinel all store SQL
/// NULL; `"JsonNull"` stores the JSON literal; anything else passes through.
///
/// # Examples
///
/// ```
/// use query_schema::{NullableJson, transform_json_null};
/// use serde_json::json;
///
/// assert_eq!(transform_json_null(None), NullableJson::DbNull);
/// assert_eq!(transform_json_null(Some(&json!("DbNull"))), NullableJson::DbNull);
/// assert_eq!(transform_json_null(Some(&json!("JsonNull"))), NullableJson::JsonNull);
/// assert_eq!(
///     transform_json_null(Some(&json!({"a": 1}))),
///     NullableJson::Literal(json!({"a": 1}))
/// );
/// ```
#[must_use]
pub fn transform_json_null(value: Option<&Value>) -> NullableJson {
    match value {
        None | Some(Value::Null) => NullableJson::DbNull,
        Some(other) => match NullSentinel::from_value(other) {
            Some(NullSentinel::DbNull) => NullableJson::DbNull,
            Some(NullSentinel::JsonNull) => NullableJson::JsonNull,
            _ => NullableJson::Literal(other.clone()),
        },
    }
}

/// Describes what a literal of `scalar` looks like, for error messages.
const fn expected_literal(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::String => "a string",
        ScalarType::Int => "a 32-bit integer",
        ScalarType::Float => "a number",
        ScalarType::Boolean => "a boolean",
        ScalarType::DateTime => "an RFC 3339 timestamp",
        ScalarType::Json => "a JSON value",
    }
}

/// Coerces a JSON literal to `scalar`.
///
/// Null sentinels are reported as misuse on every kind except strings,
/// where they are ordinary text, and JSON, whose filters handle them first.
pub(crate) fn coerce(walker: &Walker, scalar: ScalarType, value: &Value) -> Validated<ScalarValue> {
    let misused = NullSentinel::from_value(value)
        .filter(|_| !matches!(scalar, ScalarType::String | ScalarType::Json));
    if let Some(sentinel) = misused {
        return walker.fail(ValidationErrorKind::NullSentinelMisuse {
            sentinel: sentinel.as_str().to_owned(),
        });
    }
    let coerced = match (scalar, value) {
        (ScalarType::String, Value::String(text)) => Some(ScalarValue::String(text.clone())),
        (ScalarType::Int, Value::Number(number)) => number
            .as_i64()
            .and_then(|wide| i32::try_from(wide).ok())
            .map(ScalarValue::Int),
        (ScalarType::Float, Value::Number(number)) => Some(ScalarValue::Float(number.clone())),
        (ScalarType::Boolean, Value::Bool(flag)) => Some(ScalarValue::Boolean(*flag)),
        (ScalarType::DateTime, Value::String(text)) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(ScalarValue::DateTime),
        (ScalarType::Json, document) => Some(ScalarValue::Json(document.clone())),
        _ => None,
    };
    coerced.map_or_else(|| walker.invalid(expected_literal(scalar)), Ok)
}

/// Coerces every element of a JSON array to `scalar`.
pub(crate) fn coerce_list(
    walker: &mut Walker,
    scalar: ScalarType,
    value: &Value,
) -> Validated<Vec<ScalarValue>> {
    let items = walker.array(value)?;
    walker.each(items, |inner, item| coerce(inner, scalar, item))
}
