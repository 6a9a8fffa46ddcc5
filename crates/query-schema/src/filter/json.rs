//! Predicates over JSON columns.

use serde::Serialize;
use serde_json::Value;

use super::scalar::{Operand, mismatch, parse_mode};
use crate::error::ValidationErrorKind;
use crate::value::NullSentinel;
use crate::walk::{Validated, Walker};

/// Right-hand side of a JSON equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum JsonFilterValue {
    /// A literal document.
    Value(Value),
    /// Rows holding the JSON literal `null`.
    JsonNull,
    /// Rows where the column is SQL NULL.
    DbNull,
    /// Rows matching either null form.
    AnyNull,
}

/// One comparison inside a JSON filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonComparison {
    /// Equal to the value or null form.
    Equals(JsonFilterValue),
    /// String at the path contains the text.
    StringContains(String),
    /// String at the path starts with the text.
    StringStartsWith(String),
    /// String at the path ends with the text.
    StringEndsWith(String),
    /// Array at the path contains the value.
    ArrayContains(Value),
    /// Array at the path starts with the value.
    ArrayStartsWith(Value),
    /// Array at the path ends with the value.
    ArrayEndsWith(Value),
    /// Value at the path is less than.
    Lt(Value),
    /// Value at the path is less than or equal.
    Lte(Value),
    /// Value at the path is greater than.
    Gt(Value),
    /// Value at the path is greater than or equal.
    Gte(Value),
}

/// Conjunction of comparisons on one JSON column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JsonFilter {
    /// Keys and indices selecting a sub-document; empty means the whole column.
    pub path: Vec<String>,
    /// Comparisons, all of which must hold.
    pub comparisons: Vec<JsonComparison>,
    /// Negated equality, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<JsonFilterValue>,
}

impl JsonFilter {
    pub(crate) fn parse(walker: &mut Walker, operand: Operand, value: &Value) -> Validated<Self> {
        let operators = walker.object(value)?;
        let mut filter = Self::default();
        for (operator, argument) in operators {
            walker.at_key(operator, |inner| filter.apply(inner, operand, operator, argument))?;
        }
        Ok(filter)
    }

    fn apply(
        &mut self,
        walker: &mut Walker,
        operand: Operand,
        operator: &str,
        argument: &Value,
    ) -> Validated<()> {
        let comparison = match operator {
            "equals" => JsonComparison::Equals(filter_value(walker, operand, argument)?),
            "string_contains" => JsonComparison::StringContains(owned_text(walker, argument)?),
            "string_starts_with" => {
                JsonComparison::StringStartsWith(owned_text(walker, argument)?)
            }
            "string_ends_with" => JsonComparison::StringEndsWith(owned_text(walker, argument)?),
            "array_contains" => JsonComparison::ArrayContains(argument.clone()),
            "array_starts_with" => JsonComparison::ArrayStartsWith(argument.clone()),
            "array_ends_with" => JsonComparison::ArrayEndsWith(argument.clone()),
            "lt" => JsonComparison::Lt(comparable(walker, argument)?),
            "lte" => JsonComparison::Lte(comparable(walker, argument)?),
            "gt" => JsonComparison::Gt(comparable(walker, argument)?),
            "gte" => JsonComparison::Gte(comparable(walker, argument)?),
            "path" => {
                self.path = json_path(walker, argument)?;
                return Ok(());
            }
            "not" => {
                self.not = Some(filter_value(walker, operand, argument)?);
                return Ok(());
            }
            "mode" => {
                parse_mode(walker, operand, argument)?;
                return Ok(());
            }
            _ => return mismatch(walker, operator, operand.describe()),
        };
        self.comparisons.push(comparison);
        Ok(())
    }
}

/// Reads an equality argument, honouring the null sentinels.
///
/// `DbNull` and `AnyNull` only make sense on nullable columns; a bare JSON
/// `null` is ambiguous and rejected in favour of an explicit sentinel.
fn filter_value(walker: &Walker, operand: Operand, value: &Value) -> Validated<JsonFilterValue> {
    if value.is_null() {
        return walker.invalid("a JSON value or one of 'JsonNull', 'DbNull', 'AnyNull'");
    }
    match NullSentinel::from_value(value) {
        None => Ok(JsonFilterValue::Value(value.clone())),
        Some(NullSentinel::JsonNull) => Ok(JsonFilterValue::JsonNull),
        Some(sentinel) if !operand.nullable => {
            walker.fail(ValidationErrorKind::NullSentinelMisuse {
                sentinel: sentinel.as_str().to_owned(),
            })
        }
        Some(NullSentinel::DbNull) => Ok(JsonFilterValue::DbNull),
        Some(NullSentinel::AnyNull) => Ok(JsonFilterValue::AnyNull),
    }
}

fn owned_text(walker: &Walker, value: &Value) -> Validated<String> {
    walker.string(value).map(str::to_owned)
}

fn comparable(walker: &Walker, value: &Value) -> Validated<Value> {
    match value {
        Value::Number(_) | Value::String(_) => Ok(value.clone()),
        _ => walker.invalid("a number or a string"),
    }
}

fn json_path(walker: &mut Walker, value: &Value) -> Validated<Vec<String>> {
    let segments = walker.array(value)?;
    walker.each(segments, |inner, segment| {
        inner.string(segment).map(str::to_owned)
    })
}
