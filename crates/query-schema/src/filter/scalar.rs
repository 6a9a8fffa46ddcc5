//! Predicates over a single scalar column.

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationErrorKind;
use crate::registry::{ScalarField, ScalarType};
use crate::value::{ScalarValue, coerce, coerce_list};
use crate::walk::{Validated, Walker};

/// Type information a predicate is checked against.
///
/// Usually derived from a catalogue column, but aggregate filters use
/// synthetic operands (for example `_avg` is always a nullable float).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Operand {
    pub(crate) scalar: ScalarType,
    pub(crate) nullable: bool,
}

impl Operand {
    pub(crate) const fn of(field: &ScalarField) -> Self {
        Self {
            scalar: field.scalar,
            nullable: field.nullable,
        }
    }

    pub(crate) const fn new(scalar: ScalarType, nullable: bool) -> Self {
        Self { scalar, nullable }
    }

    pub(crate) fn describe(self) -> String {
        if self.nullable {
            format!("nullable {}", self.scalar)
        } else {
            self.scalar.to_string()
        }
    }
}

/// String comparison mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMode {
    /// Compare with the database collation.
    #[default]
    Default,
    /// Compare ignoring case.
    Insensitive,
}

/// One comparison of a column against a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    /// Equal to the value; `None` matches SQL NULL.
    Equals(Option<ScalarValue>),
    /// Equal to any listed value.
    In(Vec<ScalarValue>),
    /// Equal to none of the listed values.
    NotIn(Vec<ScalarValue>),
    /// Strictly less than.
    Lt(ScalarValue),
    /// Less than or equal.
    Lte(ScalarValue),
    /// Strictly greater than.
    Gt(ScalarValue),
    /// Greater than or equal.
    Gte(ScalarValue),
    /// Contains the substring.
    Contains(String),
    /// Starts with the prefix.
    StartsWith(String),
    /// Ends with the suffix.
    EndsWith(String),
    /// Matches a full-text search expression.
    Search(String),
}

/// Conjunction of comparisons on one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScalarFilter {
    /// Comparisons, all of which must hold.
    pub comparisons: Vec<Comparison>,
    /// Case handling for string comparisons.
    pub mode: QueryMode,
    /// Negated predicate, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<NotFilter>>,
}

/// Argument of a `not` operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NotFilter {
    /// `not: literal`, shorthand for `not: { equals: literal }`.
    Equals(Option<ScalarValue>),
    /// `not: { ... }`.
    Filter(ScalarFilter),
}

impl ScalarFilter {
    /// A filter holding a single equality comparison.
    #[must_use]
    pub fn equals(value: Option<ScalarValue>) -> Self {
        Self {
            comparisons: vec![Comparison::Equals(value)],
            ..Self::default()
        }
    }

    pub(crate) fn parse(walker: &mut Walker, operand: Operand, value: &Value) -> Validated<Self> {
        let Value::Object(operators) = value else {
            return parse_equals(walker, operand, value).map(Self::equals);
        };
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
            "equals" => Comparison::Equals(parse_equals(walker, operand, argument)?),
            "in" => Comparison::In(coerce_list(walker, operand.scalar, argument)?),
            "notIn" => Comparison::NotIn(coerce_list(walker, operand.scalar, argument)?),
            "lt" => Comparison::Lt(ordered(walker, operand, operator, argument)?),
            "lte" => Comparison::Lte(ordered(walker, operand, operator, argument)?),
            "gt" => Comparison::Gt(ordered(walker, operand, operator, argument)?),
            "gte" => Comparison::Gte(ordered(walker, operand, operator, argument)?),
            "contains" => Comparison::Contains(text(walker, operand, operator, argument)?),
            "startsWith" => Comparison::StartsWith(text(walker, operand, operator, argument)?),
            "endsWith" => Comparison::EndsWith(text(walker, operand, operator, argument)?),
            "search" => Comparison::Search(text(walker, operand, operator, argument)?),
            "mode" => {
                self.mode = parse_mode(walker, operand, argument)?;
                return Ok(());
            }
            "not" => {
                self.not = Some(Box::new(NotFilter::parse(walker, operand, argument)?));
                return Ok(());
            }
            _ => return mismatch(walker, operator, operand.describe()),
        };
        self.comparisons.push(comparison);
        Ok(())
    }
}

impl NotFilter {
    fn parse(walker: &mut Walker, operand: Operand, value: &Value) -> Validated<Self> {
        if value.is_object() {
            ScalarFilter::parse(walker, operand, value).map(Self::Filter)
        } else {
            parse_equals(walker, operand, value).map(Self::Equals)
        }
    }
}

pub(crate) fn mismatch<T>(walker: &Walker, operator: &str, kind: String) -> Validated<T> {
    walker.fail(ValidationErrorKind::OperatorMismatch {
        operator: operator.to_owned(),
        kind,
    })
}

fn parse_equals(
    walker: &Walker,
    operand: Operand,
    value: &Value,
) -> Validated<Option<ScalarValue>> {
    match value {
        Value::Null if operand.nullable => Ok(None),
        Value::Null => walker.invalid(format!("a non-null {}", operand.scalar)),
        literal => coerce(walker, operand.scalar, literal).map(Some),
    }
}

fn ordered(
    walker: &Walker,
    operand: Operand,
    operator: &str,
    value: &Value,
) -> Validated<ScalarValue> {
    if !operand.scalar.is_ordered() {
        return mismatch(walker, operator, operand.describe());
    }
    coerce(walker, operand.scalar, value)
}

fn text(walker: &Walker, operand: Operand, operator: &str, value: &Value) -> Validated<String> {
    if operand.scalar != ScalarType::String {
        return mismatch(walker, operator, operand.describe());
    }
    walker.string(value).map(str::to_owned)
}

pub(crate) fn parse_mode(walker: &Walker, operand: Operand, value: &Value) -> Validated<QueryMode> {
    let mode = match value.as_str() {
        Some("default") => QueryMode::Default,
        Some("insensitive") => QueryMode::Insensitive,
        _ => return walker.invalid("'default' or 'insensitive'"),
    };
    match (operand.scalar, mode) {
        (ScalarType::String, _) => Ok(mode),
        (_, QueryMode::Insensitive) => {
            walker.fail(ValidationErrorKind::InsensitiveModeOutsideString {
                kind: operand.describe(),
            })
        }
        (_, QueryMode::Default) => mismatch(walker, "mode", operand.describe()),
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

    const TEXT: Operand = Operand::new(ScalarType::String, false);
    const OPTIONAL_TEXT: Operand = Operand::new(ScalarType::String, true);
    const INT: Operand = Operand::new(ScalarType::Int, false);
    const FLAG: Operand = Operand::new(ScalarType::Boolean, false);

    fn parse(operand: Operand, value: &Value) -> Validated<ScalarFilter> {
        ScalarFilter::parse(&mut Walker::new(ValidationLimits::default()), operand, value)
    }

    #[test]
    fn literal_is_shorthand_for_equals() {
        let filter = parse(TEXT, &json!("rust")).expect("valid filter");

        assert_eq!(
            filter,
            ScalarFilter::equals(Some(ScalarValue::String("rust".to_owned())))
        );
    }

    #[test]
    fn collects_string_operators_and_mode() {
        let filter = parse(
            OPTIONAL_TEXT,
            &json!({"contains": "rs", "startsWith": "r", "mode": "insensitive", "not": null}),
        )
        .expect("valid filter");

        assert_eq!(filter.mode, QueryMode::Insensitive);
        assert_eq!(
            filter.comparisons,
            [
                Comparison::Contains("rs".to_owned()),
                Comparison::StartsWith("r".to_owned()),
            ]
        );
        assert_eq!(filter.not.as_deref(), Some(&NotFilter::Equals(None)));
    }

    #[test]
    fn nested_not_recurses() {
        let filter = parse(INT, &json!({"not": {"gt": 3, "not": 7}})).expect("valid filter");

        let Some(NotFilter::Filter(inner)) = filter.not.as_deref() else {
            panic!("expected nested filter");
        };
        assert_eq!(inner.comparisons, [Comparison::Gt(ScalarValue::Int(3))]);
        assert_eq!(
            inner.not.as_deref(),
            Some(&NotFilter::Equals(Some(ScalarValue::Int(7))))
        );
    }

    #[rstest]
    #[case::contains_on_int(INT, json!({"contains": "1"}), "operator_mismatch", "contains")]
    #[case::ordering_on_bool(FLAG, json!({"gt": true}), "operator_mismatch", "gt")]
    #[case::insensitive_on_int(
        INT,
        json!({"mode": "insensitive"}),
        "insensitive_mode_outside_string",
        "mode"
    )]
    #[case::null_on_required(TEXT, json!({"equals": null}), "invalid_value", "equals")]
    #[case::unknown_operator(TEXT, json!({"has": "x"}), "operator_mismatch", "has")]
    #[case::bad_mode(TEXT, json!({"mode": "loose"}), "invalid_value", "mode")]
    fn rejects_invalid_operators(
        #[case] operand: Operand,
        #[case] input: Value,
        #[case] code: &str,
        #[case] path: &str,
    ) {
        let err = parse(operand, &input).expect_err("invalid filter");

        assert_eq!(err.code(), code);
        assert_eq!(err.path.to_string(), path);
    }

    #[test]
    fn in_list_reports_element_index() {
        let err = parse(INT, &json!({"in": [1, "two"]})).expect_err("invalid element");

        assert_eq!(err.path.to_string(), "in[1]");
    }
}
