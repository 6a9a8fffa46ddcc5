//! Predicates over list columns.

use serde::Serialize;
use serde_json::Value;

use super::scalar::mismatch;
use crate::registry::ScalarField;
use crate::value::{ScalarValue, coerce, coerce_list};
use crate::walk::{Validated, Walker};

/// One membership or containment test on a list column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListComparison {
    /// The list equals the given elements in order.
    Equals(Vec<ScalarValue>),
    /// The list contains the element.
    Has(ScalarValue),
    /// The list contains every element.
    HasEvery(Vec<ScalarValue>),
    /// The list contains at least one element.
    HasSome(Vec<ScalarValue>),
    /// The list is (or is not) empty.
    IsEmpty(bool),
}

/// Conjunction of tests on one list column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListFilter {
    /// Tests, all of which must hold.
    pub comparisons: Vec<ListComparison>,
}

impl ListFilter {
    pub(crate) fn parse(
        walker: &mut Walker,
        field: &ScalarField,
        value: &Value,
    ) -> Validated<Self> {
        let operators = walker.object(value)?;
        let mut comparisons = Vec::with_capacity(operators.len());
        for (operator, argument) in operators {
            let comparison =
                walker.at_key(operator, |inner| comparison(inner, field, operator, argument))?;
            comparisons.push(comparison);
        }
        Ok(Self { comparisons })
    }
}

fn comparison(
    walker: &mut Walker,
    field: &ScalarField,
    operator: &str,
    argument: &Value,
) -> Validated<ListComparison> {
    let element = field.scalar;
    Ok(match operator {
        "equals" => ListComparison::Equals(coerce_list(walker, element, argument)?),
        "has" => ListComparison::Has(coerce(walker, element, argument)?),
        "hasEvery" => ListComparison::HasEvery(coerce_list(walker, element, argument)?),
        "hasSome" => ListComparison::HasSome(coerce_list(walker, element, argument)?),
        "isEmpty" => ListComparison::IsEmpty(walker.boolean(argument)?),
        _ => return mismatch(walker, operator, format!("{element}[]")),
    })
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "test code uses expect for clear failure messages"
    )]

    use serde_json::json;

    use super::*;
    use crate::limits::ValidationLimits;
    use crate::registry::{Entity, ScalarType};

    fn categories() -> &'static ScalarField {
        Entity::FeedEntry
            .def()
            .scalar("categories")
            .expect("categories column")
    }

    fn text(value: &str) -> ScalarValue {
        ScalarValue::String(value.to_owned())
    }

    #[test]
    fn parses_every_list_operator() {
        let mut walker = Walker::new(ValidationLimits::default());
        let filter = ListFilter::parse(
            &mut walker,
            categories(),
            &json!({
                "equals": ["a"],
                "has": "b",
                "hasEvery": ["a", "b"],
                "hasSome": [],
                "isEmpty": false,
            }),
        )
        .expect("valid list filter");

        assert_eq!(
            filter.comparisons,
            [
                ListComparison::Equals(vec![text("a")]),
                ListComparison::Has(text("b")),
                ListComparison::HasEvery(vec![text("a"), text("b")]),
                ListComparison::HasSome(vec![]),
                ListComparison::IsEmpty(false),
            ]
        );
        assert_eq!(categories().scalar, ScalarType::String);
    }

    #[test]
    fn rejects_string_operators_on_lists() {
        let mut walker = Walker::new(ValidationLimits::default());

        let err = ListFilter::parse(&mut walker, categories(), &json!({"contains": "a"}))
            .expect_err("contains is not a list operator");

        assert_eq!(err.code(), "operator_mismatch");
        assert_eq!(err.to_string(), "contains: operator 'contains' is not supported for String[]");
    }
}
