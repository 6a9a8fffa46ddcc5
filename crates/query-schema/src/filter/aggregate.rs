//! Aggregate predicates for the `having` clause of grouped queries.

use serde::Serialize;
use serde_json::{Map, Value};

use super::scalar::{Operand, mismatch};
use super::{FieldFilter, ScalarFilter};
use crate::error::ValidationErrorKind;
use crate::registry::{ScalarField, ScalarType};
use crate::walk::{Validated, Walker};

/// Predicate on a column of a grouped query.
///
/// `base` filters the grouped value itself and is only allowed on columns
/// listed in `by`; the aggregate slots may target any scalar column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateFilter {
    /// Filter on the grouped value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<FieldFilter>,
    /// Filter on the number of non-null values.
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<ScalarFilter>,
    /// Filter on the smallest value.
    #[serde(rename = "_min", skip_serializing_if = "Option::is_none")]
    pub min: Option<ScalarFilter>,
    /// Filter on the largest value.
    #[serde(rename = "_max", skip_serializing_if = "Option::is_none")]
    pub max: Option<ScalarFilter>,
    /// Filter on the mean, numeric columns only.
    #[serde(rename = "_avg", skip_serializing_if = "Option::is_none")]
    pub avg: Option<ScalarFilter>,
    /// Filter on the sum, numeric columns only.
    #[serde(rename = "_sum", skip_serializing_if = "Option::is_none")]
    pub sum: Option<ScalarFilter>,
}

impl AggregateFilter {
    pub(crate) fn parse(
        walker: &mut Walker,
        field: &ScalarField,
        value: &Value,
        grouped: bool,
    ) -> Validated<Self> {
        let mut filter = Self::default();
        let base_input = match value {
            Value::Object(operators) => {
                let mut plain = Map::new();
                for (operator, argument) in operators {
                    if operator.starts_with('_') {
                        walker.at_key(operator, |inner| {
                            filter.apply(inner, field, operator, argument)
                        })?;
                    } else {
                        plain.insert(operator.clone(), argument.clone());
                    }
                }
                if plain.is_empty() {
                    return Ok(filter);
                }
                Value::Object(plain)
            }
            literal => literal.clone(),
        };
        if !grouped {
            return walker.fail(ValidationErrorKind::FieldNotGrouped {
                field: field.name.to_owned(),
            });
        }
        filter.base = Some(FieldFilter::parse(walker, field, &base_input)?);
        Ok(filter)
    }

    fn apply(
        &mut self,
        walker: &mut Walker,
        field: &ScalarField,
        aggregate: &str,
        argument: &Value,
    ) -> Validated<()> {
        let operand = aggregate_operand(walker, field, aggregate)?;
        let parsed = Some(ScalarFilter::parse(walker, operand, argument)?);
        match aggregate {
            "_count" => self.count = parsed,
            "_min" => self.min = parsed,
            "_max" => self.max = parsed,
            "_avg" => self.avg = parsed,
            _ => self.sum = parsed,
        }
        Ok(())
    }
}

/// Type of the value an aggregate produces over `field`.
pub(crate) fn aggregate_operand(
    walker: &Walker,
    field: &ScalarField,
    aggregate: &str,
) -> Validated<Operand> {
    let comparable = !field.list && field.scalar != ScalarType::Json;
    let numeric = !field.list && field.scalar.is_numeric();
    match aggregate {
        "_count" => Ok(Operand::new(ScalarType::Int, false)),
        "_min" | "_max" if comparable => Ok(Operand::new(field.scalar, true)),
        "_avg" if numeric => Ok(Operand::new(ScalarType::Float, true)),
        "_sum" if numeric => Ok(Operand::new(field.scalar, true)),
        _ => mismatch(walker, aggregate, describe(field)),
    }
}

fn describe(field: &ScalarField) -> String {
    if field.list {
        format!("{}[]", field.scalar)
    } else {
        Operand::of(field).describe()
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
    use crate::filter::Comparison;
    use crate::limits::ValidationLimits;
    use crate::registry::Entity;
    use crate::value::ScalarValue;

    fn column(entity: Entity, name: &str) -> &'static ScalarField {
        entity.def().scalar(name).expect("known column")
    }

    fn parse(field: &ScalarField, value: &Value, grouped: bool) -> Validated<AggregateFilter> {
        AggregateFilter::parse(
            &mut Walker::new(ValidationLimits::default()),
            field,
            value,
            grouped,
        )
    }

    #[test]
    fn splits_base_and_aggregate_operators() {
        let height = column(Entity::FeedEntryMedia, "height");

        let filter = parse(height, &json!({"gt": 10, "_avg": {"lt": 400}, "_count": 3}), true)
            .expect("valid having filter");

        let Some(FieldFilter::Scalar(base)) = filter.base else {
            panic!("expected a scalar base filter");
        };
        assert_eq!(base.comparisons, [Comparison::Gt(ScalarValue::Int(10))]);
        assert_eq!(
            filter.count,
            Some(ScalarFilter::equals(Some(ScalarValue::Int(3))))
        );
        assert!(filter.avg.is_some());
    }

    #[test]
    fn aggregate_only_predicates_allow_ungrouped_fields() {
        let title = column(Entity::Bookmark, "title");

        let filter = parse(title, &json!({"_max": {"startsWith": "a"}}), false)
            .expect("aggregate-only filter");

        assert!(filter.base.is_none());
        assert!(filter.max.is_some());
    }

    #[rstest]
    #[case::plain_on_ungrouped(json!({"equals": "x"}), false, "field_not_grouped")]
    #[case::literal_on_ungrouped(json!("x"), false, "field_not_grouped")]
    #[case::avg_on_string(json!({"_avg": {"gt": 1}}), true, "operator_mismatch")]
    #[case::unknown_aggregate(json!({"_median": 1}), true, "operator_mismatch")]
    fn rejects_invalid_having_filters(
        #[case] input: Value,
        #[case] grouped: bool,
        #[case] code: &str,
    ) {
        let err = parse(column(Entity::Bookmark, "title"), &input, grouped)
            .expect_err("invalid having filter");

        assert_eq!(err.code(), code);
    }
}
