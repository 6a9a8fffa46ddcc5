//! Predicates on related rows.
//!
//! The target's filter is resolved by catalogue lookup when the predicate
//! is parsed, one level at a time, so cyclic relations (Bookmark → Tag →
//! Bookmark) only recurse as deep as the input actually nests.

use serde::Serialize;
use serde_json::{Map, Value};

use super::scalar::mismatch;
use super::{WhereInput, WhereScope, parse_where};
use crate::registry::{Cardinality, RelationField};
use crate::walk::{Validated, Walker};

/// Target of an `is` or `isNot` predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationMatch {
    /// No related row exists.
    Absent,
    /// The related row matches the filter.
    Matches(WhereInput),
}

/// Existence predicate over a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationFilter {
    /// Predicates on a to-one relation.
    ToOne {
        /// The related row satisfies the match.
        #[serde(skip_serializing_if = "Option::is_none")]
        is: Option<RelationMatch>,
        /// The related row does not satisfy the match.
        #[serde(rename = "isNot", skip_serializing_if = "Option::is_none")]
        is_not: Option<RelationMatch>,
    },
    /// Predicates on a to-many relation.
    ToMany {
        /// Every related row matches.
        #[serde(skip_serializing_if = "Option::is_none")]
        every: Option<WhereInput>,
        /// At least one related row matches.
        #[serde(skip_serializing_if = "Option::is_none")]
        some: Option<WhereInput>,
        /// No related row matches.
        #[serde(skip_serializing_if = "Option::is_none")]
        none: Option<WhereInput>,
    },
}

impl RelationMatch {
    fn normalize(self) -> Self {
        match self {
            Self::Absent => Self::Absent,
            Self::Matches(filter) => Self::Matches(filter.normalize()),
        }
    }
}

impl RelationFilter {
    pub(crate) fn normalize(self) -> Self {
        match self {
            Self::ToOne { is, is_not } => Self::ToOne {
                is: is.map(RelationMatch::normalize),
                is_not: is_not.map(RelationMatch::normalize),
            },
            Self::ToMany { every, some, none } => Self::ToMany {
                every: every.map(WhereInput::normalize),
                some: some.map(WhereInput::normalize),
                none: none.map(WhereInput::normalize),
            },
        }
    }

    pub(crate) fn parse(
        walker: &mut Walker,
        relation: &RelationField,
        value: &Value,
    ) -> Validated<Self> {
        if relation.cardinality.is_many() {
            parse_to_many(walker, relation, value)
        } else {
            parse_to_one(walker, relation, value)
        }
    }
}

fn parse_to_one(
    walker: &mut Walker,
    relation: &RelationField,
    value: &Value,
) -> Validated<RelationFilter> {
    let explicit = value.as_object().filter(|operators| {
        !operators.is_empty() && operators.keys().all(|key| key == "is" || key == "isNot")
    });
    let Some(operators) = explicit else {
        let shorthand = relation_match(walker, relation, value)?;
        return Ok(RelationFilter::ToOne {
            is: Some(shorthand),
            is_not: None,
        });
    };
    let is = nested_match(walker, relation, operators, "is")?;
    let is_not = nested_match(walker, relation, operators, "isNot")?;
    Ok(RelationFilter::ToOne { is, is_not })
}

fn nested_match(
    walker: &mut Walker,
    relation: &RelationField,
    operators: &Map<String, Value>,
    operator: &str,
) -> Validated<Option<RelationMatch>> {
    operators
        .get(operator)
        .map(|argument| walker.at_key(operator, |inner| relation_match(inner, relation, argument)))
        .transpose()
}

fn relation_match(
    walker: &mut Walker,
    relation: &RelationField,
    value: &Value,
) -> Validated<RelationMatch> {
    match (value, relation.cardinality) {
        (Value::Null, Cardinality::OptionalOne) => Ok(RelationMatch::Absent),
        (Value::Null, _) => walker.invalid(format!(
            "a filter object; relation '{}' is required",
            relation.name
        )),
        (filter, _) => parse_where(walker, relation.target, filter, WhereScope::Full)
            .map(RelationMatch::Matches),
    }
}

fn parse_to_many(
    walker: &mut Walker,
    relation: &RelationField,
    value: &Value,
) -> Validated<RelationFilter> {
    let operators = walker.object(value)?;
    let mut every = None;
    let mut some = None;
    let mut none = None;
    for (operator, argument) in operators {
        let slot = match operator.as_str() {
            "every" => &mut every,
            "some" => &mut some,
            "none" => &mut none,
            _ => {
                let kind = relation.cardinality.describe().to_owned();
                return walker.at_key(operator, |inner| mismatch(inner, operator, kind));
            }
        };
        *slot = Some(walker.at_key(operator, |inner| {
            parse_where(inner, relation.target, argument, WhereScope::Full)
        })?);
    }
    Ok(RelationFilter::ToMany { every, some, none })
}
