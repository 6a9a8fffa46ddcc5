//! Bounded traversal of untrusted JSON input.
//!
//! [`Walker`] tracks the current path, the nesting depth and the number of
//! visited nodes. Validators descend through [`Walker::at_key`] and
//! [`Walker::at_index`], so every error carries the path of the node being
//! inspected and adversarial input stops at the configured budget.
//!
//! Objects are `serde_json` maps ordered by key, so siblings are always
//! visited in sorted order and the first reported error is deterministic.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{FieldPath, LimitBound, PathSegment, ValidationError, ValidationErrorKind};
use crate::limits::ValidationLimits;

/// Result alias used throughout validation.
pub type Validated<T> = Result<T, ValidationError>;

pub(crate) struct Walker {
    limits: ValidationLimits,
    path: FieldPath,
    depth: usize,
    nodes: usize,
}

impl Walker {
    pub(crate) const fn new(limits: ValidationLimits) -> Self {
        Self {
            limits,
            path: FieldPath::root(),
            depth: 0,
            nodes: 0,
        }
    }

    pub(crate) fn error(&self, kind: ValidationErrorKind) -> ValidationError {
        ValidationError::new(self.path.clone(), kind)
    }

    pub(crate) fn fail<T>(&self, kind: ValidationErrorKind) -> Validated<T> {
        Err(self.error(kind))
    }

    pub(crate) fn invalid<T>(&self, expected: impl Into<String>) -> Validated<T> {
        self.fail(ValidationErrorKind::InvalidValue {
            expected: expected.into(),
        })
    }

    pub(crate) fn at_key<T>(
        &mut self,
        key: &str,
        visit: impl FnOnce(&mut Self) -> Validated<T>,
    ) -> Validated<T> {
        self.descend(PathSegment::Key(key.to_owned()), visit)
    }

    pub(crate) fn at_index<T>(
        &mut self,
        index: usize,
        visit: impl FnOnce(&mut Self) -> Validated<T>,
    ) -> Validated<T> {
        self.descend(PathSegment::Index(index), visit)
    }

    fn descend<T>(
        &mut self,
        segment: PathSegment,
        visit: impl FnOnce(&mut Self) -> Validated<T>,
    ) -> Validated<T> {
        self.path.push(segment);
        self.depth += 1;
        self.nodes += 1;
        let outcome = self.check_budget().and_then(|()| visit(self));
        self.depth -= 1;
        self.path.pop();
        outcome
    }

    fn check_budget(&self) -> Validated<()> {
        let exceeded = if self.depth > self.limits.max_depth {
            Some((LimitBound::Depth, self.limits.max_depth))
        } else if self.nodes > self.limits.max_nodes {
            Some((LimitBound::Nodes, self.limits.max_nodes))
        } else {
            None
        };
        let Some((bound, limit)) = exceeded else {
            return Ok(());
        };
        warn!(%bound, limit, path = %self.path, "query input exceeded structural limit");
        self.fail(ValidationErrorKind::StructuralOverflow { bound, limit })
    }

    pub(crate) fn object<'v>(&self, value: &'v Value) -> Validated<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Ok(map),
            _ => self.invalid("an object"),
        }
    }

    pub(crate) fn array<'v>(&self, value: &'v Value) -> Validated<&'v [Value]> {
        match value {
            Value::Array(items) => Ok(items),
            _ => self.invalid("an array"),
        }
    }

    pub(crate) fn boolean(&self, value: &Value) -> Validated<bool> {
        value.as_bool().map_or_else(|| self.invalid("a boolean"), Ok)
    }

    pub(crate) fn string<'v>(&self, value: &'v Value) -> Validated<&'v str> {
        value.as_str().map_or_else(|| self.invalid("a string"), Ok)
    }

    /// Visits a value that may be given either as one item or as an array.
    pub(crate) fn one_or_many<T>(
        &mut self,
        value: &Value,
        mut visit: impl FnMut(&mut Self, &Value) -> Validated<T>,
    ) -> Validated<Vec<T>> {
        match value {
            Value::Array(items) => self.each(items, visit),
            single => Ok(vec![visit(self, single)?]),
        }
    }

    /// Visits every element of an array under its index.
    pub(crate) fn each<T>(
        &mut self,
        items: &[Value],
        mut visit: impl FnMut(&mut Self, &Value) -> Validated<T>,
    ) -> Validated<Vec<T>> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.at_index(index, |walker| visit(walker, item)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "test code uses expect for clear failure messages"
    )]

    use serde_json::json;

    use super::*;

    fn nest(walker: &mut Walker, levels: usize) -> Validated<usize> {
        if levels == 0 {
            return Ok(0);
        }
        walker.at_key("child", |inner| nest(inner, levels - 1).map(|depth| depth + 1))
    }

    #[test]
    fn depth_budget_stops_descent() {
        let mut walker = Walker::new(ValidationLimits::new(3, 100));

        assert_eq!(nest(&mut walker, 3).expect("within budget"), 3);
        let err = nest(&mut walker, 4).expect_err("beyond budget");

        assert_eq!(
            err.kind,
            ValidationErrorKind::StructuralOverflow {
                bound: LimitBound::Depth,
                limit: 3,
            }
        );
        assert_eq!(err.path.to_string(), "child.child.child.child");
    }

    #[test]
    fn node_budget_counts_every_visit() {
        let mut walker = Walker::new(ValidationLimits::new(10, 2));
        let items = [json!(1), json!(2), json!(3)];

        let err = walker
            .each(&items, |_, item| Ok(item.clone()))
            .expect_err("node budget exhausted");

        assert_eq!(err.path.to_string(), "[2]");
        assert_eq!(err.code(), "structural_overflow");
    }

    #[test]
    fn one_or_many_accepts_single_values() {
        let mut walker = Walker::new(ValidationLimits::default());

        let single = walker
            .one_or_many(&json!("a"), |inner, value| inner.string(value).map(str::len))
            .expect("single value");
        let many = walker
            .one_or_many(&json!(["ab", "abc"]), |inner, value| {
                inner.string(value).map(str::len)
            })
            .expect("array");

        assert_eq!(single, [1]);
        assert_eq!(many, [2, 3]);
    }

    #[test]
    fn errors_are_reported_at_the_current_path() {
        let mut walker = Walker::new(ValidationLimits::default());

        let err = walker
            .at_key("AND", |outer| {
                outer.at_index(0, |inner| inner.boolean(&json!("yes")))
            })
            .expect_err("not a boolean");

        assert_eq!(err.to_string(), "AND[0]: expected a boolean");
    }
}
