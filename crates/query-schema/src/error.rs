//! Error types for query validation.
//!
//! Every failure is reported as a single [`ValidationError`] carrying the
//! path of the offending input node and a [`ValidationErrorKind`] with a
//! stable machine-readable code. No partial result is ever returned.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::registry::Entity;

/// One step from the root of an input document to a nested node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array position.
    Index(usize),
}

/// Location of a node inside a validated input document.
///
/// Displays as `AND[0].title`; the document root displays as `(root)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Path of the document root.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Segments from the root to the node.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns a copy of the path extended by an object key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Returns a copy of the path extended by an array index.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("(root)");
        }
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if position == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which structural budget was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitBound {
    /// Nesting depth of objects and arrays.
    Depth,
    /// Total number of visited nodes.
    Nodes,
}

impl fmt::Display for LimitBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Depth => "nesting depth",
            Self::Nodes => "node count",
        })
    }
}

/// Reason a validation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// The input names a field the entity does not declare.
    #[error("unknown field '{field}' on {entity}")]
    UnknownField {
        /// Entity being validated.
        entity: Entity,
        /// Field name supplied by the caller.
        field: String,
    },

    /// The input uses a key that is not an argument of the operation.
    #[error("unknown argument '{argument}'")]
    UnknownArgument {
        /// Argument name supplied by the caller.
        argument: String,
    },

    /// An operator is applied to a field kind that does not support it.
    #[error("operator '{operator}' is not supported for {kind}")]
    OperatorMismatch {
        /// Operator name supplied by the caller.
        operator: String,
        /// Description of the field kind.
        kind: String,
    },

    /// A compound unique key is only partially specified.
    #[error("compound unique key '{key}' is missing {}", .missing.join(", "))]
    IncompleteCompoundKey {
        /// Name of the compound key.
        key: &'static str,
        /// Fields of the key that were not supplied.
        missing: Vec<&'static str>,
    },

    /// A unique lookup names no complete unique key.
    #[error("expected a complete unique key, one of: {}", .expected.join(", "))]
    MissingUniqueKey {
        /// Names of the unique keys the entity declares.
        expected: Vec<&'static str>,
    },

    /// `DbNull`, `JsonNull`, or `AnyNull` used outside its JSON context.
    #[error("null sentinel '{sentinel}' is not allowed here")]
    NullSentinelMisuse {
        /// The sentinel supplied by the caller.
        sentinel: String,
    },

    /// `mode: insensitive` applied to a non-string field.
    #[error("mode 'insensitive' only applies to string fields, not {kind}")]
    InsensitiveModeOutsideString {
        /// Description of the field kind.
        kind: String,
    },

    /// The input exceeds the configured depth or node budget.
    #[error("input exceeds the {bound} limit of {limit}")]
    StructuralOverflow {
        /// Which budget was exhausted.
        bound: LimitBound,
        /// The configured limit.
        limit: usize,
    },

    /// A value has the wrong shape or type.
    #[error("expected {expected}")]
    InvalidValue {
        /// Description of the accepted shape.
        expected: String,
    },

    /// A create payload omits a field without a default.
    #[error("missing required field '{field}'")]
    MissingRequiredField {
        /// Name of the missing field or relation.
        field: &'static str,
    },

    /// A relation is set both by foreign key and by relation write.
    #[error("relation '{relation}' is set both by foreign key and by relation write")]
    ConflictingRelationInput {
        /// Name of the relation.
        relation: &'static str,
    },

    /// A grouped query references a field outside its `by` list.
    #[error("field '{field}' is not part of the group-by fields")]
    FieldNotGrouped {
        /// Name of the field.
        field: String,
    },

    /// An ordering object does not contain exactly one key.
    #[error("each orderBy object must contain exactly one key, found {count}")]
    AmbiguousOrdering {
        /// Number of keys found.
        count: usize,
    },

    /// A relevance ordering has no search string.
    #[error("relevance ordering requires a search string")]
    MissingRelevanceSearch,

    /// A relevance ordering names no fields.
    #[error("relevance ordering requires at least one field")]
    EmptyRelevanceFields,

    /// `select` and `include` were supplied at the same level.
    #[error("select and include cannot be used together")]
    SelectIncludeConflict,
}

impl ValidationErrorKind {
    /// Stable machine-readable code for the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "unknown_field",
            Self::UnknownArgument { .. } => "unknown_argument",
            Self::OperatorMismatch { .. } => "operator_mismatch",
            Self::IncompleteCompoundKey { .. } => "incomplete_compound_key",
            Self::MissingUniqueKey { .. } => "missing_unique_key",
            Self::NullSentinelMisuse { .. } => "null_sentinel_misuse",
            Self::InsensitiveModeOutsideString { .. } => "insensitive_mode_outside_string",
            Self::StructuralOverflow { .. } => "structural_overflow",
            Self::InvalidValue { .. } => "invalid_value",
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::ConflictingRelationInput { .. } => "conflicting_relation_input",
            Self::FieldNotGrouped { .. } => "field_not_grouped",
            Self::AmbiguousOrdering { .. } => "ambiguous_ordering",
            Self::MissingRelevanceSearch => "missing_relevance_search",
            Self::EmptyRelevanceFields => "empty_relevance_fields",
            Self::SelectIncludeConflict => "select_include_conflict",
        }
    }
}

/// A validation failure located at a specific input path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    /// Location of the offending node.
    pub path: FieldPath,
    /// What went wrong.
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Creates an error at `path`.
    #[must_use]
    pub const fn new(path: FieldPath, kind: ValidationErrorKind) -> Self {
        Self { path, kind }
    }

    /// Stable machine-readable code of the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Structured payload suitable for an API error body.
    ///
    /// # Examples
    ///
    /// ```
    /// use query_schema::{FieldPath, ValidationError, ValidationErrorKind};
    ///
    /// let error = ValidationError::new(
    ///     FieldPath::root().key("AND").index(0).key("title"),
    ///     ValidationErrorKind::InsensitiveModeOutsideString { kind: "Int".to_owned() },
    /// );
    /// let details = error.details();
    ///
    /// assert_eq!(details["code"], "insensitive_mode_outside_string");
    /// assert_eq!(details["path"], "AND[0].title");
    /// ```
    #[must_use]
    pub fn details(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "path": self.path.to_string(),
                "code": self.code(),
                "message": self.kind.to_string(),
            })
        })
    }
}
