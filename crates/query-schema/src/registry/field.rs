//! Field and relation descriptors used by the entity catalogue.

use std::fmt;

use serde::Serialize;

use super::Entity;

/// Semantic type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarType {
    /// UTF-8 text.
    String,
    /// 32-bit signed integer.
    Int,
    /// Double-precision number. Only produced by aggregates such as `_avg`.
    Float,
    /// Boolean flag.
    Boolean,
    /// RFC 3339 timestamp.
    DateTime,
    /// Arbitrary JSON document.
    Json,
}

impl ScalarType {
    /// Returns `true` for types that support `_avg` and `_sum`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Returns `true` for types that support `lt`, `lte`, `gt`, and `gte`.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::String | Self::Int | Self::Float | Self::DateTime)
    }

    /// Type name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value a column receives when a create payload omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldDefault {
    /// A literal boolean stored as-is.
    Boolean(bool),
    /// A collision-resistant identifier generated by the executor.
    Cuid,
    /// The executor's current timestamp.
    Now,
}

impl FieldDefault {
    /// Returns `true` when the value is produced by the executor rather
    /// than stored literally.
    #[must_use]
    pub const fn is_generated(self) -> bool {
        matches!(self, Self::Cuid | Self::Now)
    }
}

/// A scalar column of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarField {
    /// Column name as it appears in query input.
    pub name: &'static str,
    /// Semantic type of each value.
    pub scalar: ScalarType,
    /// Whether the column accepts SQL NULL.
    pub nullable: bool,
    /// Whether the column stores an ordered list of values.
    pub list: bool,
    /// Default applied on create when the field is omitted.
    pub default: Option<FieldDefault>,
    /// Whether the executor refreshes the value on every update.
    pub updated_at: bool,
}

impl ScalarField {
    /// A non-nullable column without a default.
    #[must_use]
    pub const fn required(name: &'static str, scalar: ScalarType) -> Self {
        Self {
            name,
            scalar,
            nullable: false,
            list: false,
            default: None,
            updated_at: false,
        }
    }

    /// A nullable column.
    #[must_use]
    pub const fn optional(name: &'static str, scalar: ScalarType) -> Self {
        Self {
            nullable: true,
            ..Self::required(name, scalar)
        }
    }

    /// A list column. Lists are never NULL; an absent list is empty.
    #[must_use]
    pub const fn list(name: &'static str, scalar: ScalarType) -> Self {
        Self {
            list: true,
            ..Self::required(name, scalar)
        }
    }

    /// Attaches a create-time default.
    #[must_use]
    pub const fn with_default(self, default: FieldDefault) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    /// Marks the column as refreshed on every update.
    #[must_use]
    pub const fn auto_updated(self) -> Self {
        Self {
            updated_at: true,
            ..self
        }
    }

    /// Returns `true` when a create payload must supply the field.
    #[must_use]
    pub const fn is_required_on_create(&self) -> bool {
        !self.nullable && !self.list && self.default.is_none() && !self.updated_at
    }
}

/// How many rows sit on the far side of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    /// Exactly one related row.
    One,
    /// Zero or one related row.
    OptionalOne,
    /// Any number of related rows.
    Many,
}

impl Cardinality {
    /// Returns `true` for to-many relations.
    #[must_use]
    pub const fn is_many(self) -> bool {
        matches!(self, Self::Many)
    }

    /// Human-readable description used in error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::One => "to-one relation",
            Self::OptionalOne => "optional to-one relation",
            Self::Many => "to-many relation",
        }
    }
}

/// What happens to rows holding a foreign key when the referenced row is
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OnDelete {
    /// Dependent rows are deleted first.
    Cascade,
    /// The foreign key of dependent rows is cleared.
    SetNull,
}

/// A relation from one entity to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationField {
    /// Relation name as it appears in query input.
    pub name: &'static str,
    /// Entity on the far side.
    pub target: Entity,
    /// Number of rows on the far side.
    pub cardinality: Cardinality,
    /// Name of the matching relation declared on the target.
    pub inverse: &'static str,
    /// Local foreign-key columns. Empty unless this side owns the key.
    pub foreign_keys: &'static [&'static str],
    /// Delete behaviour, meaningful on the owning side only.
    pub on_delete: OnDelete,
}

impl RelationField {
    /// Owning side of a relation: this entity stores `foreign_keys`.
    #[must_use]
    pub const fn belongs_to(
        name: &'static str,
        target: Entity,
        cardinality: Cardinality,
        inverse: &'static str,
        foreign_keys: &'static [&'static str],
        on_delete: OnDelete,
    ) -> Self {
        Self {
            name,
            target,
            cardinality,
            inverse,
            foreign_keys,
            on_delete,
        }
    }

    /// Non-owning to-many side of a relation.
    #[must_use]
    pub const fn has_many(name: &'static str, target: Entity, inverse: &'static str) -> Self {
        Self {
            name,
            target,
            cardinality: Cardinality::Many,
            inverse,
            foreign_keys: &[],
            on_delete: OnDelete::Cascade,
        }
    }

    /// Returns `true` when this side stores the foreign key.
    #[must_use]
    pub const fn is_owning(&self) -> bool {
        !self.foreign_keys.is_empty()
    }
}

/// A set of columns that identifies at most one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueKey {
    /// Key name. For compound keys this joins the fields with `_`.
    pub name: &'static str,
    /// Columns forming the key.
    pub fields: &'static [&'static str],
}

impl UniqueKey {
    /// Returns `true` when the key spans more than one column.
    #[must_use]
    pub const fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }
}
