//! Create and update payloads.
//!
//! Payloads are validated against the catalogue the same way filters are:
//! every key must name a column or a relation, values are coerced to the
//! column type, and nested relation writes recurse into the target entity.
//! A relation is linked either through its foreign-key columns or through a
//! nested write, never both.

mod create;
mod nested;
mod update;

use serde::Serialize;
use serde_json::{Map, Value};

pub use create::CreatePayload;
pub use nested::{
    ConnectOrCreate, NestedTarget, NestedUpdate, NestedUpsert, RelationOp, RelationWrite,
};
pub use update::{FieldUpdate, IntOperation, ListUpdate, UpdatePayload};

pub(crate) use create::parse_create;
pub(crate) use update::parse_update;

use crate::error::ValidationErrorKind;
use crate::registry::{RelationField, ScalarField, ScalarType};
use crate::value::{NullableJson, ScalarValue, coerce, coerce_list, transform_json_null};
use crate::walk::{Validated, Walker};

/// A value the executor produces when the row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneratedValue {
    /// A fresh collision-resistant identifier.
    Cuid,
    /// The current timestamp.
    Now,
}

/// The value written to one scalar column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FieldWrite {
    /// A coerced literal.
    Value(ScalarValue),
    /// SQL NULL on a nullable column.
    Null,
    /// A JSON column write.
    Json(NullableJson),
    /// The full contents of a list column.
    List(Vec<ScalarValue>),
    /// A value produced by the executor.
    Generated(GeneratedValue),
}

/// How a relation of a written row is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "camelCase")]
pub enum RelationLink {
    /// The foreign-key columns were written directly.
    ByForeignKey,
    /// Related rows are written through the relation.
    ByRelation(RelationWrite),
}

/// Returns `true` when `name` leads back to the row a nested write hangs
/// off: the back relation itself or one of its foreign-key columns.
fn is_back_reference(back: Option<&RelationField>, name: &str) -> bool {
    back.is_some_and(|relation| relation.name == name || relation.foreign_keys.contains(&name))
}

/// Coerces a scalar column write.
pub(crate) fn write_value(
    walker: &mut Walker,
    field: &ScalarField,
    value: &Value,
) -> Validated<FieldWrite> {
    if field.list {
        return coerce_list(walker, field.scalar, value).map(FieldWrite::List);
    }
    if field.scalar == ScalarType::Json {
        return json_write(walker, field, value).map(FieldWrite::Json);
    }
    if value.is_null() {
        return if field.nullable {
            Ok(FieldWrite::Null)
        } else {
            walker.invalid(format!("a non-null {}", field.scalar))
        };
    }
    coerce(walker, field.scalar, value).map(FieldWrite::Value)
}

fn json_write(walker: &Walker, field: &ScalarField, value: &Value) -> Validated<NullableJson> {
    match transform_json_null(Some(value)) {
        NullableJson::DbNull if !field.nullable && value.is_null() => {
            walker.invalid("a JSON value")
        }
        NullableJson::DbNull if !field.nullable => {
            walker.fail(ValidationErrorKind::NullSentinelMisuse {
                sentinel: "DbNull".to_owned(),
            })
        }
        write => Ok(write),
    }
}

/// Finds a required key of a fixed-shape argument object.
fn required<'v>(
    walker: &Walker,
    arguments: &'v Map<String, Value>,
    key: &'static str,
) -> Validated<&'v Value> {
    arguments.get(key).map_or_else(
        || walker.fail(ValidationErrorKind::MissingRequiredField { field: key }),
        Ok,
    )
}

#[cfg(test)]
mod tests;
