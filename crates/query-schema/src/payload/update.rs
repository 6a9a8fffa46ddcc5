//! Update payloads and field update operations.

use std::collections::BTreeMap;
use std::num::NonZeroI32;

use serde::Serialize;
use serde_json::{Map, Value};

use super::nested::{WriteMode, parse_relation_write};
use super::{FieldWrite, GeneratedValue, RelationLink, is_back_reference, write_value};
use crate::error::ValidationErrorKind;
use crate::filter::{Operand, mismatch};
use crate::registry::{Entity, FieldKind, RelationField, ScalarField, ScalarType};
use crate::value::{NullableJson, ScalarValue, coerce};
use crate::walk::{Validated, Walker};

/// Checked arithmetic on an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IntOperation {
    /// Adds the operand.
    Increment(i32),
    /// Subtracts the operand.
    Decrement(i32),
    /// Multiplies by the operand.
    Multiply(i32),
    /// Divides by the operand, truncating toward zero.
    Divide(NonZeroI32),
}

impl IntOperation {
    /// Applies the operation to `current`.
    ///
    /// Returns `None` when the result does not fit in an `i32`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroI32;
    ///
    /// use query_schema::payload::IntOperation;
    ///
    /// assert_eq!(IntOperation::Increment(2).apply(40), Some(42));
    /// assert_eq!(IntOperation::Multiply(2).apply(i32::MAX), None);
    /// let three = NonZeroI32::new(3).expect("non-zero");
    /// assert_eq!(IntOperation::Divide(three).apply(-7), Some(-2));
    /// ```
    #[must_use]
    pub const fn apply(self, current: i32) -> Option<i32> {
        match self {
            Self::Increment(operand) => current.checked_add(operand),
            Self::Decrement(operand) => current.checked_sub(operand),
            Self::Multiply(operand) => current.checked_mul(operand),
            Self::Divide(divisor) => current.checked_div(divisor.get()),
        }
    }
}

/// Update of a list column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListUpdate {
    /// Replaces the list.
    Set(Vec<ScalarValue>),
    /// Appends to the list.
    Push(Vec<ScalarValue>),
}

impl ListUpdate {
    /// The list after the update.
    #[must_use]
    pub fn apply(&self, current: &[ScalarValue]) -> Vec<ScalarValue> {
        match self {
            Self::Set(values) => values.clone(),
            Self::Push(values) => current.iter().chain(values).cloned().collect(),
        }
    }
}

/// Update of one scalar column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldUpdate {
    /// Overwrites the column.
    Set(FieldWrite),
    /// Integer arithmetic.
    Int(IntOperation),
    /// List update.
    List(ListUpdate),
}

/// Validated changes to existing rows.
///
/// Every field is optional. Entities with an auto-updated timestamp get a
/// deferred "now" write, and writing the column directly is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    entity: Entity,
    fields: BTreeMap<&'static str, FieldUpdate>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    relations: BTreeMap<&'static str, RelationLink>,
}

impl UpdatePayload {
    /// Entity updated.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Column updates keyed by column name.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<&'static str, FieldUpdate> {
        &self.fields
    }

    /// The update for `field`, if any.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldUpdate> {
        self.fields.get(field)
    }

    /// Relation changes keyed by relation name.
    #[must_use]
    pub const fn relations(&self) -> &BTreeMap<&'static str, RelationLink> {
        &self.relations
    }

    /// The change to `relation`, if any.
    #[must_use]
    pub fn relation(&self, relation: &str) -> Option<&RelationLink> {
        self.relations.get(relation)
    }

    /// Storage intent of the JSON column `field`; [`NullableJson::Unset`]
    /// when the payload leaves it alone.
    #[must_use]
    pub fn json_write(&self, field: &str) -> NullableJson {
        match self.fields.get(field) {
            Some(FieldUpdate::Set(FieldWrite::Json(write))) => write.clone(),
            _ => NullableJson::Unset,
        }
    }
}

/// Validates changes to `entity` rows.
///
/// `back` and `allow_relations` have the meaning they have for creates;
/// `updateMany` data carries columns only.
pub(crate) fn parse_update(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
    back: Option<&'static RelationField>,
    allow_relations: bool,
) -> Validated<UpdatePayload> {
    let def = entity.def();
    let input = walker.object(value)?;
    let mut payload = UpdatePayload {
        entity,
        fields: BTreeMap::new(),
        relations: BTreeMap::new(),
    };

    for (key, argument) in input {
        walker.at_key(key, |inner| {
            match def.field(key) {
                Some(_) if is_back_reference(back, key) => {}
                Some(FieldKind::Scalar(field)) if field.updated_at => {
                    return inner.invalid(format!(
                        "no value; '{}' advances automatically on every update",
                        field.name
                    ));
                }
                Some(FieldKind::Scalar(field)) => {
                    let update = parse_field_update(inner, field, argument)?;
                    payload.fields.insert(field.name, update);
                    return Ok(());
                }
                Some(FieldKind::Relation(relation)) if allow_relations => {
                    let write = parse_relation_write(inner, relation, argument, WriteMode::Update)?;
                    payload
                        .relations
                        .insert(relation.name, RelationLink::ByRelation(write));
                    return Ok(());
                }
                _ => {}
            }
            inner.fail(ValidationErrorKind::UnknownField {
                entity,
                field: key.clone(),
            })
        })?;
    }

    for relation in def.relations.iter().filter(|relation| relation.is_owning()) {
        let by_key = relation
            .foreign_keys
            .iter()
            .any(|column| payload.fields.contains_key(column));
        if !by_key {
            continue;
        }
        if payload.relations.contains_key(relation.name) {
            return walker.at_key(relation.name, |inner| {
                inner.fail(ValidationErrorKind::ConflictingRelationInput {
                    relation: relation.name,
                })
            });
        }
        payload
            .relations
            .insert(relation.name, RelationLink::ByForeignKey);
    }

    if let Some(stamp) = def.updated_at_field() {
        payload.fields.insert(
            stamp.name,
            FieldUpdate::Set(FieldWrite::Generated(GeneratedValue::Now)),
        );
    }
    Ok(payload)
}

fn parse_field_update(
    walker: &mut Walker,
    field: &ScalarField,
    value: &Value,
) -> Validated<FieldUpdate> {
    let Value::Object(operations) = value else {
        if field.list {
            let values = list_values(walker, field, value)?;
            return Ok(FieldUpdate::List(ListUpdate::Set(values)));
        }
        return write_value(walker, field, value).map(FieldUpdate::Set);
    };
    if field.scalar == ScalarType::Json && !field.list {
        return write_value(walker, field, value).map(FieldUpdate::Set);
    }
    let (operator, argument) = single_operation(walker, operations)?;
    walker.at_key(operator, |inner| {
        if field.list {
            return match operator {
                "set" => list_values(inner, field, argument)
                    .map(|values| FieldUpdate::List(ListUpdate::Set(values))),
                "push" => inner
                    .one_or_many(argument, |item_walker, item| {
                        coerce(item_walker, field.scalar, item)
                    })
                    .map(|values| FieldUpdate::List(ListUpdate::Push(values))),
                _ => mismatch(inner, operator, format!("{}[]", field.scalar)),
            };
        }
        match (operator, field.scalar) {
            ("set", _) => write_value(inner, field, argument).map(FieldUpdate::Set),
            ("increment" | "decrement" | "multiply", ScalarType::Int) => {
                let operand = int_operand(inner, argument)?;
                let operation = match operator {
                    "increment" => IntOperation::Increment(operand),
                    "decrement" => IntOperation::Decrement(operand),
                    _ => IntOperation::Multiply(operand),
                };
                Ok(FieldUpdate::Int(operation))
            }
            ("divide", ScalarType::Int) => {
                let divisor = NonZeroI32::new(int_operand(inner, argument)?);
                divisor.map_or_else(
                    || inner.invalid("a non-zero divisor"),
                    |operand| Ok(FieldUpdate::Int(IntOperation::Divide(operand))),
                )
            }
            _ => mismatch(inner, operator, Operand::of(field).describe()),
        }
    })
}

fn single_operation<'v>(
    walker: &Walker,
    operations: &'v Map<String, Value>,
) -> Validated<(&'v str, &'v Value)> {
    let mut iter = operations.iter();
    match (iter.next(), iter.next()) {
        (Some((operator, argument)), None) => Ok((operator.as_str(), argument)),
        _ => walker.invalid("exactly one update operation"),
    }
}

fn list_values(
    walker: &mut Walker,
    field: &ScalarField,
    value: &Value,
) -> Validated<Vec<ScalarValue>> {
    match write_value(walker, field, value)? {
        FieldWrite::List(values) => Ok(values),
        _ => walker.invalid(format!("a list of {}", field.scalar)),
    }
}

fn int_operand(walker: &Walker, value: &Value) -> Validated<i32> {
    coerce(walker, ScalarType::Int, value)?
        .as_int()
        .map_or_else(|| walker.invalid("a 32-bit integer"), Ok)
}
