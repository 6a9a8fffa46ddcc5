//! Create payloads.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::nested::{WriteMode, parse_relation_write};
use super::{FieldWrite, GeneratedValue, RelationLink, is_back_reference, write_value};
use crate::error::ValidationErrorKind;
use crate::registry::{Cardinality, Entity, EntityDef, FieldDefault, FieldKind, RelationField};
use crate::value::{NullableJson, ScalarValue};
use crate::walk::{Validated, Walker};

/// Validated data of a new row.
///
/// `fields` holds every column the executor writes: supplied values,
/// materialised literal defaults and deferred generated defaults. Nullable
/// columns the caller omitted are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePayload {
    entity: Entity,
    fields: BTreeMap<&'static str, FieldWrite>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    relations: BTreeMap<&'static str, RelationLink>,
}

impl CreatePayload {
    /// Entity created.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Column writes keyed by column name.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<&'static str, FieldWrite> {
        &self.fields
    }

    /// The write for `field`, if the row sets it.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldWrite> {
        self.fields.get(field)
    }

    /// How each linked relation is established.
    #[must_use]
    pub const fn relations(&self) -> &BTreeMap<&'static str, RelationLink> {
        &self.relations
    }

    /// The link for `relation`, if the row sets it.
    #[must_use]
    pub fn relation(&self, relation: &str) -> Option<&RelationLink> {
        self.relations.get(relation)
    }

    /// Storage intent of the JSON column `field`; [`NullableJson::Unset`]
    /// when the payload leaves it alone.
    #[must_use]
    pub fn json_write(&self, field: &str) -> NullableJson {
        match self.fields.get(field) {
            Some(FieldWrite::Json(write)) => write.clone(),
            _ => NullableJson::Unset,
        }
    }
}

/// Validates the data of a new `entity` row.
///
/// `back` is the relation on `entity` leading to the parent of a nested
/// create; it and its foreign keys are set by the parent and may not
/// appear in the payload. `allow_relations` is `false` for `createMany`
/// rows, which carry columns only.
pub(crate) fn parse_create(
    walker: &mut Walker,
    entity: Entity,
    value: &Value,
    back: Option<&'static RelationField>,
    allow_relations: bool,
) -> Validated<CreatePayload> {
    let def = entity.def();
    let input = walker.object(value)?;
    let mut payload = CreatePayload {
        entity,
        fields: BTreeMap::new(),
        relations: BTreeMap::new(),
    };

    for (key, argument) in input {
        walker.at_key(key, |inner| {
            match def.field(key) {
                Some(_) if is_back_reference(back, key) => {}
                Some(FieldKind::Scalar(field)) => {
                    let write = write_value(inner, field, argument)?;
                    payload.fields.insert(field.name, write);
                    return Ok(());
                }
                Some(FieldKind::Relation(relation)) if allow_relations => {
                    let write = parse_relation_write(inner, relation, argument, WriteMode::Create)?;
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

    link_relations(walker, def, back, &mut payload)?;
    apply_defaults(walker, def, back, &mut payload)?;
    Ok(payload)
}

/// Records foreign-key links and checks every required relation is set.
fn link_relations(
    walker: &mut Walker,
    def: &EntityDef,
    back: Option<&'static RelationField>,
    payload: &mut CreatePayload,
) -> Validated<()> {
    for relation in def.relations.iter().filter(|relation| relation.is_owning()) {
        if is_back_reference(back, relation.name) {
            continue;
        }
        let by_key = relation
            .foreign_keys
            .iter()
            .any(|column| payload.fields.contains_key(column));
        let by_relation = payload.relations.contains_key(relation.name);
        match (by_key, by_relation) {
            (true, true) => {
                return walker.at_key(relation.name, |inner| {
                    inner.fail(ValidationErrorKind::ConflictingRelationInput {
                        relation: relation.name,
                    })
                });
            }
            (true, false) => {
                payload
                    .relations
                    .insert(relation.name, RelationLink::ByForeignKey);
            }
            (false, false) if relation.cardinality == Cardinality::One => {
                return walker.fail(ValidationErrorKind::MissingRequiredField {
                    field: relation.name,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Fills omitted columns from their defaults and rejects missing required
/// columns.
fn apply_defaults(
    walker: &Walker,
    def: &EntityDef,
    back: Option<&'static RelationField>,
    payload: &mut CreatePayload,
) -> Validated<()> {
    for field in def.scalars {
        if payload.fields.contains_key(field.name)
            || is_back_reference(back, field.name)
            || def.is_foreign_key(field.name)
        {
            continue;
        }
        let write = match field.default {
            Some(default) => default_write(default),
            None if field.updated_at => FieldWrite::Generated(GeneratedValue::Now),
            None if field.list => FieldWrite::List(Vec::new()),
            None if field.is_required_on_create() => {
                return walker.fail(ValidationErrorKind::MissingRequiredField {
                    field: field.name,
                });
            }
            None => continue,
        };
        payload.fields.insert(field.name, write);
    }
    Ok(())
}

/// Literal defaults are stored as-is; generated ones are left to the
/// executor.
const fn default_write(default: FieldDefault) -> FieldWrite {
    match default {
        FieldDefault::Boolean(flag) => FieldWrite::Value(ScalarValue::Boolean(flag)),
        FieldDefault::Cuid => FieldWrite::Generated(GeneratedValue::Cuid),
        FieldDefault::Now => FieldWrite::Generated(GeneratedValue::Now),
    }
}
