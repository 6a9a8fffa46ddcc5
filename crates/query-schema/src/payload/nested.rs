//! Nested relation writes inside create and update payloads.

use serde::Serialize;
use serde_json::{Map, Value};

use super::create::{CreatePayload, parse_create};
use super::required;
use super::update::{UpdatePayload, parse_update};
use crate::filter::{
    WhereInput, WhereScope, WhereUniqueInput, mismatch, parse_where, parse_where_unique,
};
use crate::projection::reject_unknown_arguments;
use crate::registry::{Cardinality, Entity, EntityDef, RelationField};
use crate::walk::{Validated, Walker};

const CREATE_TO_ONE: &[&str] = &["connect", "connectOrCreate", "create"];
const CREATE_TO_MANY: &[&str] = &["connect", "connectOrCreate", "create", "createMany"];
const UPDATE_TO_ONE: &[&str] = &["connect", "connectOrCreate", "create", "update", "upsert"];
const UPDATE_OPTIONAL_ONE: &[&str] = &[
    "connect",
    "connectOrCreate",
    "create",
    "delete",
    "disconnect",
    "update",
    "upsert",
];
const UPDATE_TO_MANY: &[&str] = &[
    "connect",
    "connectOrCreate",
    "create",
    "createMany",
    "delete",
    "deleteMany",
    "disconnect",
    "set",
    "update",
    "updateMany",
    "upsert",
];

/// Which payload a nested write appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Create,
    Update,
}

/// Rows a nested operation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NestedTarget {
    /// The row currently linked through a to-one relation.
    Linked,
    /// Related rows matching a filter.
    Matching(WhereInput),
    /// One related row identified by a unique key.
    Unique(WhereUniqueInput),
}

/// Link an existing row, or create it when the lookup finds nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectOrCreate {
    /// Row to link.
    #[serde(rename = "where")]
    pub filter: WhereUniqueInput,
    /// Row to create otherwise.
    pub create: CreatePayload,
}

/// Changes to related rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedUpdate {
    /// Rows changed.
    pub target: NestedTarget,
    /// The changes.
    pub data: UpdatePayload,
}

/// Update the target row, or create it when it does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedUpsert {
    /// Row looked up.
    pub target: NestedTarget,
    /// Changes applied when the row exists.
    pub update: UpdatePayload,
    /// Row created otherwise.
    pub create: CreatePayload,
}

/// One nested operation on a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationOp {
    /// Create and link new rows.
    Create(Vec<CreatePayload>),
    /// Bulk-create rows that carry columns only.
    CreateMany {
        /// The rows.
        data: Vec<CreatePayload>,
        /// Skip rows that violate a unique key instead of failing.
        #[serde(rename = "skipDuplicates")]
        skip_duplicates: bool,
    },
    /// Link existing rows.
    Connect(Vec<WhereUniqueInput>),
    /// Link existing rows or create them.
    ConnectOrCreate(Vec<ConnectOrCreate>),
    /// Replace every linked row.
    Set(Vec<WhereUniqueInput>),
    /// Unlink rows without deleting them.
    Disconnect(Vec<NestedTarget>),
    /// Delete linked rows.
    Delete(Vec<NestedTarget>),
    /// Update linked rows.
    Update(Vec<NestedUpdate>),
    /// Update every linked row matching a filter.
    UpdateMany(Vec<NestedUpdate>),
    /// Delete every linked row matching a filter.
    DeleteMany(Vec<WhereInput>),
    /// Update or create linked rows.
    Upsert(Vec<NestedUpsert>),
}

/// Nested operations on one relation, in operator order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationWrite {
    /// Relation written through.
    pub relation: &'static str,
    /// Entity on the far side.
    pub target: Entity,
    /// The operations.
    pub ops: Vec<RelationOp>,
}

pub(crate) fn parse_relation_write(
    walker: &mut Walker,
    relation: &'static RelationField,
    value: &Value,
    mode: WriteMode,
) -> Validated<RelationWrite> {
    let operations = walker.object(value)?;
    let allowed = allowed_operations(relation.cardinality, mode);
    let mut ops = Vec::with_capacity(operations.len());
    for (operator, argument) in operations {
        let op = walker.at_key(operator, |inner| {
            if !allowed.contains(&operator.as_str()) {
                return mismatch(inner, operator, describe(relation.cardinality, mode));
            }
            NestedWrite::new(relation).parse(inner, operator, argument)
        })?;
        ops.extend(op);
    }
    if !relation.cardinality.is_many() && ops.len() > 1 {
        return walker.invalid("at most one nested write on a to-one relation");
    }
    if mode == WriteMode::Create && ops.is_empty() {
        return walker.invalid("a nested create, connect or connectOrCreate");
    }
    Ok(RelationWrite {
        relation: relation.name,
        target: relation.target,
        ops,
    })
}

const fn allowed_operations(
    cardinality: Cardinality,
    mode: WriteMode,
) -> &'static [&'static str] {
    match (mode, cardinality) {
        (WriteMode::Create, Cardinality::Many) => CREATE_TO_MANY,
        (WriteMode::Create, Cardinality::One | Cardinality::OptionalOne) => CREATE_TO_ONE,
        (WriteMode::Update, Cardinality::Many) => UPDATE_TO_MANY,
        (WriteMode::Update, Cardinality::OptionalOne) => UPDATE_OPTIONAL_ONE,
        (WriteMode::Update, Cardinality::One) => UPDATE_TO_ONE,
    }
}

fn describe(cardinality: Cardinality, mode: WriteMode) -> String {
    match mode {
        WriteMode::Create => format!("{} in a create payload", cardinality.describe()),
        WriteMode::Update => cardinality.describe().to_owned(),
    }
}

/// Parsing context for the operations of one relation.
struct NestedWrite {
    target: Entity,
    many: bool,
    /// Relation on the target leading back to the parent row.
    back: Option<&'static RelationField>,
}

impl NestedWrite {
    fn new(relation: &'static RelationField) -> Self {
        Self {
            target: relation.target,
            many: relation.cardinality.is_many(),
            back: EntityDef::inverse_of(relation),
        }
    }

    fn parse(
        &self,
        walker: &mut Walker,
        operator: &str,
        argument: &Value,
    ) -> Validated<Option<RelationOp>> {
        let op = match operator {
            "create" => RelationOp::Create(self.items(walker, argument, |inner, item| {
                self.create(inner, item, true)
            })?),
            "createMany" => self.create_many(walker, argument)?,
            "connect" => RelationOp::Connect(self.items(walker, argument, |inner, item| {
                self.unique(inner, item)
            })?),
            "connectOrCreate" => {
                RelationOp::ConnectOrCreate(self.items(walker, argument, |inner, item| {
                    self.connect_or_create(inner, item)
                })?)
            }
            "set" => RelationOp::Set(self.items(walker, argument, |inner, item| {
                self.unique(inner, item)
            })?),
            "disconnect" => match self.detach(walker, argument)? {
                Some(targets) => RelationOp::Disconnect(targets),
                None => return Ok(None),
            },
            "delete" => match self.detach(walker, argument)? {
                Some(targets) => RelationOp::Delete(targets),
                None => return Ok(None),
            },
            "update" => RelationOp::Update(self.items(walker, argument, |inner, item| {
                self.update(inner, item)
            })?),
            "updateMany" => {
                RelationOp::UpdateMany(walker.one_or_many(argument, |inner, item| {
                    self.update_many(inner, item)
                })?)
            }
            "deleteMany" => {
                RelationOp::DeleteMany(walker.one_or_many(argument, |inner, item| {
                    parse_where(inner, self.target, item, WhereScope::ScalarOnly)
                })?)
            }
            _ => RelationOp::Upsert(self.items(walker, argument, |inner, item| {
                self.upsert(inner, item)
            })?),
        };
        Ok(Some(op))
    }

    /// Reads one item for a to-one relation, one or many for a to-many one.
    fn items<T>(
        &self,
        walker: &mut Walker,
        argument: &Value,
        mut visit: impl FnMut(&mut Walker, &Value) -> Validated<T>,
    ) -> Validated<Vec<T>> {
        if self.many {
            walker.one_or_many(argument, visit)
        } else {
            Ok(vec![visit(walker, argument)?])
        }
    }

    fn create(
        &self,
        walker: &mut Walker,
        value: &Value,
        allow_relations: bool,
    ) -> Validated<CreatePayload> {
        parse_create(walker, self.target, value, self.back, allow_relations)
    }

    fn unique(&self, walker: &mut Walker, value: &Value) -> Validated<WhereUniqueInput> {
        parse_where_unique(walker, self.target, value)
    }

    fn create_many(&self, walker: &mut Walker, value: &Value) -> Validated<RelationOp> {
        let arguments = walker.object(value)?;
        reject_unknown_arguments(walker, arguments, &["data", "skipDuplicates"])?;
        let rows = required(walker, arguments, "data")?;
        let data = walker.at_key("data", |inner| {
            inner.one_or_many(rows, |item_walker, item| self.create(item_walker, item, false))
        })?;
        let skip_duplicates = match arguments.get("skipDuplicates") {
            Some(flag) => walker.at_key("skipDuplicates", |inner| inner.boolean(flag))?,
            None => false,
        };
        Ok(RelationOp::CreateMany {
            data,
            skip_duplicates,
        })
    }

    fn connect_or_create(
        &self,
        walker: &mut Walker,
        value: &Value,
    ) -> Validated<ConnectOrCreate> {
        let arguments = walker.object(value)?;
        reject_unknown_arguments(walker, arguments, &["create", "where"])?;
        let lookup = required(walker, arguments, "where")?;
        let row = required(walker, arguments, "create")?;
        Ok(ConnectOrCreate {
            filter: walker.at_key("where", |inner| self.unique(inner, lookup))?,
            create: walker.at_key("create", |inner| self.create(inner, row, true))?,
        })
    }

    /// Targets of `disconnect` and `delete`.
    ///
    /// To-one relations take `true` for the linked row or a filter it must
    /// match; `false` is a no-op. To-many relations take unique lookups.
    fn detach(
        &self,
        walker: &mut Walker,
        value: &Value,
    ) -> Validated<Option<Vec<NestedTarget>>> {
        if self.many {
            return walker
                .one_or_many(value, |inner, item| {
                    self.unique(inner, item).map(NestedTarget::Unique)
                })
                .map(Some);
        }
        match value {
            Value::Bool(true) => Ok(Some(vec![NestedTarget::Linked])),
            Value::Bool(false) => Ok(None),
            Value::Object(_) => parse_where(walker, self.target, value, WhereScope::Full)
                .map(|filter| Some(vec![NestedTarget::Matching(filter)])),
            _ => walker.invalid("true, false or a filter"),
        }
    }

    /// To-one: the update data, or `{ where?, data }`. To-many:
    /// `{ where, data }` with a unique lookup.
    fn update(&self, walker: &mut Walker, value: &Value) -> Validated<NestedUpdate> {
        let arguments = walker.object(value)?;
        if !self.many && !is_wrapped(arguments, "data") {
            let data = parse_update(walker, self.target, value, self.back, true)?;
            return Ok(NestedUpdate {
                target: NestedTarget::Linked,
                data,
            });
        }
        reject_unknown_arguments(walker, arguments, &["data", "where"])?;
        let changes = required(walker, arguments, "data")?;
        let target = self.lookup(walker, arguments)?;
        let data = walker.at_key("data", |inner| {
            parse_update(inner, self.target, changes, self.back, true)
        })?;
        Ok(NestedUpdate { target, data })
    }

    fn update_many(&self, walker: &mut Walker, value: &Value) -> Validated<NestedUpdate> {
        let arguments = walker.object(value)?;
        reject_unknown_arguments(walker, arguments, &["data", "where"])?;
        let filter = required(walker, arguments, "where")?;
        let changes = required(walker, arguments, "data")?;
        let target = walker.at_key("where", |inner| {
            parse_where(inner, self.target, filter, WhereScope::ScalarOnly)
        })?;
        let data = walker.at_key("data", |inner| {
            parse_update(inner, self.target, changes, self.back, false)
        })?;
        Ok(NestedUpdate {
            target: NestedTarget::Matching(target),
            data,
        })
    }

    fn upsert(&self, walker: &mut Walker, value: &Value) -> Validated<NestedUpsert> {
        let arguments = walker.object(value)?;
        reject_unknown_arguments(walker, arguments, &["create", "update", "where"])?;
        let changes = required(walker, arguments, "update")?;
        let row = required(walker, arguments, "create")?;
        let target = self.lookup(walker, arguments)?;
        Ok(NestedUpsert {
            target,
            update: walker.at_key("update", |inner| {
                parse_update(inner, self.target, changes, self.back, true)
            })?,
            create: walker.at_key("create", |inner| self.create(inner, row, true))?,
        })
    }

    /// The `where` of an update or upsert: required and unique on to-many
    /// relations, an optional filter on to-one relations.
    fn lookup(
        &self,
        walker: &mut Walker,
        arguments: &Map<String, Value>,
    ) -> Validated<NestedTarget> {
        if self.many {
            let lookup = required(walker, arguments, "where")?;
            return walker
                .at_key("where", |inner| self.unique(inner, lookup))
                .map(NestedTarget::Unique);
        }
        match arguments.get("where") {
            Some(filter) => walker
                .at_key("where", |inner| {
                    parse_where(inner, self.target, filter, WhereScope::Full)
                })
                .map(NestedTarget::Matching),
            None => Ok(NestedTarget::Linked),
        }
    }
}

/// Returns `true` when `arguments` is a `{ where?, <key> }` wrapper rather
/// than bare update data.
fn is_wrapped(arguments: &Map<String, Value>, key: &str) -> bool {
    arguments.contains_key(key)
        && arguments
            .keys()
            .all(|name| name == key || name == "where")
}
