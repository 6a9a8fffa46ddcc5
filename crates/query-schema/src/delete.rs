//! Delete scoping and cascade planning.
//!
//! A delete names its rows through a filter and leaves dependent rows to
//! the executor. [`cascade_plan`] walks the registry's `OnDelete` rules so
//! the executor knows, before touching the target, which dependent rows to
//! remove and which foreign keys to clear.

use serde::Serialize;
use serde_json::Value;

use crate::filter::{WhereInput, WhereScope, WhereUniqueInput, parse_where, parse_where_unique};
use crate::registry::{Entity, EntityDef, OnDelete};
use crate::walk::{Validated, Walker};

/// Rows a delete removes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "where", rename_all = "camelCase")]
pub enum DeleteScope {
    /// At most one row, identified by a unique key.
    Unique(WhereUniqueInput),
    /// Every row matching the filter.
    Many(WhereInput),
}

/// One dependent relation the executor handles before deleting.
///
/// A step touches only the `entity` rows reached from the deleted rows by
/// following `path`. The same relation may appear in several steps when
/// dependents are reachable along more than one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeStep {
    /// Entity holding the foreign key.
    pub entity: Entity,
    /// Owning relation on `entity`.
    pub relation: &'static str,
    /// Entity whose deletion triggers the step.
    pub parent: Entity,
    /// What happens to the dependent rows.
    pub action: OnDelete,
    /// Relation names followed from the deleted rows to the affected rows.
    pub path: Vec<&'static str>,
}

/// Validated delete with its cascade plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    entity: Entity,
    scope: DeleteScope,
    cascades: Vec<CascadeStep>,
}

impl DeletePlan {
    /// Entity deleted.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Rows deleted.
    #[must_use]
    pub const fn scope(&self) -> &DeleteScope {
        &self.scope
    }

    /// Dependent relations in execution order.
    ///
    /// Every step precedes the step that removes its parent rows: links are
    /// cleared and deeper dependents removed before the rows they point at.
    #[must_use]
    pub fn cascades(&self) -> &[CascadeStep] {
        &self.cascades
    }

    pub(crate) fn parse_unique(
        walker: &mut Walker,
        entity: Entity,
        value: &Value,
    ) -> Validated<Self> {
        let filter = parse_where_unique(walker, entity, value)?;
        Ok(Self::new(entity, DeleteScope::Unique(filter)))
    }

    pub(crate) fn parse_many(
        walker: &mut Walker,
        entity: Entity,
        value: &Value,
    ) -> Validated<Self> {
        let filter = parse_where(walker, entity, value, WhereScope::Full)?;
        Ok(Self::new(entity, DeleteScope::Many(filter)))
    }

    fn new(entity: Entity, scope: DeleteScope) -> Self {
        Self {
            entity,
            scope,
            cascades: cascade_plan(entity),
        }
    }
}

/// Lists the dependent relations affected by deleting `entity` rows.
///
/// # Examples
///
/// ```
/// use query_schema::registry::{Entity, OnDelete};
/// use query_schema::cascade_plan;
///
/// let plan = cascade_plan(Entity::Category);
///
/// assert_eq!(plan.len(), 1);
/// assert_eq!(plan[0].entity, Entity::Bookmark);
/// assert_eq!(plan[0].action, OnDelete::SetNull);
/// assert_eq!(plan[0].path, ["bookmarks"]);
/// ```
#[must_use]
pub fn cascade_plan(entity: Entity) -> Vec<CascadeStep> {
    let mut planner = Planner::default();
    planner.visit(entity.def());
    planner.steps
}

#[derive(Default)]
struct Planner {
    /// Entities being deleted on the current branch.
    deleting: Vec<Entity>,
    path: Vec<&'static str>,
    steps: Vec<CascadeStep>,
}

impl Planner {
    fn visit(&mut self, def: &EntityDef) {
        self.deleting.push(def.entity);
        for relation in def.relations.iter().filter(|relation| !relation.is_owning()) {
            let Some(owning) = EntityDef::inverse_of(relation) else {
                continue;
            };
            let dependent = relation.target;
            self.path.push(relation.name);
            if owning.on_delete == OnDelete::Cascade && !self.deleting.contains(&dependent) {
                self.visit(dependent.def());
            }
            self.steps.push(CascadeStep {
                entity: dependent,
                relation: owning.name,
                parent: def.entity,
                action: owning.on_delete,
                path: self.path.clone(),
            });
            self.path.pop();
        }
        self.deleting.pop();
    }
}
