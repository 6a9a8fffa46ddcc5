//! Entity model registry.
//!
//! The registry is a static catalogue describing every persisted entity:
//! its scalar columns, its relations, and the unique keys that identify a
//! single row. Everything above this module resolves field names through
//! [`field_kind`] at validation time, so relations between entities (for
//! example Bookmark → Tag → Bookmark) never require eager expansion.
//!
//! Adding a column to an entity only touches [`catalogue`].

mod catalogue;
mod field;
mod relevance;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use field::{
    Cardinality, FieldDefault, OnDelete, RelationField, ScalarField, ScalarType, UniqueKey,
};
pub use relevance::{
    AccountRelevanceField, BookmarkRelevanceField, BookmarkTagRelevanceField,
    CategoryRelevanceField, FeedEntryMediaRelevanceField, FeedEntryRelevanceField,
    FeedRelevanceField, RelevanceField, SessionRelevanceField, TagRelevanceField,
    UserRelevanceField, VerificationTokenRelevanceField,
};

/// Every persisted entity of the data model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Entity {
    /// Application user owning all other content.
    User,
    /// OAuth account linked to a user.
    Account,
    /// Login session.
    Session,
    /// Passwordless sign-in token.
    VerificationToken,
    /// Saved link.
    Bookmark,
    /// Folder-like grouping of bookmarks.
    Category,
    /// Label attached to bookmarks.
    Tag,
    /// Join row linking a bookmark to a tag.
    BookmarkTag,
    /// Subscribed RSS/Atom feed.
    Feed,
    /// Item published by a feed.
    FeedEntry,
    /// Media enclosure attached to a feed entry.
    FeedEntryMedia,
}

impl Entity {
    /// All entities in catalogue order.
    pub const ALL: [Self; 11] = [
        Self::User,
        Self::Account,
        Self::Session,
        Self::VerificationToken,
        Self::Bookmark,
        Self::Category,
        Self::Tag,
        Self::BookmarkTag,
        Self::Feed,
        Self::FeedEntry,
        Self::FeedEntryMedia,
    ];

    /// Entity name as used in error messages and CLI arguments.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Account => "Account",
            Self::Session => "Session",
            Self::VerificationToken => "VerificationToken",
            Self::Bookmark => "Bookmark",
            Self::Category => "Category",
            Self::Tag => "Tag",
            Self::BookmarkTag => "BookmarkTag",
            Self::Feed => "Feed",
            Self::FeedEntry => "FeedEntry",
            Self::FeedEntryMedia => "FeedEntryMedia",
        }
    }

    /// Catalogue definition of the entity.
    #[must_use]
    pub const fn def(self) -> &'static EntityDef {
        match self {
            Self::User => &catalogue::USER,
            Self::Account => &catalogue::ACCOUNT,
            Self::Session => &catalogue::SESSION,
            Self::VerificationToken => &catalogue::VERIFICATION_TOKEN,
            Self::Bookmark => &catalogue::BOOKMARK,
            Self::Category => &catalogue::CATEGORY,
            Self::Tag => &catalogue::TAG,
            Self::BookmarkTag => &catalogue::BOOKMARK_TAG,
            Self::Feed => &catalogue::FEED,
            Self::FeedEntry => &catalogue::FEED_ENTRY,
            Self::FeedEntryMedia => &catalogue::FEED_ENTRY_MEDIA,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when an entity name does not exist in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity '{name}'")]
pub struct UnknownEntity {
    /// The name that failed to resolve.
    pub name: String,
}

impl FromStr for Entity {
    type Err = UnknownEntity;

    /// Parses an entity name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|entity| entity.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEntity { name: s.to_owned() })
    }
}

/// Static definition of one entity.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityDef {
    /// The entity described.
    pub entity: Entity,
    /// Scalar columns in declaration order.
    pub scalars: &'static [ScalarField],
    /// Relations in declaration order.
    pub relations: &'static [RelationField],
    /// Unique keys; the first one is the primary key.
    pub unique_keys: &'static [UniqueKey],
}

/// Resolved meaning of a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A scalar column.
    Scalar(&'static ScalarField),
    /// A relation to another entity.
    Relation(&'static RelationField),
}

impl EntityDef {
    /// Looks up a scalar column by name.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&'static ScalarField> {
        self.scalars.iter().find(|field| field.name == name)
    }

    /// Looks up a relation by name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&'static RelationField> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    /// Resolves a field name to a scalar column or a relation.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldKind> {
        self.scalar(name)
            .map(FieldKind::Scalar)
            .or_else(|| self.relation(name).map(FieldKind::Relation))
    }

    /// The primary key, i.e. the first declared unique key.
    #[must_use]
    pub fn primary_key(&self) -> Option<&'static UniqueKey> {
        self.unique_keys.first()
    }

    /// Finds a unique key by name.
    #[must_use]
    pub fn unique_key(&self, name: &str) -> Option<&'static UniqueKey> {
        self.unique_keys.iter().find(|key| key.name == name)
    }

    /// Finds the relation whose foreign key includes `field`.
    #[must_use]
    pub fn relation_for_foreign_key(&self, field: &str) -> Option<&'static RelationField> {
        self.relations
            .iter()
            .find(|relation| relation.foreign_keys.contains(&field))
    }

    /// Returns `true` if `field` is a foreign-key column.
    #[must_use]
    pub fn is_foreign_key(&self, field: &str) -> bool {
        self.relation_for_foreign_key(field).is_some()
    }

    /// The column refreshed on every update, if the entity has one.
    #[must_use]
    pub fn updated_at_field(&self) -> Option<&'static ScalarField> {
        self.scalars.iter().find(|field| field.updated_at)
    }

    /// Relations with more than one row on the far side.
    pub fn to_many_relations(&self) -> impl Iterator<Item = &'static RelationField> {
        self.relations
            .iter()
            .filter(|relation| relation.cardinality.is_many())
    }

    /// The inverse of `relation`, declared on its target entity.
    #[must_use]
    pub fn inverse_of(relation: &RelationField) -> Option<&'static RelationField> {
        relation.target.def().relation(relation.inverse)
    }
}

/// Resolves `field` on `entity` to a scalar column or a relation.
///
/// Returns `None` for names the catalogue does not declare.
///
/// # Examples
///
/// ```
/// use query_schema::registry::{Entity, FieldKind, ScalarType, field_kind};
///
/// let Some(FieldKind::Scalar(field)) = field_kind(Entity::Bookmark, "archived") else {
///     panic!("archived is a scalar column");
/// };
/// assert_eq!(field.scalar, ScalarType::Boolean);
/// assert!(field_kind(Entity::Bookmark, "missing").is_none());
/// ```
#[must_use]
pub fn field_kind(entity: Entity, field: &str) -> Option<FieldKind> {
    entity.def().field(field)
}

#[cfg(test)]
mod tests;
