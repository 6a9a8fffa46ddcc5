//! Static entity definitions.

use super::field::{
    Cardinality, FieldDefault, OnDelete, RelationField, ScalarField, ScalarType, UniqueKey,
};
use super::{Entity, EntityDef};

use Cardinality::{One, OptionalOne};
use ScalarType::{Boolean, DateTime, Int, Json, String};

const ID: ScalarField = ScalarField::required("id", String).with_default(FieldDefault::Cuid);
const CREATED_AT: ScalarField =
    ScalarField::required("createdAt", DateTime).with_default(FieldDefault::Now);
const UPDATED_AT: ScalarField = ScalarField::required("updatedAt", DateTime).auto_updated();

const ID_KEY: UniqueKey = UniqueKey {
    name: "id",
    fields: &["id"],
};

const fn owned_by_user(inverse: &'static str, cardinality: Cardinality) -> RelationField {
    RelationField::belongs_to(
        "user",
        Entity::User,
        cardinality,
        inverse,
        &["userId"],
        OnDelete::Cascade,
    )
}

pub(super) static USER: EntityDef = EntityDef {
    entity: Entity::User,
    scalars: &[
        ID,
        ScalarField::optional("name", String),
        ScalarField::optional("email", String),
        ScalarField::optional("emailVerified", DateTime),
        ScalarField::optional("image", String),
        ScalarField::optional("settings", Json),
        CREATED_AT,
    ],
    relations: &[
        RelationField::has_many("accounts", Entity::Account, "user"),
        RelationField::has_many("sessions", Entity::Session, "user"),
        RelationField::has_many("bookmarks", Entity::Bookmark, "user"),
        RelationField::has_many("tags", Entity::Tag, "user"),
        RelationField::has_many("categories", Entity::Category, "user"),
        RelationField::has_many("feeds", Entity::Feed, "user"),
        RelationField::has_many("feedEntries", Entity::FeedEntry, "user"),
        RelationField::has_many("feedEntryMedia", Entity::FeedEntryMedia, "user"),
    ],
    unique_keys: &[
        ID_KEY,
        UniqueKey {
            name: "email",
            fields: &["email"],
        },
    ],
};

// `expires_at` is an epoch-seconds integer in the provider payloads.
pub(super) static ACCOUNT: EntityDef = EntityDef {
    entity: Entity::Account,
    scalars: &[
        ID,
        ScalarField::required("userId", String),
        ScalarField::required("type", String),
        ScalarField::required("provider", String),
        ScalarField::required("providerAccountId", String),
        ScalarField::optional("refresh_token", String),
        ScalarField::optional("access_token", String),
        ScalarField::optional("expires_at", Int),
        ScalarField::optional("token_type", String),
        ScalarField::optional("scope", String),
        ScalarField::optional("id_token", String),
        ScalarField::optional("session_state", String),
        ScalarField::optional("oauth_token_secret", String),
        ScalarField::optional("oauth_token", String),
    ],
    relations: &[owned_by_user("accounts", One)],
    unique_keys: &[
        ID_KEY,
        UniqueKey {
            name: "provider_providerAccountId",
            fields: &["provider", "providerAccountId"],
        },
    ],
};

pub(super) static SESSION: EntityDef = EntityDef {
    entity: Entity::Session,
    scalars: &[
        ID,
        ScalarField::required("sessionToken", String),
        ScalarField::required("userId", String),
        ScalarField::required("expires", DateTime),
    ],
    relations: &[owned_by_user("sessions", One)],
    unique_keys: &[
        ID_KEY,
        UniqueKey {
            name: "sessionToken",
            fields: &["sessionToken"],
        },
    ],
};

pub(super) static VERIFICATION_TOKEN: EntityDef = EntityDef {
    entity: Entity::VerificationToken,
    scalars: &[
        ScalarField::required("identifier", String),
        ScalarField::required("token", String),
        ScalarField::required("expires", DateTime),
    ],
    relations: &[],
    unique_keys: &[
        UniqueKey {
            name: "token",
            fields: &["token"],
        },
        UniqueKey {
            name: "identifier_token",
            fields: &["identifier", "token"],
        },
    ],
};

pub(super) static BOOKMARK: EntityDef = EntityDef {
    entity: Entity::Bookmark,
    scalars: &[
        ID,
        ScalarField::required("url", String),
        ScalarField::optional("title", String),
        ScalarField::optional("image", String),
        ScalarField::optional("imageBlur", String),
        ScalarField::optional("desc", String),
        ScalarField::optional("metadata", Json),
        ScalarField::required("archived", Boolean).with_default(FieldDefault::Boolean(false)),
        ScalarField::optional("categoryId", String),
        ScalarField::optional("userId", String),
        CREATED_AT,
        UPDATED_AT,
    ],
    relations: &[
        RelationField::belongs_to(
            "category",
            Entity::Category,
            OptionalOne,
            "bookmarks",
            &["categoryId"],
            OnDelete::SetNull,
        ),
        owned_by_user("bookmarks", OptionalOne),
        RelationField::has_many("tags", Entity::BookmarkTag, "bookmark"),
    ],
    unique_keys: &[
        ID_KEY,
        UniqueKey {
            name: "url_userId",
            fields: &["url", "userId"],
        },
    ],
};

pub(super) static CATEGORY: EntityDef = EntityDef {
    entity: Entity::Category,
    scalars: &[
        ID,
        ScalarField::required("name", String),
        ScalarField::optional("description", String),
        ScalarField::optional("userId", String),
        CREATED_AT,
        UPDATED_AT,
    ],
    relations: &[
        RelationField::has_many("bookmarks", Entity::Bookmark, "category"),
        owned_by_user("categories", OptionalOne),
    ],
    unique_keys: &[
        ID_KEY,
        UniqueKey {
            name: "name_userId",
            fields: &["name", "userId"],
        },
    ],
};

pub(super) static TAG: EntityDef = EntityDef {
    entity: Entity::Tag,
    scalars: &[
        ID,
        ScalarField::required("name", String),
        ScalarField::optional("emoji", String),
        ScalarField::optional("userId", String),
        CREATED_AT,
        UPDATED_AT,
    ],
    relations: &[
        RelationField::has_many("bookmarks", Entity::BookmarkTag, "tag"),
        owned_by_user("tags", OptionalOne),
    ],
    unique_keys: &[
        ID_KEY,
        UniqueKey {
            name: "name_userId",
            fields: &["name", "userId"],
        },
    ],
};

pub(super) static BOOKMARK_TAG: EntityDef = EntityDef {
    entity: Entity::BookmarkTag,
    scalars: &[
        ScalarField::required("bookmarkId", String),
        ScalarField::required("tagId", String),
    ],
    relations: &[
        RelationField::belongs_to(
            "bookmark",
            Entity::Bookmark,
            One,
            "tags",
            &["bookmarkId"],
            OnDelete::Cascade,
        ),
        RelationField::belongs_to(
            "tag",
            Entity::Tag,
            One,
            "bookmarks",
            &["tagId"],
            OnDelete::Cascade,
        ),
    ],
    unique_keys: &[UniqueKey {
        name: "bookmarkId_tagId",
        fields: &["bookmarkId", "tagId"],
    }],
};

pub(super) static FEED: EntityDef = EntityDef {
    entity: Entity::Feed,
    scalars: &[
        ID,
        ScalarField::required("name", String),
        ScalarField::required("url", String),
        ScalarField::optional("description", String),
        ScalarField::optional("language", String),
        ScalarField::optional("copyright", String),
        ScalarField::optional("lastFetched", DateTime),
        ScalarField::required("userId", String),
        CREATED_AT,
        UPDATED_AT,
    ],
    relations: &[
        RelationField::has_many("feedEntries", Entity::FeedEntry, "feed"),
        owned_by_user("feeds", One),
    ],
    unique_keys: &[
        ID_KEY,
        UniqueKey {
            name: "url_userId",
            fields: &["url", "userId"],
        },
    ],
};

pub(super) static FEED_ENTRY: EntityDef = EntityDef {
    entity: Entity::FeedEntry,
    scalars: &[
        ID,
        ScalarField::optional("guid", String),
        ScalarField::required("title", String),
        ScalarField::required("link", String),
        ScalarField::optional("content", String),
        ScalarField::optional("contentSnippet", String),
        ScalarField::optional("author", String),
        ScalarField::optional("ingested", DateTime).with_default(FieldDefault::Now),
        ScalarField::optional("published", DateTime),
        ScalarField::required("unread", Boolean).with_default(FieldDefault::Boolean(true)),
        ScalarField::list("categories", String),
        ScalarField::required("feedId", String),
        ScalarField::required("userId", String),
        CREATED_AT,
        UPDATED_AT,
    ],
    relations: &[
        RelationField::belongs_to(
            "feed",
            Entity::Feed,
            One,
            "feedEntries",
            &["feedId"],
            OnDelete::Cascade,
        ),
        owned_by_user("feedEntries", One),
        RelationField::has_many("feedMedia", Entity::FeedEntryMedia, "feedEntry"),
    ],
    unique_keys: &[ID_KEY],
};

pub(super) static FEED_ENTRY_MEDIA: EntityDef = EntityDef {
    entity: Entity::FeedEntryMedia,
    scalars: &[
        ID,
        ScalarField::required("href", String),
        ScalarField::optional("title", String),
        ScalarField::optional("medium", String),
        ScalarField::optional("height", Int),
        ScalarField::optional("width", Int),
        ScalarField::optional("description", String),
        ScalarField::optional("credit", String),
        ScalarField::required("feedEntryId", String),
        ScalarField::required("userId", String),
        CREATED_AT,
        UPDATED_AT,
    ],
    relations: &[
        RelationField::belongs_to(
            "feedEntry",
            Entity::FeedEntry,
            One,
            "feedMedia",
            &["feedEntryId"],
            OnDelete::Cascade,
        ),
        owned_by_user("feedEntryMedia", One),
    ],
    unique_keys: &[ID_KEY],
};
