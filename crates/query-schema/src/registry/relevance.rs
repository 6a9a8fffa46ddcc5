//! Text-bearing fields eligible for relevance ordering.
//!
//! Each entity gets a closed enum of its non-list string columns so that a
//! relevance request naming anything else is rejected at the type boundary.

use std::fmt;

use serde::{Serialize, Serializer};

use super::Entity;

macro_rules! relevance_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $field:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                #[doc = concat!("The `", $field, "` column.")]
                $variant,
            )+
        }

        impl $name {
            /// Every relevance field of the entity in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Field name as used in query input.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $field,)+
                }
            }

            /// Parses a field name, returning `None` for non-text fields.
            #[must_use]
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $($field => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

relevance_enum!(
    /// Relevance fields of [`Entity::User`].
    UserRelevanceField {
        Id => "id",
        Name => "name",
        Email => "email",
        Image => "image",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::Account`].
    AccountRelevanceField {
        Id => "id",
        UserId => "userId",
        Type => "type",
        Provider => "provider",
        ProviderAccountId => "providerAccountId",
        RefreshToken => "refresh_token",
        AccessToken => "access_token",
        TokenType => "token_type",
        Scope => "scope",
        IdToken => "id_token",
        SessionState => "session_state",
        OauthTokenSecret => "oauth_token_secret",
        OauthToken => "oauth_token",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::Session`].
    SessionRelevanceField {
        Id => "id",
        SessionToken => "sessionToken",
        UserId => "userId",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::VerificationToken`].
    VerificationTokenRelevanceField {
        Identifier => "identifier",
        Token => "token",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::Bookmark`].
    BookmarkRelevanceField {
        Id => "id",
        Url => "url",
        Title => "title",
        Image => "image",
        ImageBlur => "imageBlur",
        Desc => "desc",
        CategoryId => "categoryId",
        UserId => "userId",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::Category`].
    CategoryRelevanceField {
        Id => "id",
        Name => "name",
        Description => "description",
        UserId => "userId",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::Tag`].
    TagRelevanceField {
        Id => "id",
        Name => "name",
        Emoji => "emoji",
        UserId => "userId",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::BookmarkTag`].
    BookmarkTagRelevanceField {
        BookmarkId => "bookmarkId",
        TagId => "tagId",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::Feed`].
    FeedRelevanceField {
        Id => "id",
        Name => "name",
        Url => "url",
        Description => "description",
        Language => "language",
        Copyright => "copyright",
        UserId => "userId",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::FeedEntry`].
    FeedEntryRelevanceField {
        Id => "id",
        Guid => "guid",
        Title => "title",
        Link => "link",
        Content => "content",
        ContentSnippet => "contentSnippet",
        Author => "author",
        FeedId => "feedId",
        UserId => "userId",
    }
);

relevance_enum!(
    /// Relevance fields of [`Entity::FeedEntryMedia`].
    FeedEntryMediaRelevanceField {
        Id => "id",
        Href => "href",
        Title => "title",
        Medium => "medium",
        Description => "description",
        Credit => "credit",
        FeedEntryId => "feedEntryId",
        UserId => "userId",
    }
);

/// A relevance field of any entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelevanceField {
    /// A [`UserRelevanceField`].
    User(UserRelevanceField),
    /// An [`AccountRelevanceField`].
    Account(AccountRelevanceField),
    /// A [`SessionRelevanceField`].
    Session(SessionRelevanceField),
    /// A [`VerificationTokenRelevanceField`].
    VerificationToken(VerificationTokenRelevanceField),
    /// A [`BookmarkRelevanceField`].
    Bookmark(BookmarkRelevanceField),
    /// A [`CategoryRelevanceField`].
    Category(CategoryRelevanceField),
    /// A [`TagRelevanceField`].
    Tag(TagRelevanceField),
    /// A [`BookmarkTagRelevanceField`].
    BookmarkTag(BookmarkTagRelevanceField),
    /// A [`FeedRelevanceField`].
    Feed(FeedRelevanceField),
    /// A [`FeedEntryRelevanceField`].
    FeedEntry(FeedEntryRelevanceField),
    /// A [`FeedEntryMediaRelevanceField`].
    FeedEntryMedia(FeedEntryMediaRelevanceField),
}

impl RelevanceField {
    /// Parses `name` as a relevance field of `entity`.
    #[must_use]
    pub fn parse(entity: Entity, name: &str) -> Option<Self> {
        match entity {
            Entity::User => UserRelevanceField::parse(name).map(Self::User),
            Entity::Account => AccountRelevanceField::parse(name).map(Self::Account),
            Entity::Session => SessionRelevanceField::parse(name).map(Self::Session),
            Entity::VerificationToken => {
                VerificationTokenRelevanceField::parse(name).map(Self::VerificationToken)
            }
            Entity::Bookmark => BookmarkRelevanceField::parse(name).map(Self::Bookmark),
            Entity::Category => CategoryRelevanceField::parse(name).map(Self::Category),
            Entity::Tag => TagRelevanceField::parse(name).map(Self::Tag),
            Entity::BookmarkTag => BookmarkTagRelevanceField::parse(name).map(Self::BookmarkTag),
            Entity::Feed => FeedRelevanceField::parse(name).map(Self::Feed),
            Entity::FeedEntry => FeedEntryRelevanceField::parse(name).map(Self::FeedEntry),
            Entity::FeedEntryMedia => {
                FeedEntryMediaRelevanceField::parse(name).map(Self::FeedEntryMedia)
            }
        }
    }

    /// Field name as used in query input.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User(field) => field.as_str(),
            Self::Account(field) => field.as_str(),
            Self::Session(field) => field.as_str(),
            Self::VerificationToken(field) => field.as_str(),
            Self::Bookmark(field) => field.as_str(),
            Self::Category(field) => field.as_str(),
            Self::Tag(field) => field.as_str(),
            Self::BookmarkTag(field) => field.as_str(),
            Self::Feed(field) => field.as_str(),
            Self::FeedEntry(field) => field.as_str(),
            Self::FeedEntryMedia(field) => field.as_str(),
        }
    }

    /// Entity the field belongs to.
    #[must_use]
    pub const fn entity(self) -> Entity {
        match self {
            Self::User(_) => Entity::User,
            Self::Account(_) => Entity::Account,
            Self::Session(_) => Entity::Session,
            Self::VerificationToken(_) => Entity::VerificationToken,
            Self::Bookmark(_) => Entity::Bookmark,
            Self::Category(_) => Entity::Category,
            Self::Tag(_) => Entity::Tag,
            Self::BookmarkTag(_) => Entity::BookmarkTag,
            Self::Feed(_) => Entity::Feed,
            Self::FeedEntry(_) => Entity::FeedEntry,
            Self::FeedEntryMedia(_) => Entity::FeedEntryMedia,
        }
    }

    /// Names of every relevance field of `entity`, in declaration order.
    #[must_use]
    pub fn field_names(entity: Entity) -> Vec<&'static str> {
        fn names<T: Copy>(all: &[T], name: fn(T) -> &'static str) -> Vec<&'static str> {
            all.iter().copied().map(name).collect()
        }

        match entity {
            Entity::User => names(UserRelevanceField::ALL, UserRelevanceField::as_str),
            Entity::Account => names(AccountRelevanceField::ALL, AccountRelevanceField::as_str),
            Entity::Session => names(SessionRelevanceField::ALL, SessionRelevanceField::as_str),
            Entity::VerificationToken => names(
                VerificationTokenRelevanceField::ALL,
                VerificationTokenRelevanceField::as_str,
            ),
            Entity::Bookmark => names(BookmarkRelevanceField::ALL, BookmarkRelevanceField::as_str),
            Entity::Category => names(CategoryRelevanceField::ALL, CategoryRelevanceField::as_str),
            Entity::Tag => names(TagRelevanceField::ALL, TagRelevanceField::as_str),
            Entity::BookmarkTag => names(
                BookmarkTagRelevanceField::ALL,
                BookmarkTagRelevanceField::as_str,
            ),
            Entity::Feed => names(FeedRelevanceField::ALL, FeedRelevanceField::as_str),
            Entity::FeedEntry => {
                names(FeedEntryRelevanceField::ALL, FeedEntryRelevanceField::as_str)
            }
            Entity::FeedEntryMedia => names(
                FeedEntryMediaRelevanceField::ALL,
                FeedEntryMediaRelevanceField::as_str,
            ),
        }
    }
}

impl fmt::Display for RelevanceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RelevanceField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
