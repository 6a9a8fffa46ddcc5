//! Catalogue integrity checks.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use rstest::rstest;

use super::*;

#[rstest]
#[case::exact("Bookmark", Entity::Bookmark)]
#[case::lowercase("feedentrymedia", Entity::FeedEntryMedia)]
#[case::mixed("verificationTOKEN", Entity::VerificationToken)]
fn parses_entity_names_ignoring_case(#[case] input: &str, #[case] expected: Entity) {
    let entity: Entity = input.parse().expect("known entity");

    assert_eq!(entity, expected);
}

#[test]
fn rejects_unknown_entity_names() {
    let err = "Folder".parse::<Entity>().expect_err("unknown entity");

    assert_eq!(err.to_string(), "unknown entity 'Folder'");
}

#[test]
fn definitions_describe_their_own_entity() {
    for entity in Entity::ALL {
        assert_eq!(entity.def().entity, entity, "{entity} definition mismatch");
    }
}

#[test]
fn every_relation_has_a_matching_inverse() {
    for entity in Entity::ALL {
        for relation in entity.def().relations {
            let inverse = EntityDef::inverse_of(relation).expect("inverse declared");
            assert_eq!(
                inverse.target, entity,
                "{entity}.{} inverse points elsewhere",
                relation.name
            );
            assert_eq!(inverse.inverse, relation.name);
            assert!(
                relation.is_owning() != inverse.is_owning(),
                "{entity}.{} must have exactly one owning side",
                relation.name
            );
        }
    }
}

#[test]
fn foreign_keys_and_unique_keys_name_real_columns() {
    for entity in Entity::ALL {
        let def = entity.def();
        let columns = def
            .relations
            .iter()
            .flat_map(|relation| relation.foreign_keys.iter())
            .chain(def.unique_keys.iter().flat_map(|key| key.fields.iter()));
        for column in columns {
            assert!(
                def.scalar(column).is_some(),
                "{entity}.{column} is not a scalar column"
            );
        }
        assert!(def.primary_key().is_some(), "{entity} has no primary key");
    }
}

#[test]
fn compound_key_names_join_their_fields() {
    for entity in Entity::ALL {
        for key in entity.def().unique_keys {
            assert_eq!(key.name, key.fields.join("_"));
        }
    }
}

#[test]
fn relevance_enums_match_string_columns() {
    for entity in Entity::ALL {
        let expected: Vec<&str> = entity
            .def()
            .scalars
            .iter()
            .filter(|field| field.scalar == ScalarType::String && !field.list)
            .map(|field| field.name)
            .collect();

        assert_eq!(RelevanceField::field_names(entity), expected, "{entity}");
        for name in expected {
            let field = RelevanceField::parse(entity, name).expect("relevance field");
            assert_eq!(field.as_str(), name);
            assert_eq!(field.entity(), entity);
        }
    }
}

#[rstest]
#[case::scalar(Entity::Bookmark, "url", true)]
#[case::relation(Entity::Bookmark, "tags", false)]
#[case::foreign_key(Entity::FeedEntry, "feedId", true)]
fn resolves_field_kinds(#[case] entity: Entity, #[case] field: &str, #[case] is_scalar: bool) {
    let kind = field_kind(entity, field).expect("known field");

    assert_eq!(matches!(kind, FieldKind::Scalar(_)), is_scalar);
}

#[test]
fn bookmark_defaults_match_the_data_model() {
    let def = Entity::Bookmark.def();
    let archived = def.scalar("archived").expect("archived column");

    assert_eq!(archived.default, Some(FieldDefault::Boolean(false)));
    assert!(!archived.is_required_on_create());
    assert!(def.scalar("url").expect("url column").is_required_on_create());
    assert_eq!(
        def.updated_at_field().map(|field| field.name),
        Some("updatedAt")
    );
    assert!(def.is_foreign_key("categoryId"));
    assert_eq!(
        def.relation_for_foreign_key("categoryId")
            .map(|relation| relation.on_delete),
        Some(OnDelete::SetNull)
    );
}

#[test]
fn join_entity_is_keyed_by_both_sides() {
    let key = Entity::BookmarkTag
        .def()
        .primary_key()
        .expect("join primary key");

    assert!(key.is_compound());
    assert_eq!(key.fields, ["bookmarkId", "tagId"]);
}
