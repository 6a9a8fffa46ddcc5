//! Tests for create and update payloads.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use std::num::NonZeroI32;

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::limits::ValidationLimits;
use crate::registry::Entity;

fn create(entity: Entity, value: &Value) -> Validated<CreatePayload> {
    parse_create(
        &mut Walker::new(ValidationLimits::default()),
        entity,
        value,
        None,
        true,
    )
}

fn update(entity: Entity, value: &Value) -> Validated<UpdatePayload> {
    parse_update(
        &mut Walker::new(ValidationLimits::default()),
        entity,
        value,
        None,
        true,
    )
}

fn text(value: &str) -> ScalarValue {
    ScalarValue::String(value.to_owned())
}

#[test]
fn create_materialises_defaults() {
    let payload = create(Entity::Bookmark, &json!({"url": "https://example.com"}))
        .expect("minimal bookmark");

    assert_eq!(
        payload.field("url"),
        Some(&FieldWrite::Value(text("https://example.com")))
    );
    assert_eq!(
        payload.field("archived"),
        Some(&FieldWrite::Value(ScalarValue::Boolean(false)))
    );
    assert_eq!(
        payload.field("id"),
        Some(&FieldWrite::Generated(GeneratedValue::Cuid))
    );
    assert_eq!(
        payload.field("createdAt"),
        Some(&FieldWrite::Generated(GeneratedValue::Now))
    );
    assert_eq!(
        payload.field("updatedAt"),
        Some(&FieldWrite::Generated(GeneratedValue::Now))
    );
    assert!(payload.field("title").is_none());
    assert_eq!(payload.json_write("metadata"), NullableJson::Unset);
    assert!(payload.relations().is_empty());
}

#[test]
fn create_defaults_feed_entry_flags_and_lists() {
    let payload = create(
        Entity::FeedEntry,
        &json!({"title": "t", "link": "l", "feedId": "f1", "userId": "u1"}),
    )
    .expect("feed entry");

    assert_eq!(
        payload.field("unread"),
        Some(&FieldWrite::Value(ScalarValue::Boolean(true)))
    );
    assert_eq!(
        payload.field("ingested"),
        Some(&FieldWrite::Generated(GeneratedValue::Now))
    );
    assert_eq!(payload.field("categories"), Some(&FieldWrite::List(Vec::new())));
    assert_eq!(payload.relation("feed"), Some(&RelationLink::ByForeignKey));
    assert_eq!(payload.relation("user"), Some(&RelationLink::ByForeignKey));
}

#[rstest]
#[case::no_feed(json!({"title": "t", "link": "l", "userId": "u1"}), "feed")]
#[case::no_title(json!({"link": "l", "feedId": "f1", "userId": "u1"}), "title")]
fn create_requires_fields_and_relations(#[case] input: Value, #[case] field: &str) {
    let err = create(Entity::FeedEntry, &input).expect_err("incomplete entry");

    assert_eq!(err.code(), "missing_required_field");
    assert_eq!(err.details()["field"], json!(field));
}

#[test]
fn relation_may_not_be_set_twice() {
    let err = create(
        Entity::Bookmark,
        &json!({"url": "u", "categoryId": "c1", "category": {"connect": {"id": "c1"}}}),
    )
    .expect_err("conflicting link");

    assert_eq!(
        err.kind,
        ValidationErrorKind::ConflictingRelationInput {
            relation: "category",
        }
    );
    assert_eq!(err.path.to_string(), "category");
}

#[test]
fn required_relation_can_be_linked_by_relation() {
    let payload = create(
        Entity::FeedEntry,
        &json!({
            "title": "t",
            "link": "l",
            "feed": {"connect": {"id": "f1"}},
            "user": {"connectOrCreate": {"where": {"email": "a@b"}, "create": {"email": "a@b"}}},
        }),
    )
    .expect("linked through relations");

    let Some(RelationLink::ByRelation(feed)) = payload.relation("feed") else {
        panic!("feed should be linked by relation");
    };
    assert_eq!(feed.target, Entity::Feed);
    assert!(matches!(feed.ops.as_slice(), [RelationOp::Connect(lookups)] if lookups.len() == 1));
    assert!(payload.field("feedId").is_none());
}

#[test]
fn nested_create_excludes_the_back_relation() {
    let err = create(
        Entity::User,
        &json!({"bookmarks": {"create": [{"url": "a", "user": {"connect": {"id": "u1"}}}]}}),
    )
    .expect_err("back relation is implied");

    assert_eq!(err.code(), "unknown_field");
    assert_eq!(err.path.to_string(), "bookmarks.create[0].user");
}

#[test]
fn nested_create_through_the_join_entity() {
    let payload = create(
        Entity::Bookmark,
        &json!({"url": "u", "tags": {"create": [{"tag": {"connect": {"id": "t1"}}}]}}),
    )
    .expect("tagged bookmark");

    let Some(RelationLink::ByRelation(tags)) = payload.relation("tags") else {
        panic!("tags should be written");
    };
    let [RelationOp::Create(rows)] = tags.ops.as_slice() else {
        panic!("expected one create operation");
    };
    let row = rows.first().expect("one join row");
    assert_eq!(row.entity(), Entity::BookmarkTag);
    assert!(row.field("bookmarkId").is_none());
    assert!(row.relation("tag").is_some());
}

#[test]
fn create_many_rows_carry_columns_only() {
    let err = create(
        Entity::User,
        &json!({"feeds": {"createMany": {"data": [{"name": "n", "url": "u", "feedEntries": {}}]}}}),
    )
    .expect_err("relations are not allowed in createMany");

    assert_eq!(err.path.to_string(), "feeds.createMany.data[0].feedEntries");

    let payload = create(
        Entity::User,
        &json!({
            "feeds": {
                "createMany": {"data": {"name": "n", "url": "u"}, "skipDuplicates": true}
            }
        }),
    )
    .expect("valid createMany");
    let Some(RelationLink::ByRelation(feeds)) = payload.relation("feeds") else {
        panic!("feeds should be written");
    };
    assert!(matches!(
        feeds.ops.as_slice(),
        [RelationOp::CreateMany { data, skip_duplicates: true }] if data.len() == 1
    ));
}

#[test]
fn create_rejects_update_operations() {
    let err = create(
        Entity::Bookmark,
        &json!({"url": "u", "category": {"update": {"name": "x"}}}),
    )
    .expect_err("update is not a create operation");

    assert_eq!(err.code(), "operator_mismatch");
    assert_eq!(err.path.to_string(), "category.update");
}

#[rstest]
#[case::json_null(json!("JsonNull"), NullableJson::JsonNull)]
#[case::db_null(json!("DbNull"), NullableJson::DbNull)]
#[case::null(json!(null), NullableJson::DbNull)]
#[case::document(json!({"og": "x"}), NullableJson::Literal(json!({"og": "x"})))]
fn json_writes_keep_null_intent(#[case] metadata: Value, #[case] expected: NullableJson) {
    let payload = create(Entity::Bookmark, &json!({"url": "u", "metadata": metadata}))
        .expect("json write");

    assert_eq!(payload.json_write("metadata"), expected);
}

#[test]
fn update_refreshes_the_timestamp() {
    let payload = update(Entity::FeedEntryMedia, &json!({"height": {"increment": 5}}))
        .expect("valid update");

    assert_eq!(
        payload.field("height"),
        Some(&FieldUpdate::Int(IntOperation::Increment(5)))
    );
    assert_eq!(
        payload.field("updatedAt"),
        Some(&FieldUpdate::Set(FieldWrite::Generated(GeneratedValue::Now)))
    );

    let cleared = update(Entity::Tag, &json!({"emoji": null})).expect("clear emoji");
    assert_eq!(cleared.field("emoji"), Some(&FieldUpdate::Set(FieldWrite::Null)));
}

#[rstest]
#[case::past(json!("2024-01-01T00:00:00Z"))]
#[case::future(json!("2999-01-01T00:00:00Z"))]
fn update_timestamp_cannot_be_written(#[case] stamp: Value) {
    let err = update(Entity::Tag, &json!({"updatedAt": stamp, "emoji": null}))
        .expect_err("timestamp is maintained automatically");

    assert_eq!(err.code(), "invalid_value");
    assert_eq!(err.path.to_string(), "updatedAt");
}

#[test]
fn join_entity_updates_have_no_timestamp() {
    let payload = update(Entity::BookmarkTag, &json!({"tagId": "t2"})).expect("relink");

    assert_eq!(payload.fields().len(), 1);
    assert_eq!(payload.relation("tag"), Some(&RelationLink::ByForeignKey));
}

#[rstest]
#[case::list_set(json!(["a", "b"]), ListUpdate::Set(vec![text("a"), text("b")]))]
#[case::list_set_op(json!({"set": []}), ListUpdate::Set(Vec::new()))]
#[case::push_one(json!({"push": "c"}), ListUpdate::Push(vec![text("c")]))]
#[case::push_many(json!({"push": ["c", "d"]}), ListUpdate::Push(vec![text("c"), text("d")]))]
fn list_updates(#[case] categories: Value, #[case] expected: ListUpdate) {
    let payload = update(Entity::FeedEntry, &json!({"categories": categories}))
        .expect("list update");

    assert_eq!(payload.field("categories"), Some(&FieldUpdate::List(expected)));
}

#[test]
fn list_update_semantics() {
    let current = [text("a")];

    assert_eq!(
        ListUpdate::Push(vec![text("b")]).apply(&current),
        [text("a"), text("b")]
    );
    assert_eq!(ListUpdate::Set(vec![text("b")]).apply(&current), [text("b")]);
}

#[test]
fn int_operations_are_checked() {
    let two = NonZeroI32::new(2).expect("non-zero");

    assert_eq!(IntOperation::Decrement(1).apply(i32::MIN), None);
    assert_eq!(IntOperation::Divide(two).apply(9), Some(4));
    assert_eq!(
        IntOperation::Divide(NonZeroI32::new(-1).expect("non-zero")).apply(i32::MIN),
        None
    );
}

#[rstest]
#[case::divide_by_zero(json!({"width": {"divide": 0}}), "invalid_value", "width.divide")]
#[case::two_operations(
    json!({"width": {"increment": 1, "decrement": 1}}),
    "invalid_value",
    "width"
)]
#[case::arithmetic_on_text(
    json!({"title": {"increment": 1}}),
    "operator_mismatch",
    "title.increment"
)]
#[case::null_on_required(json!({"href": null}), "invalid_value", "href")]
#[case::unknown(json!({"size": 1}), "unknown_field", "size")]
fn rejects_invalid_updates(#[case] input: Value, #[case] code: &str, #[case] path: &str) {
    let err = update(Entity::FeedEntryMedia, &input).expect_err("invalid update");

    assert_eq!(err.code(), code);
    assert_eq!(err.path.to_string(), path);
}

#[test]
fn optional_relations_can_be_disconnected() {
    let payload = update(Entity::Bookmark, &json!({"category": {"disconnect": true}}))
        .expect("optional relation");
    let Some(RelationLink::ByRelation(category)) = payload.relation("category") else {
        panic!("category should be written");
    };
    assert_eq!(
        category.ops,
        [RelationOp::Disconnect(vec![NestedTarget::Linked])]
    );

    let err = update(Entity::FeedEntry, &json!({"feed": {"disconnect": true}}))
        .expect_err("feed is required");
    assert_eq!(err.code(), "operator_mismatch");
}

#[test]
fn to_many_updates_use_unique_lookups_and_scalar_filters() {
    let payload = update(
        Entity::Feed,
        &json!({
            "feedEntries": {
                "update": {"where": {"id": "e1"}, "data": {"unread": false}},
                "updateMany": {"where": {"unread": true}, "data": {"unread": false}},
                "deleteMany": [{"published": null}],
                "set": [],
            }
        }),
    )
    .expect("to-many update");

    let Some(RelationLink::ByRelation(entries)) = payload.relation("feedEntries") else {
        panic!("feedEntries should be written");
    };
    assert_eq!(entries.ops.len(), 4);
    assert!(entries.ops.iter().any(|op| matches!(
        op,
        RelationOp::Update(updates)
            if matches!(updates.as_slice(), [NestedUpdate { target: NestedTarget::Unique(_), .. }])
    )));

    let err = update(
        Entity::Feed,
        &json!({"feedEntries": {"updateMany": {"where": {"feed": {}}, "data": {}}}}),
    )
    .expect_err("relations are not scalar filters");
    assert_eq!(err.path.to_string(), "feedEntries.updateMany.where.feed");
}

#[test]
fn to_one_update_accepts_bare_data_and_upsert() {
    let payload = update(
        Entity::FeedEntry,
        &json!({
            "feed": {
                "upsert": {
                    "create": {"name": "n", "url": "u", "userId": "u1"},
                    "update": {"name": "n"},
                }
            }
        }),
    )
    .expect("upsert");
    let Some(RelationLink::ByRelation(feed)) = payload.relation("feed") else {
        panic!("feed should be written");
    };
    assert!(matches!(
        feed.ops.as_slice(),
        [RelationOp::Upsert(upserts)] if upserts.len() == 1
    ));

    let payload = update(Entity::FeedEntry, &json!({"feed": {"update": {"name": "renamed"}}}))
        .expect("bare update data");
    let Some(RelationLink::ByRelation(feed)) = payload.relation("feed") else {
        panic!("feed should be written");
    };
    let [RelationOp::Update(updates)] = feed.ops.as_slice() else {
        panic!("expected an update");
    };
    assert!(updates.first().is_some_and(|nested| {
        nested.target == NestedTarget::Linked && nested.data.field("name").is_some()
    }));
}
