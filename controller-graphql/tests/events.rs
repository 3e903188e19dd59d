use bytes::Bytes;
use controller_graphql::event::Event;
use controller_graphql::event::EventType;
use serde_json::json;

mod common;

#[tokio::test]
async fn events_resolve_to_the_object_of_their_discriminator() {
    let (response, _) = common::query("{ events { __typename id object_type } }").await;
    assert_eq!(
        response,
        json!({"data": {"events": [
            {"__typename": "EventAppDeletion", "id": 7, "object_type": "app_deletion"},
            {"__typename": "EventScale", "id": 6, "object_type": "scale"},
            {"__typename": "EventClusterBackup", "id": 5, "object_type": "cluster_backup"},
            {"__typename": "EventReleaseDeletion", "id": 4, "object_type": "release_deletion"},
            {"__typename": "EventAppRelease", "id": 3, "object_type": "app_release"},
            {"__typename": "EventRelease", "id": 2, "object_type": "release"},
            {"__typename": "EventApp", "id": 1, "object_type": "app"},
        ]}})
    );
}

#[tokio::test]
async fn cursors_are_exclusive() {
    let (response, _) = common::query("{ events(before_id: 6, since_id: 2) { id } }").await;
    assert_eq!(
        response,
        json!({"data": {"events": [{"id": 5}, {"id": 4}, {"id": 3}]}})
    );
}

#[tokio::test]
async fn listing_filters_compose() {
    let (response, _) = common::query(
        r#"{
            scoped: events(app_id: "a2") { id }
            typed: events(object_types: ["scale", "release"]) { id }
            object: events(object_id: "a1", count: 1) { id }
            limited: events(count: 2) { id }
            unlimited: events(count: 0) { id }
        }"#,
    )
    .await;
    let data = &response["data"];
    assert_eq!(data["scoped"], json!([{"id": 7}]));
    assert_eq!(data["typed"], json!([{"id": 6}, {"id": 2}]));
    assert_eq!(data["object"], json!([{"id": 3}]));
    assert_eq!(data["limited"], json!([{"id": 7}, {"id": 6}]));
    assert_eq!(data["unlimited"].as_array().map(Vec::len), Some(7));
}

#[tokio::test]
async fn events_are_listed_with_a_single_call() {
    let (response, store) = common::query(
        "{ events { id ... on EventScale { data { processes } } } }",
    )
    .await;
    assert!(response.get("errors").is_none(), "{response}");
    assert_eq!(store.call_count("events.list_events"), 1);
    assert_eq!(store.calls(), vec!["events.list_events()".to_string()]);
}

#[tokio::test]
async fn unselected_relationships_are_never_fetched() {
    let (response, store) = common::query(
        "{ event(id: 7) { id ... on EventAppDeletion { data { error app_deletion { routes { id } } } } } }",
    )
    .await;
    assert_eq!(
        response,
        json!({"data": {"event": {
            "id": 7,
            "data": {"error": "", "app_deletion": {"routes": [{"id": "rt9"}]}},
        }}})
    );
    assert_eq!(store.call_count("apps.get"), 0);
}

#[tokio::test]
async fn unscoped_events_have_no_app() {
    let (response, store) =
        common::query("{ event(id: 5) { app { id } ... on EventClusterBackup { data { size } } } }")
            .await;
    assert_eq!(
        response,
        json!({"data": {"event": {"app": null, "data": {"size": 1024}}}})
    );
    assert_eq!(store.call_count("apps.get"), 0);
}

#[tokio::test]
async fn release_deletions_fall_back_to_the_event_app() {
    let (response, store) = common::query(
        r#"{ event(id: 4) { ... on EventReleaseDeletion { data { release_deletion {
            app { id }
            release { id }
            remaining_apps { name }
            deleted_files
        } } } } }"#,
    )
    .await;
    assert_eq!(
        response,
        json!({"data": {"event": {"data": {"release_deletion": {
            "app": {"id": "a1"},
            "release": {"id": "r0"},
            "remaining_apps": [{"name": "worker"}],
            "deleted_files": ["https://blobstore.example.com/old.tar"],
        }}}}})
    );
    assert_eq!(store.call_count("releases.get_deleted"), 1);
    assert_eq!(store.call_count("releases.get"), 0);
}

#[tokio::test]
async fn a_corrupt_payload_only_fails_its_own_data() {
    let store = common::store();
    store.insert_event(Event {
        id: 8,
        object_type: EventType::Release,
        object_id: "r3".into(),
        app_id: "a1".into(),
        created_at: None,
        data: Bytes::from_static(b"{\"id\": \"r3\", \"artifacts\": "),
    });

    let response = common::execute(
        &common::store_service(&store),
        r#"{ events(count: 3) {
            id
            ... on EventRelease { data { id } }
            ... on EventScale { data { processes } }
        } }"#,
    )
    .await;
    assert_eq!(
        response["data"],
        json!({"events": [
            {"id": 8, "data": null},
            {"id": 7},
            {"id": 6, "data": {"processes": {"web": 2}}},
        ]})
    );
    let errors = response["errors"].as_array().expect("one error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["path"], json!(["events", 0, "data"]));
    assert_eq!(errors[0]["extensions"]["code"], "PAYLOAD_DECODE_ERROR");
}

#[tokio::test]
async fn a_corrupt_payload_keeps_the_rest_of_its_event() {
    let store = common::store();
    store.insert_event(Event {
        id: 8,
        object_type: EventType::Release,
        object_id: "r3".into(),
        app_id: "a1".into(),
        created_at: None,
        data: Bytes::from_static(b"\xff not json"),
    });

    let response = common::execute(
        &common::store_service(&store),
        r#"{ events(count: 3) {
            id
            object_type
            app { id }
            ... on EventRelease { data { id } }
        } }"#,
    )
    .await;
    assert_eq!(
        response["data"],
        json!({"events": [
            {"id": 8, "object_type": "release", "app": {"id": "a1"}, "data": null},
            {"id": 7, "object_type": "app_deletion", "app": {"id": "a2"}},
            {"id": 6, "object_type": "scale", "app": {"id": "a1"}},
        ]})
    );
    let errors = response["errors"].as_array().expect("one error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["path"], json!(["events", 0, "data"]));
    assert_eq!(errors[0]["extensions"]["code"], "PAYLOAD_DECODE_ERROR");
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_event_log() {
    let (response, store) = common::query(r#"{ events(object_types: ["app_update"]) { id } }"#).await;
    assert_eq!(response["data"], json!({"events": null}));
    assert_eq!(response["errors"][0]["extensions"]["code"], "INVALID_ARGUMENT");
    assert_eq!(store.call_count("events.list_events"), 0);
}

#[tokio::test]
async fn unknown_events_are_not_found() {
    let (response, _) = common::query("{ event(id: 99) { id } }").await;
    assert_eq!(response["data"], json!({"event": null}));
    assert_eq!(response["errors"][0]["extensions"]["code"], "NOT_FOUND");
}
