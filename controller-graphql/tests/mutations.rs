use serde_json::json;

mod common;

#[tokio::test]
async fn created_artifacts_are_logged() {
    let store = common::store();
    let service = common::store_service(&store);

    let response = common::execute(
        &service,
        r#"mutation { createArtifact(type: docker, uri: "https://registry.example.com/api", meta: {team: "core"}) {
            id type uri meta
        } }"#,
    )
    .await;
    let artifact = &response["data"]["createArtifact"];
    assert_eq!(artifact["type"], "docker");
    assert_eq!(artifact["uri"], "https://registry.example.com/api");
    assert_eq!(artifact["meta"], json!({"team": "core"}));
    let id = artifact["id"].as_str().expect("an id is assigned");
    assert!(!id.is_empty());

    let response = common::execute(
        &service,
        r#"{ events(object_types: ["artifact"]) { id object_id ... on EventArtifact { data { uri } } } }"#,
    )
    .await;
    assert_eq!(
        response,
        json!({"data": {"events": [
            {"id": 8, "object_id": id, "data": {"uri": "https://registry.example.com/api"}},
        ]}})
    );
}

#[tokio::test]
async fn created_releases_resolve_their_artifacts() {
    let (mut response, store) = common::query(
        r#"mutation { createRelease(
            id: "r9",
            artifacts: ["art1", "art2"],
            env: {PORT: "80"},
            processes: {web: {args: ["bin/web"]}}
        ) {
            id env image_artifact { id } file_artifacts { id }
            processes
        } }"#,
    )
    .await;
    let processes = response["data"]["createRelease"]["processes"].take();
    assert_eq!(processes["web"]["args"], json!(["bin/web"]));
    assert_eq!(
        response,
        json!({"data": {"createRelease": {
            "id": "r9",
            "env": {"PORT": "80"},
            "processes": null,
            "image_artifact": {"id": "art1"},
            "file_artifacts": [{"id": "art2"}],
        }}})
    );
    assert_eq!(store.call_count("releases.add"), 1);
}

#[tokio::test]
async fn invalid_release_arguments_are_rejected_before_writing() {
    let (response, store) = common::query(
        r#"mutation { createRelease(artifacts: ["art1"], processes: {web: "oops"}) { id } }"#,
    )
    .await;
    assert_eq!(response["data"], json!({"createRelease": null}));
    assert_eq!(response["errors"][0]["extensions"]["code"], "INVALID_ARGUMENT");
    assert_eq!(store.call_count("releases.add"), 0);
}

#[tokio::test]
async fn releases_with_unknown_artifacts_are_not_created() {
    let store = common::store();
    let service = common::store_service(&store);
    let response = common::execute(
        &service,
        r#"mutation { createRelease(id: "r9", artifacts: ["missing"]) { id } }"#,
    )
    .await;
    assert_eq!(response["errors"][0]["extensions"]["code"], "NOT_FOUND");

    let response = common::execute(&service, r#"{ release(id: "r9") { id } }"#).await;
    assert_eq!(response["data"], json!({"release": null}));
}

#[tokio::test]
async fn formations_need_a_known_app() {
    let (response, _) = common::query(
        r#"mutation { putFormation(app: "api", release: "r2", processes: {web: 1}) { processes } }"#,
    )
    .await;
    assert_eq!(response["data"], json!({"putFormation": null}));
    assert_eq!(response["errors"][0]["extensions"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn scaling_a_formation_logs_both_counts() {
    let store = common::store();
    let service = common::store_service(&store);

    let response = common::execute(
        &service,
        r#"mutation { putFormation(app: "web", release: "r2", processes: {web: 3}) {
            app { id } release { id } processes
        } }"#,
    )
    .await;
    assert_eq!(
        response,
        json!({"data": {"putFormation": {
            "app": {"id": "a1"},
            "release": {"id": "r2"},
            "processes": {"web": 3},
        }}})
    );

    store.clear_calls();
    let response = common::execute(
        &service,
        r#"{ events(count: 1) { object_type app { id } ... on EventScale { data {
            prev_processes processes release { id }
        } } } }"#,
    )
    .await;
    assert_eq!(
        response,
        json!({"data": {"events": [{
            "object_type": "scale",
            "app": {"id": "a1"},
            "data": {"prev_processes": {"web": 2}, "processes": {"web": 3}, "release": {"id": "r2"}},
        }]}})
    );
    assert_eq!(store.call_count("events.list_events"), 1);
    assert_eq!(store.call_count("formations.put"), 0);
}
