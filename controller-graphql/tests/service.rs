use std::sync::Arc;
use std::time::Duration;

use async_graphql::Request;
use async_trait::async_trait;
use controller_graphql::error::RepoError;
use controller_graphql::model::App;
use controller_graphql::model::Release;
use controller_graphql::repository::AppRepository;
use controller_graphql::Repositories;
use serde_json::json;
use tower::ServiceExt;

mod common;

/// An app store that never answers in time.
struct StalledApps;

#[async_trait]
impl AppRepository for StalledApps {
    async fn get(&self, _id: &str) -> Result<App, RepoError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(RepoError::Failure("unreachable".into()))
    }

    async fn list(&self) -> Result<Vec<App>, RepoError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn list_ids(&self, _ids: &[String]) -> Result<Vec<App>, RepoError> {
        Ok(Vec::new())
    }

    async fn current_release(&self, app_id: &str) -> Result<Release, RepoError> {
        Err(RepoError::not_found("release", app_id))
    }
}

#[tokio::test(start_paused = true)]
async fn slow_requests_time_out() {
    let store = common::store();
    let mut repositories = Repositories::from_store(store.clone());
    repositories.apps = Arc::new(StalledApps);
    let service = common::service(repositories);

    let response = common::execute(&service, "{ apps { id } }").await;
    assert_eq!(response["data"], json!(null));
    assert_eq!(response["errors"][0]["extensions"]["code"], "TIMEOUT");
    assert_eq!(
        response["errors"][0]["message"],
        "request timed out after 5s"
    );
}

#[tokio::test(start_paused = true)]
async fn fast_fields_do_not_wait_on_the_timeout() {
    let store = common::store();
    let mut repositories = Repositories::from_store(store.clone());
    repositories.apps = Arc::new(StalledApps);
    let service = common::service(repositories);

    let response = common::execute(&service, r#"{ release(id: "r1") { id } }"#).await;
    assert_eq!(response, json!({"data": {"release": {"id": "r1"}}}));
}

#[tokio::test]
async fn the_service_is_a_tower_service() {
    let store = common::store();
    let service = common::store_service(&store);
    let response = service
        .oneshot(Request::new("{ providers { name } }"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(response).unwrap(),
        json!({"data": {"providers": [{"name": "postgres"}]}})
    );
}

#[test]
fn the_sdl_lists_every_event_object() {
    let service = common::store_service(&common::store());
    let sdl = service.sdl();
    for object in [
        "EventApp",
        "EventAppDeletion",
        "EventAppRelease",
        "EventDeployment",
        "EventJob",
        "EventScale",
        "EventRelease",
        "EventReleaseDeletion",
        "EventArtifact",
        "EventProvider",
        "EventResource",
        "EventRoute",
        "EventDomainMigration",
        "EventClusterBackup",
        "EventAppGarbageCollection",
    ] {
        assert!(
            sdl.contains(&format!("{object} implements EventInterface")),
            "{object} is missing"
        );
    }
}
