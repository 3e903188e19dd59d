#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_graphql::Request;
use controller_graphql::build_schema;
use controller_graphql::memory::Fixture;
use controller_graphql::GraphqlService;
use controller_graphql::MemoryStore;
use controller_graphql::Repositories;
use serde_json::Value;

pub const CLUSTER: &str = include_str!("fixtures/cluster.yaml");

/// A store seeded with the cluster fixture, with no calls recorded yet.
pub fn store() -> Arc<MemoryStore> {
    let fixture = Fixture::from_yaml(CLUSTER).expect("fixture must parse");
    Arc::new(MemoryStore::from_fixture(fixture))
}

pub fn service(repositories: Repositories) -> GraphqlService {
    GraphqlService::new(
        build_schema().expect("schema must build"),
        repositories,
        Duration::from_secs(5),
    )
}

pub fn store_service(store: &Arc<MemoryStore>) -> GraphqlService {
    service(Repositories::from_store(store.clone()))
}

pub async fn execute(service: &GraphqlService, query: &str) -> Value {
    let response = service.execute(Request::new(query)).await;
    serde_json::to_value(response).expect("response must serialize")
}

/// Runs a query against a fresh cluster fixture.
pub async fn query(query: &str) -> (Value, Arc<MemoryStore>) {
    let store = store();
    let response = execute(&store_service(&store), query).await;
    (response, store)
}
