//! HTTP transport for the query service.

use std::future::Future;

use async_graphql_axum::GraphQLRequest;
use async_graphql_axum::GraphQLResponse;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::service::GraphqlService;

/// `GET` returns the SDL, `POST` executes a request.
pub fn router(service: GraphqlService, path: &str) -> Router {
    Router::new()
        .route(path, get(sdl).post(graphql))
        .with_state(service)
}

async fn sdl(State(service): State<GraphqlService>) -> String {
    service.sdl()
}

async fn graphql(
    State(service): State<GraphqlService>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    service.execute(request.into_inner()).await.into()
}

/// Serves until `shutdown` resolves, then lets in-flight requests finish.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!(%address, "GraphQL endpoint listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::repository::Repositories;
    use crate::schema::build_schema;

    fn test_router() -> Router {
        let service = GraphqlService::new(
            build_schema().unwrap(),
            Repositories::from_store(Arc::new(MemoryStore::new())),
            Duration::from_secs(5),
        );
        router(service, "/graphql")
    }

    #[tokio::test]
    async fn it_serves_the_sdl() {
        let response = test_router()
            .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("interface EventInterface"));
    }

    #[tokio::test]
    async fn it_executes_posted_queries() {
        let request = Request::post("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(json!({"query": "{ apps { id } }"}).to_string()))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"data": {"apps": []}}));
    }
}
