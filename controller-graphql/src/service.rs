//! Executes GraphQL requests against the controller schema.

use std::convert::Infallible;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use async_graphql::dynamic::Schema;
use async_graphql::ErrorExtensionValues;
use async_graphql::Request;
use async_graphql::Response;
use async_graphql::ServerError;
use async_graphql::Value;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;
use tracing::warn;

use crate::repository::Repositories;

/// A schema bound to its collaborators.
///
/// Cheap to clone; every clone shares the same schema and repositories.
#[derive(Clone)]
pub struct GraphqlService {
    schema: Schema,
    repositories: Repositories,
    timeout: Duration,
}

impl GraphqlService {
    pub fn new(schema: Schema, repositories: Repositories, timeout: Duration) -> Self {
        Self {
            schema,
            repositories,
            timeout,
        }
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// Runs one request under the configured timeout.
    ///
    /// A request that runs out of time is dropped along with every
    /// collaborator call it still had in flight.
    pub async fn execute(&self, request: Request) -> Response {
        let request = request.data(self.repositories.clone());
        debug!(operation = ?request.operation_name, "executing request");
        match tokio::time::timeout(self.timeout, self.schema.execute(request)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(timeout = ?self.timeout, "request timed out");
                Response::from_errors(vec![timeout_error(self.timeout)])
            }
        }
    }
}

fn timeout_error(timeout: Duration) -> ServerError {
    let mut extensions = ErrorExtensionValues::default();
    extensions.set("code", Value::String("TIMEOUT".to_string()));
    let mut error = ServerError::new(format!("request timed out after {timeout:?}"), None);
    error.extensions = Some(extensions);
    error
}

impl tower::Service<Request> for GraphqlService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let service = self.clone();
        async move { Ok(service.execute(request).await) }.boxed()
    }
}

impl std::fmt::Debug for GraphqlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
