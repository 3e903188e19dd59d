//! Collaborators every resolver reaches the datastore through.
//!
//! Each trait is object safe and cheap to share; a request carries one
//! [`Repositories`] handle in its data and resolvers borrow from it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RepoError;
use crate::event::Event;
use crate::model::*;
use crate::query::EventQuery;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Looks an app up by id or by name.
    async fn get(&self, id: &str) -> Result<App, RepoError>;

    async fn list(&self) -> Result<Vec<App>, RepoError>;

    /// Apps with the given ids, silently skipping unknown ones.
    async fn list_ids(&self, ids: &[String]) -> Result<Vec<App>, RepoError>;

    /// The release currently deployed for the app.
    async fn current_release(&self, app_id: &str) -> Result<Release, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Release, RepoError>;

    /// Like `get`, but also finds releases that have since been deleted.
    async fn get_deleted(&self, id: &str) -> Result<Release, RepoError>;

    /// Releases with the given ids, deleted ones included.
    async fn list_deleted(&self, ids: &[String]) -> Result<Vec<Release>, RepoError>;

    async fn list(&self) -> Result<Vec<Release>, RepoError>;

    async fn app_list(&self, app_id: &str) -> Result<Vec<Release>, RepoError>;

    async fn add(&self, release: Release) -> Result<Release, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Artifact, RepoError>;

    async fn list(&self) -> Result<Vec<Artifact>, RepoError>;

    async fn list_ids(&self, ids: &[String]) -> Result<HashMap<String, Artifact>, RepoError>;

    async fn add(&self, artifact: Artifact) -> Result<Artifact, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait FormationRepository: Send + Sync {
    async fn get(&self, app_id: &str, release_id: &str) -> Result<Formation, RepoError>;

    async fn get_expanded(
        &self,
        app_id: &str,
        release_id: &str,
    ) -> Result<ExpandedFormation, RepoError>;

    async fn list(&self, app_id: &str) -> Result<Vec<Formation>, RepoError>;

    /// Every formation with at least one running process.
    async fn list_active(&self) -> Result<Vec<ExpandedFormation>, RepoError>;

    async fn put(&self, formation: Formation) -> Result<Formation, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Deployment, RepoError>;

    async fn list(&self, app_id: &str) -> Result<Vec<Deployment>, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Job, RepoError>;

    async fn list(&self, app_id: &str) -> Result<Vec<Job>, RepoError>;

    async fn list_active(&self) -> Result<Vec<Job>, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Provider, RepoError>;

    async fn list(&self) -> Result<Vec<Provider>, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Resource, RepoError>;

    async fn list(&self) -> Result<Vec<Resource>, RepoError>;

    async fn app_list(&self, app_id: &str) -> Result<Vec<Resource>, RepoError>;

    async fn provider_list(&self, provider_id: &str) -> Result<Vec<Resource>, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn get_event(&self, id: i64) -> Result<Event, RepoError>;

    /// Events matching the query, newest first.
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, RepoError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn list_routes(&self, parent_ref: &str) -> Result<Vec<Route>, RepoError>;

    async fn list_cert_routes(&self, cert_id: &str) -> Result<Vec<Route>, RepoError>;

    async fn get_route(&self, parent_ref: &str, kind: &str, id: &str)
        -> Result<Route, RepoError>;
}

/// The collaborator set handed to every resolver.
#[derive(Clone)]
pub struct Repositories {
    pub apps: Arc<dyn AppRepository>,
    pub releases: Arc<dyn ReleaseRepository>,
    pub artifacts: Arc<dyn ArtifactRepository>,
    pub formations: Arc<dyn FormationRepository>,
    pub deployments: Arc<dyn DeploymentRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub providers: Arc<dyn ProviderRepository>,
    pub resources: Arc<dyn ResourceRepository>,
    pub events: Arc<dyn EventRepository>,
    pub routes: Arc<dyn RouteRepository>,
}

impl Repositories {
    /// Uses one store for every collaborator.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AppRepository
            + ReleaseRepository
            + ArtifactRepository
            + FormationRepository
            + DeploymentRepository
            + JobRepository
            + ProviderRepository
            + ResourceRepository
            + EventRepository
            + RouteRepository
            + 'static,
    {
        Repositories {
            apps: store.clone(),
            releases: store.clone(),
            artifacts: store.clone(),
            formations: store.clone(),
            deployments: store.clone(),
            jobs: store.clone(),
            providers: store.clone(),
            resources: store.clone(),
            events: store.clone(),
            routes: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;
    use static_assertions::assert_obj_safe;

    use super::*;

    assert_obj_safe!(
        AppRepository,
        ReleaseRepository,
        ArtifactRepository,
        FormationRepository,
        DeploymentRepository,
        JobRepository,
        ProviderRepository,
        ResourceRepository,
        EventRepository,
        RouteRepository
    );
    assert_impl_all!(Repositories: Clone, Send, Sync);
}
