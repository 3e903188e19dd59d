//! An in-memory datastore implementing every repository.
//!
//! It backs the binary when it runs from a fixture and the integration tests.
//! Every collaborator call is recorded so callers can check which lookups a
//! query actually made.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::Mutex;
use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;
use tracing::trace;
use uuid::Uuid;

use crate::error::RepoError;
use crate::event::Event;
use crate::event::EventType;
use crate::model::*;
use crate::query::EventQuery;
use crate::repository::*;

/// Records to seed a [`MemoryStore`] with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fixture {
    pub apps: Vec<App>,
    pub releases: Vec<Release>,
    /// Releases that only `get_deleted` and `list_deleted` still find.
    pub deleted_releases: Vec<Release>,
    pub artifacts: Vec<Artifact>,
    pub formations: Vec<Formation>,
    pub deployments: Vec<Deployment>,
    pub jobs: Vec<Job>,
    pub providers: Vec<Provider>,
    pub resources: Vec<Resource>,
    pub routes: Vec<Route>,
    pub events: Vec<EventRecord>,
}

impl Fixture {
    /// Parses a YAML (or JSON) fixture.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }
}

/// An event of a fixture, with its payload written inline.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EventRecord {
    pub id: i64,
    pub object_type: EventType,
    #[serde(default)]
    pub object_id: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub data: serde_json::Value,
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        Event {
            id: record.id,
            object_type: record.object_type,
            object_id: record.object_id,
            app_id: record.app_id,
            created_at: record.created_at,
            data: Bytes::from(record.data.to_string()),
        }
    }
}

#[derive(Default)]
struct State {
    apps: IndexMap<String, App>,
    releases: IndexMap<String, Release>,
    deleted_releases: HashSet<String>,
    artifacts: IndexMap<String, Artifact>,
    formations: IndexMap<(String, String), Formation>,
    deployments: IndexMap<String, Deployment>,
    jobs: IndexMap<String, Job>,
    providers: IndexMap<String, Provider>,
    resources: IndexMap<String, Resource>,
    routes: Vec<Route>,
    events: BTreeMap<i64, Event>,
}

impl State {
    fn app(&self, id: &str) -> Result<&App, RepoError> {
        self.apps
            .get(id)
            .or_else(|| self.apps.values().find(|app| app.name == id))
            .ok_or_else(|| RepoError::not_found("app", id))
    }

    fn release(&self, id: &str, include_deleted: bool) -> Result<&Release, RepoError> {
        self.releases
            .get(id)
            .filter(|_| include_deleted || !self.deleted_releases.contains(id))
            .ok_or_else(|| RepoError::not_found("release", id))
    }

    fn artifact(&self, id: &str) -> Result<&Artifact, RepoError> {
        self.artifacts
            .get(id)
            .ok_or_else(|| RepoError::not_found("artifact", id))
    }

    fn provider(&self, id: &str) -> Result<&Provider, RepoError> {
        self.providers
            .get(id)
            .or_else(|| self.providers.values().find(|provider| provider.name == id))
            .ok_or_else(|| RepoError::not_found("provider", id))
    }

    fn expand(&self, formation: &Formation) -> Result<ExpandedFormation, RepoError> {
        let app = self.app(&formation.app_id)?.clone();
        let release = self.release(&formation.release_id, false)?.clone();
        let image_artifact = release
            .image_artifact_id()
            .map(|id| self.artifact(id).cloned())
            .transpose()?;
        let file_artifacts = release
            .file_artifact_ids()
            .iter()
            .map(|id| self.artifact(id).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExpandedFormation {
            app,
            release,
            image_artifact,
            file_artifacts,
            processes: formation.processes.clone(),
            tags: formation.tags.clone(),
            updated_at: formation.updated_at,
        })
    }

    /// Appends an event the way the controller does after a write.
    fn append_event<T: Serialize>(
        &mut self,
        object_type: EventType,
        object_id: &str,
        app_id: &str,
        data: &T,
    ) -> Result<(), RepoError> {
        let data = serde_json::to_vec(data).map_err(|err| RepoError::Failure(err.to_string()))?;
        let id = self.events.keys().next_back().map_or(1, |last| last + 1);
        self.events.insert(
            id,
            Event {
                id,
                object_type,
                object_id: object_id.to_string(),
                app_id: app_id.to_string(),
                created_at: Some(Utc::now()),
                data: Bytes::from(data),
            },
        );
        Ok(())
    }
}

/// A process-local store behind read/write locks.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let store = MemoryStore::new();
        {
            let mut state = store.state.write();
            state.apps = keyed(fixture.apps, |app| app.id.clone());
            state.deleted_releases = fixture
                .deleted_releases
                .iter()
                .map(|release| release.id.clone())
                .collect();
            state.releases = keyed(
                fixture.releases.into_iter().chain(fixture.deleted_releases),
                |release| release.id.clone(),
            );
            state.artifacts = keyed(fixture.artifacts, |artifact| artifact.id.clone());
            state.formations = keyed(fixture.formations, |formation| {
                (formation.app_id.clone(), formation.release_id.clone())
            });
            state.deployments = keyed(fixture.deployments, |deployment| deployment.id.clone());
            state.jobs = keyed(fixture.jobs, |job| job.id.clone());
            state.providers = keyed(fixture.providers, |provider| provider.id.clone());
            state.resources = keyed(fixture.resources, |resource| resource.id.clone());
            state.routes = fixture.routes;
            state.events = fixture
                .events
                .into_iter()
                .map(|record| (record.id, Event::from(record)))
                .collect();
        }
        store
    }

    /// Stores an event as is, whatever its payload holds.
    pub fn insert_event(&self, event: Event) {
        self.state.write().events.insert(event.id, event);
    }

    /// Every collaborator call made so far, as `repository.method(arguments)`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of calls made to one `repository.method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.split('(').next() == Some(method))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: String) {
        trace!(%call, "memory store call");
        self.calls.lock().push(call);
    }
}

fn keyed<K, V>(records: impl IntoIterator<Item = V>, key: impl Fn(&V) -> K) -> IndexMap<K, V>
where
    K: std::hash::Hash + Eq,
{
    records
        .into_iter()
        .map(|record| (key(&record), record))
        .collect()
}

fn new_id(id: &mut String) {
    if id.is_empty() {
        *id = Uuid::new_v4().to_string();
    }
}

#[async_trait]
impl AppRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<App, RepoError> {
        self.record(format!("apps.get({id})"));
        self.state.read().app(id).cloned()
    }

    async fn list(&self) -> Result<Vec<App>, RepoError> {
        self.record("apps.list()".to_string());
        Ok(self.state.read().apps.values().cloned().collect())
    }

    async fn list_ids(&self, ids: &[String]) -> Result<Vec<App>, RepoError> {
        self.record(format!("apps.list_ids({})", ids.join(",")));
        let state = self.state.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.apps.get(id).cloned())
            .collect())
    }

    async fn current_release(&self, app_id: &str) -> Result<Release, RepoError> {
        self.record(format!("apps.current_release({app_id})"));
        let state = self.state.read();
        let app = state.app(app_id)?;
        state.release(&app.release_id, false).cloned()
    }
}

#[async_trait]
impl ReleaseRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<Release, RepoError> {
        self.record(format!("releases.get({id})"));
        self.state.read().release(id, false).cloned()
    }

    async fn get_deleted(&self, id: &str) -> Result<Release, RepoError> {
        self.record(format!("releases.get_deleted({id})"));
        self.state.read().release(id, true).cloned()
    }

    async fn list_deleted(&self, ids: &[String]) -> Result<Vec<Release>, RepoError> {
        self.record(format!("releases.list_deleted({})", ids.join(",")));
        let state = self.state.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.releases.get(id).cloned())
            .collect())
    }

    async fn list(&self) -> Result<Vec<Release>, RepoError> {
        self.record("releases.list()".to_string());
        let state = self.state.read();
        Ok(state
            .releases
            .values()
            .filter(|release| !state.deleted_releases.contains(&release.id))
            .cloned()
            .collect())
    }

    async fn app_list(&self, app_id: &str) -> Result<Vec<Release>, RepoError> {
        self.record(format!("releases.app_list({app_id})"));
        let state = self.state.read();
        Ok(state
            .releases
            .values()
            .filter(|release| {
                release.app_id == app_id && !state.deleted_releases.contains(&release.id)
            })
            .cloned()
            .collect())
    }

    async fn add(&self, mut release: Release) -> Result<Release, RepoError> {
        self.record(format!("releases.add({})", release.id));
        let mut state = self.state.write();
        for id in &release.artifact_ids {
            state.artifact(id)?;
        }
        new_id(&mut release.id);
        release.created_at = release.created_at.or_else(|| Some(Utc::now()));
        state.append_event(EventType::Release, &release.id, &release.app_id, &release)?;
        state.releases.insert(release.id.clone(), release.clone());
        Ok(release)
    }
}

#[async_trait]
impl ArtifactRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<Artifact, RepoError> {
        self.record(format!("artifacts.get({id})"));
        self.state.read().artifact(id).cloned()
    }

    async fn list(&self) -> Result<Vec<Artifact>, RepoError> {
        self.record("artifacts.list()".to_string());
        Ok(self.state.read().artifacts.values().cloned().collect())
    }

    async fn list_ids(&self, ids: &[String]) -> Result<HashMap<String, Artifact>, RepoError> {
        self.record(format!("artifacts.list_ids({})", ids.join(",")));
        let state = self.state.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.artifacts.get(id))
            .map(|artifact| (artifact.id.clone(), artifact.clone()))
            .collect())
    }

    async fn add(&self, mut artifact: Artifact) -> Result<Artifact, RepoError> {
        self.record(format!("artifacts.add({})", artifact.id));
        let mut state = self.state.write();
        new_id(&mut artifact.id);
        artifact.created_at = artifact.created_at.or_else(|| Some(Utc::now()));
        state.append_event(EventType::Artifact, &artifact.id, "", &artifact)?;
        state.artifacts.insert(artifact.id.clone(), artifact.clone());
        Ok(artifact)
    }
}

#[async_trait]
impl FormationRepository for MemoryStore {
    async fn get(&self, app_id: &str, release_id: &str) -> Result<Formation, RepoError> {
        self.record(format!("formations.get({app_id},{release_id})"));
        self.state
            .read()
            .formations
            .get(&(app_id.to_string(), release_id.to_string()))
            .cloned()
            .ok_or_else(|| RepoError::not_found("formation", format!("{app_id}/{release_id}")))
    }

    async fn get_expanded(
        &self,
        app_id: &str,
        release_id: &str,
    ) -> Result<ExpandedFormation, RepoError> {
        self.record(format!("formations.get_expanded({app_id},{release_id})"));
        let state = self.state.read();
        let formation = state
            .formations
            .get(&(app_id.to_string(), release_id.to_string()))
            .ok_or_else(|| RepoError::not_found("formation", format!("{app_id}/{release_id}")))?;
        state.expand(formation)
    }

    async fn list(&self, app_id: &str) -> Result<Vec<Formation>, RepoError> {
        self.record(format!("formations.list({app_id})"));
        Ok(self
            .state
            .read()
            .formations
            .values()
            .filter(|formation| formation.app_id == app_id)
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<ExpandedFormation>, RepoError> {
        self.record("formations.list_active()".to_string());
        let state = self.state.read();
        state
            .formations
            .values()
            .filter(|formation| formation.is_active())
            .map(|formation| state.expand(formation))
            .collect()
    }

    async fn put(&self, mut formation: Formation) -> Result<Formation, RepoError> {
        self.record(format!(
            "formations.put({},{})",
            formation.app_id, formation.release_id
        ));
        let mut state = self.state.write();
        let app_id = state.app(&formation.app_id)?.id.clone();
        state.release(&formation.release_id, false)?;
        formation.app_id = app_id;

        let key = (formation.app_id.clone(), formation.release_id.clone());
        let now = Utc::now();
        let previous = state.formations.get(&key);
        formation.created_at = previous.and_then(|previous| previous.created_at).or(Some(now));
        formation.updated_at = Some(now);
        let scale = Scale {
            prev_processes: previous.map(|previous| previous.processes.clone()),
            processes: formation.processes.clone(),
            release_id: formation.release_id.clone(),
        };
        state.append_event(
            EventType::Scale,
            &formation.release_id,
            &formation.app_id,
            &scale,
        )?;
        state.formations.insert(key, formation.clone());
        Ok(formation)
    }
}

#[async_trait]
impl DeploymentRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<Deployment, RepoError> {
        self.record(format!("deployments.get({id})"));
        self.state
            .read()
            .deployments
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("deployment", id))
    }

    async fn list(&self, app_id: &str) -> Result<Vec<Deployment>, RepoError> {
        self.record(format!("deployments.list({app_id})"));
        Ok(self
            .state
            .read()
            .deployments
            .values()
            .filter(|deployment| deployment.app_id == app_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<Job, RepoError> {
        self.record(format!("jobs.get({id})"));
        let state = self.state.read();
        state
            .jobs
            .get(id)
            .or_else(|| state.jobs.values().find(|job| job.uuid == id))
            .cloned()
            .ok_or_else(|| RepoError::not_found("job", id))
    }

    async fn list(&self, app_id: &str) -> Result<Vec<Job>, RepoError> {
        self.record(format!("jobs.list({app_id})"));
        Ok(self
            .state
            .read()
            .jobs
            .values()
            .filter(|job| job.app_id == app_id)
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> Result<Vec<Job>, RepoError> {
        self.record("jobs.list_active()".to_string());
        Ok(self
            .state
            .read()
            .jobs
            .values()
            .filter(|job| job.state.is_active())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProviderRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<Provider, RepoError> {
        self.record(format!("providers.get({id})"));
        self.state.read().provider(id).cloned()
    }

    async fn list(&self) -> Result<Vec<Provider>, RepoError> {
        self.record("providers.list()".to_string());
        Ok(self.state.read().providers.values().cloned().collect())
    }
}

#[async_trait]
impl ResourceRepository for MemoryStore {
    async fn get(&self, id: &str) -> Result<Resource, RepoError> {
        self.record(format!("resources.get({id})"));
        self.state
            .read()
            .resources
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("resource", id))
    }

    async fn list(&self) -> Result<Vec<Resource>, RepoError> {
        self.record("resources.list()".to_string());
        Ok(self.state.read().resources.values().cloned().collect())
    }

    async fn app_list(&self, app_id: &str) -> Result<Vec<Resource>, RepoError> {
        self.record(format!("resources.app_list({app_id})"));
        Ok(self
            .state
            .read()
            .resources
            .values()
            .filter(|resource| resource.apps.iter().any(|id| id == app_id))
            .cloned()
            .collect())
    }

    async fn provider_list(&self, provider_id: &str) -> Result<Vec<Resource>, RepoError> {
        self.record(format!("resources.provider_list({provider_id})"));
        Ok(self
            .state
            .read()
            .resources
            .values()
            .filter(|resource| resource.provider_id == provider_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn get_event(&self, id: i64) -> Result<Event, RepoError> {
        self.record(format!("events.get_event({id})"));
        self.state
            .read()
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("event", id.to_string()))
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, RepoError> {
        self.record("events.list_events()".to_string());
        let state = self.state.read();
        let matching = state
            .events
            .values()
            .rev()
            .filter(|event| query.matches(event))
            .cloned();
        Ok(match query.count {
            Some(count) => matching.take(count).collect(),
            None => matching.collect(),
        })
    }
}

#[async_trait]
impl RouteRepository for MemoryStore {
    async fn list_routes(&self, parent_ref: &str) -> Result<Vec<Route>, RepoError> {
        self.record(format!("routes.list_routes({parent_ref})"));
        Ok(self
            .state
            .read()
            .routes
            .iter()
            .filter(|route| route.parent_ref == parent_ref)
            .cloned()
            .collect())
    }

    async fn list_cert_routes(&self, cert_id: &str) -> Result<Vec<Route>, RepoError> {
        self.record(format!("routes.list_cert_routes({cert_id})"));
        Ok(self
            .state
            .read()
            .routes
            .iter()
            .filter(|route| {
                route
                    .certificate
                    .as_ref()
                    .is_some_and(|cert| cert.id == cert_id)
            })
            .cloned()
            .collect())
    }

    async fn get_route(&self, parent_ref: &str, kind: &str, id: &str) -> Result<Route, RepoError> {
        self.record(format!("routes.get_route({parent_ref},{kind},{id})"));
        self.state
            .read()
            .routes
            .iter()
            .find(|route| route.parent_ref == parent_ref && route.kind == kind && route.id == id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("route", format!("{kind}/{id}")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::from_fixture(Fixture {
            apps: vec![App {
                id: "a1".into(),
                name: "web".into(),
                release_id: "r1".into(),
                ..Default::default()
            }],
            releases: vec![Release {
                id: "r1".into(),
                app_id: "a1".into(),
                ..Default::default()
            }],
            deleted_releases: vec![Release {
                id: "r0".into(),
                app_id: "a1".into(),
                ..Default::default()
            }],
            events: (1..=5)
                .map(|id| EventRecord {
                    id,
                    object_type: EventType::App,
                    object_id: "a1".into(),
                    app_id: "a1".into(),
                    created_at: None,
                    data: json!({"id": "a1"}),
                })
                .collect(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn apps_are_found_by_id_or_name() {
        let store = store();
        assert_eq!(AppRepository::get(&store, "web").await.unwrap().id, "a1");
        assert!(AppRepository::get(&store, "api")
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(store.call_count("apps.get"), 2);
    }

    #[tokio::test]
    async fn deleted_releases_are_only_found_on_request() {
        let store = store();
        assert!(ReleaseRepository::get(&store, "r0").await.is_err());
        assert_eq!(store.get_deleted("r0").await.unwrap().id, "r0");
        assert_eq!(ReleaseRepository::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn events_are_listed_newest_first() {
        let store = store();
        let query = EventQuery {
            count: Some(2),
            before_id: Some(5),
            ..Default::default()
        };
        let ids: Vec<i64> = store
            .list_events(&query)
            .await
            .unwrap()
            .iter()
            .map(|event| event.id)
            .collect();
        assert_eq!(ids, [4, 3]);
    }

    #[tokio::test]
    async fn writes_assign_ids_and_emit_events() {
        let store = store();
        let artifact = ArtifactRepository::add(
            &store,
            Artifact {
                uri: "https://example.com/image".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!artifact.id.is_empty());
        assert!(artifact.created_at.is_some());

        let event = store.get_event(6).await.unwrap();
        assert_eq!(event.object_type, EventType::Artifact);
        assert_eq!(event.object_id, artifact.id);
    }

    #[tokio::test]
    async fn formations_record_the_previous_scale() {
        let store = store();
        let formation = Formation {
            app_id: "web".into(),
            release_id: "r1".into(),
            processes: BTreeMap::from([("web".to_string(), 1)]),
            ..Default::default()
        };
        store.put(formation.clone()).await.unwrap();
        let mut scaled = formation;
        scaled.processes.insert("web".into(), 3);
        let stored = store.put(scaled).await.unwrap();
        assert_eq!(stored.app_id, "a1");

        let event = store.get_event(7).await.unwrap();
        let data: serde_json::Value = serde_json::from_slice(&event.data).unwrap();
        assert_eq!(data["prev_processes"], json!({"web": 1}));
        assert_eq!(data["processes"], json!({"web": 3}));
    }

    #[tokio::test]
    async fn releases_need_known_artifacts() {
        let store = store();
        let err = ReleaseRepository::add(
            &store,
            Release {
                artifact_ids: vec!["missing".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, RepoError::not_found("artifact", "missing"));
    }
}
