//! Root query and mutation fields.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;

use async_graphql::dynamic::FieldValue;
use futures::future::BoxFuture;
use futures::FutureExt;

use super::args;
use super::entities::event_arguments;
use super::events::event_list;
use super::events::event_node;
use super::field::fail;
use super::field::many;
use super::field::one;
use super::registry::Registry;
use super::scalars::ARTIFACT_TYPE;
use super::scalars::ENV;
use super::scalars::META;
use super::scalars::PROCESSES;
use super::scalars::TAGS;
use super::Args;
use super::Entity;
use super::FieldType;
use super::Fields;
use super::Node;
use crate::error::RepoError;
use crate::error::ResolveError;
use crate::event::Event;
use crate::model::*;
use crate::query::EventQuery;
use crate::repository::Repositories;

pub(crate) const QUERY: &str = "Query";
pub(crate) const MUTATION: &str = "Mutation";

/// Root of every query.
pub struct Query;

/// Root of every mutation.
pub struct Mutation;

/// Looks a record up by one required string argument.
fn by_id<'a, R, Fut>(
    arguments: Args<'a>,
    name: &str,
    fetch: impl FnOnce(String) -> Fut,
) -> BoxFuture<'a, Result<Option<Node>, ResolveError>>
where
    Fut: Future<Output = Result<R, RepoError>> + Send + 'a,
    R: Any + Send + Sync,
{
    match args::required_string(arguments, name) {
        Ok(id) => one(fetch(id)),
        Err(err) => fail(err),
    }
}

/// Looks a record up by an owner id and its own id.
fn by_ids<'a, R, Fut>(
    arguments: Args<'a>,
    owner: &str,
    name: &str,
    fetch: impl FnOnce(String, String) -> Fut,
) -> BoxFuture<'a, Result<Option<Node>, ResolveError>>
where
    Fut: Future<Output = Result<R, RepoError>> + Send + 'a,
    R: Any + Send + Sync,
{
    let ids = args::required_string(arguments, owner)
        .and_then(|owner| Ok((owner, args::required_string(arguments, name)?)));
    match ids {
        Ok((owner, id)) => one(fetch(owner, id)),
        Err(err) => fail(err),
    }
}

async fn app_formation(
    repositories: &Repositories,
    app: String,
    release: String,
) -> Result<Formation, RepoError> {
    let app = repositories.apps.get(&app).await?;
    repositories.formations.get(&app.id, &release).await
}

async fn app_expanded_formation(
    repositories: &Repositories,
    app: String,
    release: String,
) -> Result<ExpandedFormation, RepoError> {
    let app = repositories.apps.get(&app).await?;
    repositories.formations.get_expanded(&app.id, &release).await
}

async fn app_job(repositories: &Repositories, app: String, id: String) -> Result<Job, RepoError> {
    repositories.apps.get(&app).await?;
    repositories.jobs.get(&id).await
}

async fn provider_resource(
    repositories: &Repositories,
    provider: String,
    id: String,
) -> Result<Resource, RepoError> {
    repositories.providers.get(&provider).await?;
    repositories.resources.get(&id).await
}

/// Route ids are addressed as `<type>/<id>`.
fn split_route_id(id: &str) -> Result<(String, String), ResolveError> {
    id.split_once('/')
        .map(|(kind, id)| (kind.to_string(), id.to_string()))
        .ok_or_else(|| ResolveError::invalid_argument("id", "expected '<type>/<id>'"))
}

async fn app_route(
    repositories: &Repositories,
    app: String,
    kind: String,
    id: String,
) -> Result<Route, RepoError> {
    let app = repositories.apps.get(&app).await?;
    repositories
        .routes
        .get_route(&route_parent_ref(&app.id), &kind, &id)
        .await
}

async fn fetch_event(repositories: &Repositories, id: i64) -> Result<Option<Node>, ResolveError> {
    let event = repositories.events.get_event(id).await?;
    Ok(Some(event_node(event)))
}

impl Entity for Query {
    const TYPE_NAME: &'static str = QUERY;

    fn fields() -> Fields<Self> {
        let fields = Fields::<Self>::new()
            .required(
                "app",
                FieldType::of::<App>(),
                "Get app by ID or name",
                |repositories, _, arguments| {
                    by_id(arguments, "id", |id| async move { repositories.apps.get(&id).await })
                },
            )
            .argument("id", FieldType::String.non_null())
            .list(
                "apps",
                FieldType::of::<App>().list(),
                "List all apps",
                |repositories, _, _| many(repositories.apps.list()),
            )
            .required(
                "artifact",
                FieldType::of::<Artifact>(),
                "Get artifact by ID",
                |repositories, _, arguments| {
                    by_id(arguments, "id", |id| async move { repositories.artifacts.get(&id).await })
                },
            )
            .argument("id", FieldType::String.non_null())
            .list(
                "artifacts",
                FieldType::of::<Artifact>().list(),
                "List all artifacts",
                |repositories, _, _| many(repositories.artifacts.list()),
            )
            .required(
                "release",
                FieldType::of::<Release>(),
                "Get release by ID",
                |repositories, _, arguments| {
                    by_id(arguments, "id", |id| async move { repositories.releases.get(&id).await })
                },
            )
            .argument("id", FieldType::String.non_null())
            .list(
                "releases",
                FieldType::of::<Release>().list(),
                "List all releases",
                |repositories, _, _| many(repositories.releases.list()),
            )
            .required(
                "formation",
                FieldType::of::<Formation>(),
                "Get formation by app and release",
                |repositories, _, arguments| {
                    by_ids(arguments, "app", "release", |app, release| {
                        app_formation(repositories, app, release)
                    })
                },
            )
            .argument("app", FieldType::String.non_null())
            .argument("release", FieldType::String.non_null())
            .list(
                "active_formations",
                FieldType::of::<ExpandedFormation>().list(),
                "List active formations",
                |repositories, _, _| many(repositories.formations.list_active()),
            )
            .required(
                "expanded_formation",
                FieldType::of::<ExpandedFormation>(),
                "Get expanded formation by app and release",
                |repositories, _, arguments| {
                    by_ids(arguments, "app", "release", |app, release| {
                        app_expanded_formation(repositories, app, release)
                    })
                },
            )
            .argument("app", FieldType::String.non_null())
            .argument("release", FieldType::String.non_null())
            .required(
                "deployment",
                FieldType::of::<Deployment>(),
                "Get deployment by ID",
                |repositories, _, arguments| {
                    by_id(arguments, "id", |id| async move { repositories.deployments.get(&id).await })
                },
            )
            .argument("id", FieldType::String.non_null())
            .required(
                "job",
                FieldType::of::<Job>(),
                "Get job by app and ID",
                |repositories, _, arguments| {
                    by_ids(arguments, "app", "id", |app, id| app_job(repositories, app, id))
                },
            )
            .argument("app", FieldType::String.non_null())
            .argument("id", FieldType::String.non_null())
            .list(
                "active_jobs",
                FieldType::of::<Job>().list(),
                "List active jobs",
                |repositories, _, _| many(repositories.jobs.list_active()),
            )
            .required(
                "provider",
                FieldType::of::<Provider>(),
                "Get provider by ID or name",
                |repositories, _, arguments| {
                    by_id(arguments, "id", |id| async move { repositories.providers.get(&id).await })
                },
            )
            .argument("id", FieldType::String.non_null())
            .list(
                "providers",
                FieldType::of::<Provider>().list(),
                "List all providers",
                |repositories, _, _| many(repositories.providers.list()),
            )
            .required(
                "resource",
                FieldType::of::<Resource>(),
                "Get resource by provider and ID",
                |repositories, _, arguments| {
                    by_ids(arguments, "provider", "id", |provider, id| {
                        provider_resource(repositories, provider, id)
                    })
                },
            )
            .argument("provider", FieldType::String.non_null())
            .argument("id", FieldType::String.non_null())
            .list(
                "resources",
                FieldType::of::<Resource>().list(),
                "List all resources",
                |repositories, _, _| many(repositories.resources.list()),
            )
            .required(
                "route",
                FieldType::of::<Route>(),
                "Get route by app and ID",
                |repositories, _, arguments| {
                    let route = args::required_string(arguments, "app").and_then(|app| {
                        let (kind, id) = split_route_id(&args::required_string(arguments, "id")?)?;
                        Ok((app, kind, id))
                    });
                    match route {
                        Ok((app, kind, id)) => one(app_route(repositories, app, kind, id)),
                        Err(err) => fail(err),
                    }
                },
            )
            .argument("app", FieldType::String.non_null())
            .argument("id", FieldType::String.non_null())
            .required(
                "event",
                FieldType::of::<Event>(),
                "Get event by ID",
                |repositories, _, arguments| match args::int(arguments, "id") {
                    Ok(Some(id)) => fetch_event(repositories, id).boxed(),
                    Ok(None) => fail(ResolveError::invalid_argument("id", "is required")),
                    Err(err) => fail(err),
                },
            )
            .argument("id", FieldType::Int.non_null())
            .list(
                "events",
                FieldType::of::<Event>().list(),
                "List events",
                |repositories, _, arguments| match EventQuery::from_arguments(arguments) {
                    Ok(query) => event_list(repositories, query),
                    Err(err) => fail(err),
                },
            );
        event_arguments(fields)
    }

    fn parent<'a>(_: &'a FieldValue<'a>) -> Option<&'a Self> {
        Some(&Query)
    }
}

fn new_artifact(arguments: Args<'_>) -> Result<Artifact, ResolveError> {
    let kind = args::enumerated(arguments, "type")?
        .ok_or_else(|| ResolveError::invalid_argument("type", "is required"))?
        .parse::<ArtifactType>()
        .map_err(|err| ResolveError::invalid_argument("type", err))?;
    Ok(Artifact {
        id: args::string(arguments, "id")?.unwrap_or_default(),
        kind,
        uri: args::required_string(arguments, "uri")?,
        meta: args::json(arguments, "meta")?.unwrap_or_default(),
        ..Default::default()
    })
}

fn new_release(arguments: Args<'_>) -> Result<Release, ResolveError> {
    Ok(Release {
        id: args::string(arguments, "id")?.unwrap_or_default(),
        artifact_ids: args::strings(arguments, "artifacts")?.unwrap_or_default(),
        env: args::json(arguments, "env")?.unwrap_or_default(),
        meta: args::json(arguments, "meta")?.unwrap_or_default(),
        processes: args::json::<BTreeMap<String, ProcessType>>(arguments, "processes")?
            .unwrap_or_default(),
        ..Default::default()
    })
}

fn new_formation(arguments: Args<'_>) -> Result<Formation, ResolveError> {
    Ok(Formation {
        app_id: args::required_string(arguments, "app")?,
        release_id: args::required_string(arguments, "release")?,
        processes: args::json::<ProcessCounts>(arguments, "processes")?.unwrap_or_default(),
        tags: args::json::<ProcessTags>(arguments, "tags")?.unwrap_or_default(),
        ..Default::default()
    })
}

impl Entity for Mutation {
    const TYPE_NAME: &'static str = MUTATION;

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .required(
                "createArtifact",
                FieldType::of::<Artifact>(),
                "Create an artifact",
                |repositories, _, arguments| match new_artifact(arguments) {
                    Ok(artifact) => one(repositories.artifacts.add(artifact)),
                    Err(err) => fail(err),
                },
            )
            .argument("id", FieldType::String)
            .argument("type", FieldType::named(ARTIFACT_TYPE).non_null())
            .argument("uri", FieldType::String.non_null())
            .argument("meta", FieldType::named(META))
            .required(
                "createRelease",
                FieldType::of::<Release>(),
                "Create a release",
                |repositories, _, arguments| match new_release(arguments) {
                    Ok(release) => one(repositories.releases.add(release)),
                    Err(err) => fail(err),
                },
            )
            .argument("id", FieldType::String)
            .argument("artifacts", FieldType::String.list())
            .argument("env", FieldType::named(ENV))
            .argument("meta", FieldType::named(META))
            .argument("processes", FieldType::named(PROCESSES))
            .required(
                "putFormation",
                FieldType::of::<Formation>(),
                "Create or update a formation",
                |repositories, _, arguments| match new_formation(arguments) {
                    Ok(formation) => one(repositories.formations.put(formation)),
                    Err(err) => fail(err),
                },
            )
            .argument("app", FieldType::String.non_null())
            .argument("release", FieldType::String.non_null())
            .argument("processes", FieldType::named(PROCESSES))
            .argument("tags", FieldType::named(TAGS))
    }

    fn parent<'a>(_: &'a FieldValue<'a>) -> Option<&'a Self> {
        Some(&Mutation)
    }
}

pub(crate) fn register(registry: &mut Registry) {
    registry.entity::<Query>().entity::<Mutation>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_ids_carry_their_type() {
        assert_eq!(
            split_route_id("http/r1"),
            Ok(("http".to_string(), "r1".to_string()))
        );
        assert_eq!(
            split_route_id("r1").map_err(|err| err.extension_code()),
            Err("INVALID_ARGUMENT")
        );
    }
}
