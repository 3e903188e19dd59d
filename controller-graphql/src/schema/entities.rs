//! Field tables of the domain records.

use std::collections::HashMap;

use async_graphql::dynamic::FieldValue;
use futures::future::BoxFuture;
use futures::FutureExt;

use super::events::event_list;
use super::field::borrowed;
use super::field::borrowed_list;
use super::field::fail;
use super::field::many;
use super::field::none;
use super::field::one;
use super::scalars::ARTIFACT_TYPE;
use super::scalars::ENV;
use super::scalars::JOB_STATE;
use super::scalars::META;
use super::scalars::PROCESSES;
use super::scalars::TAGS;
use super::scalars::TIME;
use super::value::*;
use super::Entity;
use super::FieldType;
use super::Fields;
use super::Node;
use crate::error::ResolveError;
use crate::model::*;
use crate::query::EventQuery;
use crate::repository::Repositories;

/// Arguments accepted by every event listing field.
pub(crate) fn event_arguments<T: Entity>(fields: Fields<T>) -> Fields<T> {
    fields
        .argument("object_types", FieldType::String.list())
        .argument("object_id", FieldType::String)
        .argument("app_id", FieldType::String)
        .argument("count", FieldType::Int)
        .argument("before_id", FieldType::Int)
        .argument("since_id", FieldType::Int)
}

/// Artifacts in the order of `ids`. Ids the store no longer knows are skipped.
fn ordered_artifacts<'a>(
    repositories: &'a Repositories,
    ids: &'a [String],
) -> BoxFuture<'a, Result<Vec<Node>, ResolveError>> {
    if ids.is_empty() {
        return futures::future::ready(Ok(Vec::new())).boxed();
    }
    async move {
        let artifacts: HashMap<String, Artifact> = repositories.artifacts.list_ids(ids).await?;
        Ok(ids
            .iter()
            .filter_map(|id| artifacts.get(id).cloned())
            .map(FieldValue::owned_any)
            .collect())
    }
    .boxed()
}

impl Entity for App {
    const TYPE_NAME: &'static str = "App";

    fn fields() -> Fields<Self> {
        let fields = Fields::<Self>::new()
            .scalar("id", FieldType::String.non_null(), "UUID of app", |app| {
                string(&app.id)
            })
            .scalar("name", FieldType::String.non_null(), "Name of app", |app| {
                string(&app.name)
            })
            .scalar("meta", FieldType::named(META), "Metadata for app", |app| {
                json(&app.meta)
            })
            .scalar(
                "strategy",
                FieldType::String.non_null(),
                "Deployment strategy for app",
                |app| string(&app.strategy),
            )
            .scalar(
                "deploy_timeout",
                FieldType::Int,
                "Deploy timeout in seconds",
                |app| int(app.deploy_timeout),
            )
            .scalar("created_at", FieldType::named(TIME), "Time app was created", |app| {
                time(&app.created_at)
            })
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time app was last updated",
                |app| time(&app.updated_at),
            )
            .optional(
                "current_release",
                FieldType::of::<Release>(),
                "Current release for app",
                |repositories, app, _| {
                    if app.release_id.is_empty() {
                        return none();
                    }
                    one(repositories.apps.current_release(&app.id))
                },
            )
            .list(
                "releases",
                FieldType::of::<Release>().list(),
                "Releases for app",
                |repositories, app, _| many(repositories.releases.app_list(&app.id)),
            )
            .list(
                "formations",
                FieldType::of::<Formation>().list(),
                "Formations for app",
                |repositories, app, _| many(repositories.formations.list(&app.id)),
            )
            .list(
                "resources",
                FieldType::of::<Resource>().list(),
                "Resources for app",
                |repositories, app, _| many(repositories.resources.app_list(&app.id)),
            )
            .list(
                "deployments",
                FieldType::of::<Deployment>().list(),
                "Deployments for app",
                |repositories, app, _| many(repositories.deployments.list(&app.id)),
            )
            .list(
                "jobs",
                FieldType::of::<Job>().list(),
                "Jobs for app",
                |repositories, app, _| many(repositories.jobs.list(&app.id)),
            )
            .list(
                "routes",
                FieldType::of::<Route>().list(),
                "Routes for app",
                |repositories, app, _| {
                    async move {
                        many(repositories.routes.list_routes(&route_parent_ref(&app.id))).await
                    }
                    .boxed()
                },
            )
            .list(
                "events",
                FieldType::named("EventInterface").list(),
                "Events for app",
                |repositories, app, arguments| match EventQuery::from_arguments(arguments) {
                    Ok(query) => event_list(repositories, query.for_app(&app.id)),
                    Err(err) => fail(err),
                },
            );
        event_arguments(fields)
    }
}

impl Entity for Release {
    const TYPE_NAME: &'static str = "Release";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::String.non_null(), "UUID of release", |release| {
                string(&release.id)
            })
            .list(
                "artifacts",
                FieldType::of::<Artifact>().list(),
                "Artifacts for release",
                |repositories, release, _| ordered_artifacts(repositories, &release.artifact_ids),
            )
            .required(
                "image_artifact",
                FieldType::of::<Artifact>(),
                "Image artifact for release",
                |repositories, release, _| match release.image_artifact_id() {
                    Some(id) => one(repositories.artifacts.get(id)),
                    None => none(),
                },
            )
            .list(
                "file_artifacts",
                FieldType::of::<Artifact>().list(),
                "File artifacts for release",
                |repositories, release, _| {
                    ordered_artifacts(repositories, release.file_artifact_ids())
                },
            )
            .scalar("env", FieldType::named(ENV), "Env for release", |release| {
                json(&release.env)
            })
            .scalar(
                "processes",
                FieldType::named(PROCESSES),
                "Process types of release",
                |release| json(&release.processes),
            )
            .scalar("meta", FieldType::named(META), "Metadata for release", |release| {
                json(&release.meta)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time release was created",
                |release| time(&release.created_at),
            )
    }
}

impl Entity for Artifact {
    const TYPE_NAME: &'static str = "Artifact";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::String, "UUID of artifact", |artifact| {
                string(&artifact.id)
            })
            .scalar(
                "type",
                FieldType::named(ARTIFACT_TYPE),
                "Type of artifact",
                |artifact| enumerated(artifact.kind.as_str()),
            )
            .scalar("uri", FieldType::String, "URI of artifact", |artifact| {
                string(&artifact.uri)
            })
            .scalar("meta", FieldType::named(META), "Meta for artifact", |artifact| {
                json(&artifact.meta)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time artifact was created",
                |artifact| time(&artifact.created_at),
            )
    }
}

impl Entity for Formation {
    const TYPE_NAME: &'static str = "Formation";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .required(
                "app",
                FieldType::of::<App>(),
                "App formation belongs to",
                |repositories, formation, _| one(repositories.apps.get(&formation.app_id)),
            )
            .required(
                "release",
                FieldType::of::<Release>(),
                "Release formation belongs to",
                |repositories, formation, _| {
                    one(repositories.releases.get(&formation.release_id))
                },
            )
            .scalar(
                "processes",
                FieldType::named(PROCESSES),
                "Processes",
                |formation| json(&formation.processes),
            )
            .scalar("tags", FieldType::named(TAGS), "Tags", |formation| {
                json(&formation.tags)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time formation was created",
                |formation| time(&formation.created_at),
            )
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time formation was last updated",
                |formation| time(&formation.updated_at),
            )
    }
}

impl Entity for ExpandedFormation {
    const TYPE_NAME: &'static str = "ExpandedFormation";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .required(
                "app",
                FieldType::of::<App>(),
                "App formation belongs to",
                |repositories, formation, _| one(repositories.apps.get(&formation.app.id)),
            )
            .required(
                "release",
                FieldType::of::<Release>(),
                "Release formation belongs to",
                |repositories, formation, _| {
                    one(repositories.releases.get(&formation.release.id))
                },
            )
            .nested(
                "image_artifact",
                FieldType::of::<Artifact>(),
                "Image artifact",
                |formation| borrowed(&formation.image_artifact),
            )
            .nested(
                "file_artifacts",
                FieldType::of::<Artifact>().list(),
                "File artifacts",
                |formation| borrowed_list(&formation.file_artifacts),
            )
            .scalar(
                "processes",
                FieldType::named(PROCESSES),
                "Processes",
                |formation| json(&formation.processes),
            )
            .scalar("tags", FieldType::named(TAGS), "Tags", |formation| {
                json(&formation.tags)
            })
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time formation was last updated",
                |formation| time(&formation.updated_at),
            )
    }
}

impl Entity for Deployment {
    const TYPE_NAME: &'static str = "Deployment";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar(
                "id",
                FieldType::String.non_null(),
                "UUID of deployment",
                |deployment| string(&deployment.id),
            )
            .optional(
                "app",
                FieldType::of::<App>(),
                "App deployment belongs to",
                |repositories, deployment, _| {
                    if deployment.app_id.is_empty() {
                        return none();
                    }
                    one(repositories.apps.get(&deployment.app_id))
                },
            )
            .optional(
                "old_release",
                FieldType::of::<Release>(),
                "Old release",
                |repositories, deployment, _| {
                    if deployment.old_release_id.is_empty() {
                        return none();
                    }
                    one(repositories.releases.get(&deployment.old_release_id))
                },
            )
            .optional(
                "new_release",
                FieldType::of::<Release>(),
                "New release",
                |repositories, deployment, _| {
                    if deployment.new_release_id.is_empty() {
                        return none();
                    }
                    one(repositories.releases.get(&deployment.new_release_id))
                },
            )
            .scalar(
                "strategy",
                FieldType::String,
                "Deployment strategy",
                |deployment| string(&deployment.strategy),
            )
            .scalar(
                "status",
                FieldType::String,
                "Status of deployment",
                |deployment| string(&deployment.status),
            )
            .scalar(
                "deploy_timeout",
                FieldType::Int,
                "Time in seconds before the deployment times out",
                |deployment| int(deployment.deploy_timeout),
            )
            .scalar(
                "processes",
                FieldType::named(PROCESSES),
                "Processes included in deployment",
                |deployment| json(&deployment.processes),
            )
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time deployment was created",
                |deployment| time(&deployment.created_at),
            )
            .scalar(
                "finished_at",
                FieldType::named(TIME),
                "Time deployment finished",
                |deployment| time(&deployment.finished_at),
            )
    }
}

impl Entity for Job {
    const TYPE_NAME: &'static str = "Job";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::String, "Full cluster ID of job", |job| {
                string(&job.id)
            })
            .scalar("uuid", FieldType::String.non_null(), "UUID of job", |job| {
                string(&job.uuid)
            })
            .scalar("host_id", FieldType::String, "Host ID of job", |job| {
                string(&job.host_id)
            })
            .required(
                "app",
                FieldType::of::<App>(),
                "App job belongs to",
                |repositories, job, _| one(repositories.apps.get(&job.app_id)),
            )
            .optional(
                "release",
                FieldType::of::<Release>(),
                "Release job belongs to",
                |repositories, job, _| {
                    if job.release_id.is_empty() {
                        return none();
                    }
                    one(repositories.releases.get(&job.release_id))
                },
            )
            .scalar("type", FieldType::String, "Type of job", |job| {
                string(&job.kind)
            })
            .scalar("state", FieldType::named(JOB_STATE), "State of job", |job| {
                enumerated(job.state.as_str())
            })
            .scalar("args", FieldType::String.list(), "Args of job", |job| {
                strings(&job.args)
            })
            .scalar("meta", FieldType::named(META), "Metadata of job", |job| {
                json(&job.meta)
            })
            .scalar("exit_status", FieldType::Int, "Exit status of job", |job| {
                optional_int(job.exit_status)
            })
            .scalar("host_error", FieldType::String, "Host error", |job| {
                job.host_error.as_deref().map_or(async_graphql::Value::Null, string)
            })
            .scalar("run_at", FieldType::named(TIME), "Time job should run at", |job| {
                time(&job.run_at)
            })
            .scalar(
                "restarts",
                FieldType::Int,
                "Number of times job has restarted",
                |job| optional_int(job.restarts),
            )
            .scalar("created_at", FieldType::named(TIME), "Time job was created", |job| {
                time(&job.created_at)
            })
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time job was last updated",
                |job| time(&job.updated_at),
            )
    }
}

impl Entity for Provider {
    const TYPE_NAME: &'static str = "Provider";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::String.non_null(), "UUID of provider", |provider| {
                string(&provider.id)
            })
            .scalar("url", FieldType::String.non_null(), "URL of provider", |provider| {
                string(&provider.url)
            })
            .scalar("name", FieldType::String.non_null(), "Name of provider", |provider| {
                string(&provider.name)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time provider was created",
                |provider| time(&provider.created_at),
            )
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time provider was last updated",
                |provider| time(&provider.updated_at),
            )
            .list(
                "resources",
                FieldType::of::<Resource>().list(),
                "Resources for provider",
                |repositories, provider, _| {
                    many(repositories.resources.provider_list(&provider.id))
                },
            )
    }
}

impl Entity for Resource {
    const TYPE_NAME: &'static str = "Resource";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::String.non_null(), "UUID of resource", |resource| {
                string(&resource.id)
            })
            .required(
                "provider",
                FieldType::of::<Provider>(),
                "Provider of resource",
                |repositories, resource, _| one(repositories.providers.get(&resource.provider_id)),
            )
            .scalar(
                "external_id",
                FieldType::String,
                "External ID of resource",
                |resource| string(&resource.external_id),
            )
            .scalar("env", FieldType::named(ENV), "Env of resource", |resource| {
                json(&resource.env)
            })
            .list(
                "apps",
                FieldType::of::<App>().list(),
                "Apps associated with resource",
                |repositories, resource, _| many(repositories.apps.list_ids(&resource.apps)),
            )
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time resource was created",
                |resource| time(&resource.created_at),
            )
    }
}

impl Entity for Certificate {
    const TYPE_NAME: &'static str = "RouteCertificate";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::String.non_null(), "UUID of certificate", |cert| {
                string(&cert.id)
            })
            .scalar("cert", FieldType::String.non_null(), "TLS certificate", |cert| {
                string(&cert.cert)
            })
            .scalar("key", FieldType::String.non_null(), "TLS private key", |cert| {
                string(&cert.key)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time certificate was created",
                |cert| time(&cert.created_at),
            )
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time certificate was last updated",
                |cert| time(&cert.updated_at),
            )
            .list(
                "routes",
                FieldType::of::<Route>().list(),
                "Routes using certificate",
                |repositories, cert, _| many(repositories.routes.list_cert_routes(&cert.id)),
            )
    }
}

impl Entity for Route {
    const TYPE_NAME: &'static str = "Route";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("type", FieldType::String.non_null(), "Type of route", |route| {
                string(&route.kind)
            })
            .scalar("id", FieldType::String.non_null(), "UUID of route", |route| {
                string(&route.id)
            })
            .scalar("parent_ref", FieldType::String, "External opaque ID", |route| {
                string(&route.parent_ref)
            })
            .scalar("service", FieldType::String, "ID of the service", |route| {
                string(&route.service)
            })
            .scalar(
                "leader",
                FieldType::Boolean,
                "Route traffic only to the leader when true",
                |route| boolean(route.leader),
            )
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time route was created",
                |route| time(&route.created_at),
            )
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time route was last updated",
                |route| time(&route.updated_at),
            )
            .scalar(
                "domain",
                FieldType::String,
                "Domain name of route (HTTP routes only)",
                |route| string(&route.domain),
            )
            .scalar(
                "sticky",
                FieldType::Boolean,
                "Use sticky sessions for route when true (HTTP routes only)",
                |route| boolean(route.sticky),
            )
            .scalar(
                "path",
                FieldType::String,
                "Prefix to route to this service",
                |route| string(&route.path),
            )
            .scalar(
                "port",
                FieldType::Int,
                "TCP port to listen on (TCP routes only)",
                |route| int(route.port),
            )
            .nested(
                "certificate",
                FieldType::of::<Certificate>(),
                "TLS certificate for route",
                |route| borrowed(&route.certificate),
            )
            .required(
                "app",
                FieldType::of::<App>(),
                "App route belongs to",
                |repositories, route, _| match route.app_id() {
                    Some(app_id) => one(repositories.apps.get(app_id)),
                    None => none(),
                },
            )
    }
}

pub(crate) fn register(registry: &mut super::registry::Registry) {
    registry
        .entity::<App>()
        .entity::<Release>()
        .entity::<Artifact>()
        .entity::<Formation>()
        .entity::<ExpandedFormation>()
        .entity::<Deployment>()
        .entity::<Job>()
        .entity::<Provider>()
        .entity::<Resource>()
        .entity::<Certificate>()
        .entity::<Route>();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names<T: Entity>() -> Vec<&'static str> {
        T::fields().specs().iter().map(|spec| spec.name).collect()
    }

    #[test]
    fn app_exposes_every_relationship() {
        assert_eq!(
            field_names::<App>()[7..],
            [
                "current_release",
                "releases",
                "formations",
                "resources",
                "deployments",
                "jobs",
                "routes",
                "events"
            ]
        );
    }

    #[test]
    fn app_events_take_listing_arguments() {
        let fields = App::fields();
        let events = fields
            .specs()
            .iter()
            .find(|spec| spec.name == "events")
            .unwrap();
        let arguments: Vec<_> = events.arguments.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            arguments,
            ["object_types", "object_id", "app_id", "count", "before_id", "since_id"]
        );
    }
}
