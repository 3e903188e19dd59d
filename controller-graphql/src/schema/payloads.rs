//! Field tables of the records that only appear as event payloads.

use async_graphql::Value;

use super::field::borrowed;
use super::field::borrowed_list;
use super::field::many;
use super::field::one;
use super::registry::Registry;
use super::scalars::JOB_STATE;
use super::scalars::PROCESSES;
use super::scalars::TIME;
use super::value::*;
use super::Entity;
use super::FieldType;
use super::Fields;
use crate::model::*;

impl Entity for AppDeletionEvent {
    const TYPE_NAME: &'static str = "AppDeletionEvent";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .nested(
                "app_deletion",
                FieldType::of::<AppDeletion>(),
                "Details of the app deletion",
                |event| borrowed(&event.app_deletion),
            )
            .scalar("error", FieldType::String, "Error deleting the app", |event| {
                string(&event.error)
            })
    }
}

impl Entity for AppDeletion {
    const TYPE_NAME: &'static str = "AppDeletion";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .required(
                "app",
                FieldType::of::<App>(),
                "App that was deleted",
                |repositories, deletion, _| one(repositories.apps.get(&deletion.app_id)),
            )
            .nested(
                "routes",
                FieldType::of::<Route>().list(),
                "Routes deleted with the app",
                |deletion| borrowed_list(&deletion.deleted_routes),
            )
            .nested(
                "resources",
                FieldType::of::<Resource>().list(),
                "Resources deleted with the app",
                |deletion| borrowed_list(&deletion.deleted_resources),
            )
            .nested(
                "releases",
                FieldType::of::<Release>().list(),
                "Releases deleted with the app",
                |deletion| borrowed_list(&deletion.deleted_releases),
            )
    }
}

impl Entity for AppRelease {
    const TYPE_NAME: &'static str = "AppRelease";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .nested(
                "prev_release",
                FieldType::of::<Release>(),
                "Previous release",
                |event| borrowed(&event.prev_release),
            )
            .nested(
                "release",
                FieldType::of::<Release>(),
                "New release",
                |event| borrowed(&event.release),
            )
    }
}

impl Entity for DeploymentEvent {
    const TYPE_NAME: &'static str = "DeploymentEvent";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .required(
                "app",
                FieldType::of::<App>(),
                "App being deployed",
                |repositories, event, _| one(repositories.apps.get(&event.app_id)),
            )
            .required(
                "deployment",
                FieldType::of::<Deployment>(),
                "Deployment the event belongs to",
                |repositories, event, _| one(repositories.deployments.get(&event.deployment_id)),
            )
            .required(
                "release",
                FieldType::of::<Release>(),
                "Release being deployed",
                |repositories, event, _| one(repositories.releases.get(&event.release_id)),
            )
            .scalar("status", FieldType::String, "Status of the deployment", |event| {
                string(&event.status)
            })
            .scalar("job_type", FieldType::String, "Type of the job", |event| {
                string(&event.job_type)
            })
            .scalar(
                "job_state",
                FieldType::named(JOB_STATE),
                "State of the job",
                |event| enumerated(event.job_state.as_str()),
            )
            .scalar("error", FieldType::String, "Deployment error", |event| {
                string(&event.error)
            })
    }
}

impl Entity for Scale {
    const TYPE_NAME: &'static str = "Scale";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar(
                "prev_processes",
                FieldType::named(PROCESSES),
                "Process counts before scaling",
                |scale| scale.prev_processes.as_ref().map_or(Value::Null, json),
            )
            .scalar(
                "processes",
                FieldType::named(PROCESSES),
                "Process counts after scaling",
                |scale| json(&scale.processes),
            )
            .required(
                "release",
                FieldType::of::<Release>(),
                "Release that was scaled",
                |repositories, scale, _| one(repositories.releases.get(&scale.release_id)),
            )
    }
}

impl Entity for ReleaseDeletionEvent {
    const TYPE_NAME: &'static str = "ReleaseDeletionEvent";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .nested(
                "release_deletion",
                FieldType::of::<ReleaseDeletion>(),
                "Details of the release deletion",
                |event| borrowed(&event.release_deletion),
            )
            .scalar(
                "error",
                FieldType::String,
                "Error deleting the release",
                |event| string(&event.error),
            )
    }
}

impl Entity for ReleaseDeletion {
    const TYPE_NAME: &'static str = "ReleaseDeletion";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .required(
                "app",
                FieldType::of::<App>(),
                "App the release was deleted from",
                |repositories, deletion, _| one(repositories.apps.get(&deletion.app_id)),
            )
            .required(
                "release",
                FieldType::of::<Release>(),
                "Release that was deleted",
                |repositories, deletion, _| {
                    one(repositories.releases.get_deleted(&deletion.release_id))
                },
            )
            .list(
                "remaining_apps",
                FieldType::of::<App>().list(),
                "Apps still using the release",
                |repositories, deletion, _| many(repositories.apps.list_ids(&deletion.remaining_apps)),
            )
            .scalar(
                "deleted_files",
                FieldType::String.list(),
                "Files deleted with the release",
                |deletion| strings(&deletion.deleted_files),
            )
    }
}

impl Entity for TlsCert {
    const TYPE_NAME: &'static str = "TLSCert";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("ca_cert", FieldType::String.non_null(), "CA certificate", |tls| {
                string(&tls.ca_cert)
            })
            .scalar("cert", FieldType::String.non_null(), "Certificate", |tls| {
                string(&tls.cert)
            })
            .scalar("pin", FieldType::String, "Certificate pin", |tls| {
                string(&tls.pin)
            })
            .scalar("private_key", FieldType::String, "Private key", |tls| {
                string(&tls.private_key)
            })
    }
}

impl Entity for DomainMigration {
    const TYPE_NAME: &'static str = "DomainMigration";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar(
                "id",
                FieldType::String.non_null(),
                "UUID of the migration",
                |migration| string(&migration.id),
            )
            .nested(
                "old_tls_cert",
                FieldType::of::<TlsCert>(),
                "TLS certificate of the old domain",
                |migration| borrowed(&migration.old_tls_cert),
            )
            .nested(
                "tls_cert",
                FieldType::of::<TlsCert>(),
                "TLS certificate of the new domain",
                |migration| borrowed(&migration.tls_cert),
            )
            .scalar("old_domain", FieldType::String, "Old domain", |migration| {
                string(&migration.old_domain)
            })
            .scalar("domain", FieldType::String, "New domain", |migration| {
                string(&migration.domain)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time the migration was created",
                |migration| time(&migration.created_at),
            )
            .scalar(
                "finished_at",
                FieldType::named(TIME),
                "Time the migration finished",
                |migration| time(&migration.finished_at),
            )
    }
}

impl Entity for ClusterBackup {
    const TYPE_NAME: &'static str = "ClusterBackup";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::String, "UUID of the backup", |backup| {
                string(&backup.id)
            })
            .scalar("status", FieldType::String, "Status of the backup", |backup| {
                string(&backup.status)
            })
            .scalar("sha512", FieldType::String, "SHA-512 of the backup", |backup| {
                string(&backup.sha512)
            })
            .scalar("size", FieldType::Int, "Size of the backup in bytes", |backup| {
                int(backup.size)
            })
            .scalar("error", FieldType::String, "Backup error", |backup| {
                string(&backup.error)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time the backup was started",
                |backup| time(&backup.created_at),
            )
            .scalar(
                "updated_at",
                FieldType::named(TIME),
                "Time the backup was last updated",
                |backup| time(&backup.updated_at),
            )
            .scalar(
                "completed_at",
                FieldType::named(TIME),
                "Time the backup completed",
                |backup| time(&backup.completed_at),
            )
    }
}

impl Entity for AppGarbageCollectionEvent {
    const TYPE_NAME: &'static str = "AppGarbageCollectionEvent";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .nested(
                "app_garbage_collection",
                FieldType::of::<AppGarbageCollection>(),
                "Details of the garbage collection",
                |event| borrowed(&event.app_garbage_collection),
            )
            .scalar(
                "error",
                FieldType::String,
                "Garbage collection error",
                |event| string(&event.error),
            )
    }
}

impl Entity for AppGarbageCollection {
    const TYPE_NAME: &'static str = "AppGarbageCollection";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .required(
                "app",
                FieldType::of::<App>(),
                "App that was garbage collected",
                |repositories, collection, _| one(repositories.apps.get(&collection.app_id)),
            )
            .list(
                "deleted_releases",
                FieldType::of::<Release>().list(),
                "Releases that were deleted",
                |repositories, collection, _| {
                    many(repositories.releases.list_deleted(&collection.deleted_releases))
                },
            )
    }
}

pub(crate) fn register(registry: &mut Registry) {
    registry
        .entity::<AppDeletionEvent>()
        .entity::<AppDeletion>()
        .entity::<AppRelease>()
        .entity::<DeploymentEvent>()
        .entity::<Scale>()
        .entity::<ReleaseDeletionEvent>()
        .entity::<ReleaseDeletion>()
        .entity::<TlsCert>()
        .entity::<DomainMigration>()
        .entity::<ClusterBackup>()
        .entity::<AppGarbageCollectionEvent>()
        .entity::<AppGarbageCollection>();
}
