//! Scalars and enums shared by every type.

use async_graphql::dynamic::EnumItem;

use super::registry::Registry;
use crate::event::EventType;
use crate::model::ArtifactType;
use crate::model::JobState;

pub(crate) const TIME: &str = "Time";
pub(crate) const META: &str = "MetaObject";
pub(crate) const ENV: &str = "EnvObject";
pub(crate) const PROCESSES: &str = "ProcessesObject";
pub(crate) const TAGS: &str = "TagsObject";

pub(crate) const EVENT_TYPE: &str = "EventType";
pub(crate) const JOB_STATE: &str = "JobState";
pub(crate) const ARTIFACT_TYPE: &str = "ArtifactType";

pub(crate) fn register(registry: &mut Registry) {
    registry
        .scalar(TIME, "RFC 3339 timestamp")
        .scalar(META, "String to string map of metadata")
        .scalar(ENV, "String to string map of environment variables")
        .scalar(PROCESSES, "Process name to process definition or count")
        .scalar(TAGS, "Process name to a string to string map of tags")
        .enumeration(
            EVENT_TYPE,
            "Type of event",
            EventType::ALL.iter().map(|ty| EnumItem::new(ty.as_str())),
        )
        .enumeration(
            JOB_STATE,
            "State of job",
            JobState::ALL.iter().map(|state| EnumItem::new(state.as_str())),
        )
        .enumeration(
            ARTIFACT_TYPE,
            "Type of artifact",
            ArtifactType::ALL.iter().map(|ty| {
                let description = match ty {
                    ArtifactType::Docker => "Docker image",
                    ArtifactType::File => "Generic file",
                };
                EnumItem::new(ty.as_str()).description(description)
            }),
        );
}
