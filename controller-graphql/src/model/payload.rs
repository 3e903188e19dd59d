//! Payload records that only ever appear inside an event's `data`.

use serde::Deserialize;
use serde::Serialize;

use super::JobState;
use super::ProcessCounts;
use super::Release;
use super::Resource;
use super::Route;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppDeletionEvent {
    pub app_deletion: Option<AppDeletion>,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppDeletion {
    #[serde(rename = "app")]
    pub app_id: String,
    pub deleted_routes: Vec<Route>,
    pub deleted_resources: Vec<Resource>,
    pub deleted_releases: Vec<Release>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRelease {
    pub prev_release: Option<Release>,
    pub release: Option<Release>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentEvent {
    #[serde(rename = "app")]
    pub app_id: String,
    pub deployment_id: String,
    #[serde(rename = "release")]
    pub release_id: String,
    pub status: String,
    pub job_type: String,
    pub job_state: JobState,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scale {
    pub prev_processes: Option<ProcessCounts>,
    pub processes: ProcessCounts,
    #[serde(rename = "release")]
    pub release_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDeletionEvent {
    pub release_deletion: Option<ReleaseDeletion>,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDeletion {
    /// Older writers left this empty; it is filled from the event on decode.
    #[serde(rename = "app")]
    pub app_id: String,
    #[serde(rename = "release")]
    pub release_id: String,
    pub remaining_apps: Vec<String>,
    pub deleted_files: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppGarbageCollectionEvent {
    pub app_garbage_collection: Option<AppGarbageCollection>,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppGarbageCollection {
    #[serde(rename = "app")]
    pub app_id: String,
    pub deleted_releases: Vec<String>,
}
