use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::Meta;
use super::ProcessCounts;
use super::ProcessTags;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct App {
    pub id: String,
    pub name: String,
    pub meta: Meta,
    pub strategy: String,
    /// Current release, empty until the first release is deployed.
    #[serde(rename = "release", skip_serializing_if = "String::is_empty")]
    pub release_id: String,
    pub deploy_timeout: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    /// Artifact ids; the first one is the image artifact, the others are files.
    #[serde(rename = "artifacts")]
    pub artifact_ids: Vec<String>,
    pub env: Meta,
    pub meta: Meta,
    pub processes: BTreeMap<String, ProcessType>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Release {
    pub fn image_artifact_id(&self) -> Option<&str> {
        self.artifact_ids.first().map(String::as_str)
    }

    pub fn file_artifact_ids(&self) -> &[String] {
        self.artifact_ids.get(1..).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessType {
    pub args: Vec<String>,
    pub env: Meta,
    pub ports: Vec<Port>,
    pub volumes: Vec<VolumeReq>,
    pub omni: bool,
    pub host_network: bool,
    pub service: String,
    pub resurrect: bool,
    pub data: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    pub port: i32,
    pub proto: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeReq {
    pub path: String,
    pub delete_on_stop: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// Docker image
    #[default]
    Docker,
    /// Generic file
    File,
}

impl ArtifactType {
    pub const ALL: &'static [ArtifactType] = &[ArtifactType::Docker, ArtifactType::File];

    pub const fn as_str(self) -> &'static str {
        match self {
            ArtifactType::Docker => "docker",
            ArtifactType::File => "file",
        }
    }
}

impl std::str::FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("unknown artifact type '{s}'"))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    pub uri: String,
    pub meta: Meta,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formation {
    pub app_id: String,
    pub release_id: String,
    pub processes: ProcessCounts,
    pub tags: ProcessTags,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Formation {
    pub fn is_active(&self) -> bool {
        self.processes.values().any(|count| *count > 0)
    }
}

/// A formation with its app, release and artifacts already joined by the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandedFormation {
    pub app: App,
    pub release: Release,
    pub image_artifact: Option<Artifact>,
    pub file_artifacts: Vec<Artifact>,
    pub processes: ProcessCounts,
    pub tags: ProcessTags,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub id: String,
    pub app_id: String,
    pub old_release_id: String,
    pub new_release_id: String,
    pub strategy: String,
    pub status: String,
    pub processes: ProcessCounts,
    pub deploy_timeout: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_splits_image_and_file_artifacts() {
        let release = Release {
            artifact_ids: vec!["image".into(), "file-1".into(), "file-2".into()],
            ..Default::default()
        };
        assert_eq!(release.image_artifact_id(), Some("image"));
        assert_eq!(release.file_artifact_ids(), ["file-1", "file-2"]);

        let empty = Release::default();
        assert_eq!(empty.image_artifact_id(), None);
        assert!(empty.file_artifact_ids().is_empty());
    }

    #[test]
    fn artifact_type_parses_known_names_only() {
        assert_eq!("file".parse::<ArtifactType>(), Ok(ArtifactType::File));
        assert!("tarball".parse::<ArtifactType>().is_err());
    }
}
