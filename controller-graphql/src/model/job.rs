use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::Meta;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Pending,
    Starting,
    Up,
    Stopping,
    Down,
    // No longer emitted, but old schedulers still write them.
    Crashed,
    Failed,
}

impl JobState {
    pub const ALL: &'static [JobState] = &[
        JobState::Pending,
        JobState::Starting,
        JobState::Up,
        JobState::Stopping,
        JobState::Down,
        JobState::Crashed,
        JobState::Failed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Starting => "starting",
            JobState::Up => "up",
            JobState::Stopping => "stopping",
            JobState::Down => "down",
            JobState::Crashed => "crashed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, JobState::Pending | JobState::Starting | JobState::Up)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    /// Full cluster id, `<host>-<uuid>`.
    pub id: String,
    pub uuid: String,
    pub host_id: String,
    pub app_id: String,
    pub release_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: JobState,
    pub args: Vec<String>,
    pub meta: Meta,
    pub exit_status: Option<i32>,
    pub host_error: Option<String>,
    pub run_at: Option<DateTime<Utc>>,
    pub restarts: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_states_still_deserialize() {
        let job: Job = serde_json::from_str(r#"{"uuid": "u1", "state": "crashed"}"#).unwrap();
        assert_eq!(job.state, JobState::Crashed);
        assert!(!job.state.is_active());
    }
}
