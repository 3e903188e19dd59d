//! The append-only event log and the decoding of event payloads.

mod decode;
mod types;

use bytes::Bytes;
use chrono::DateTime;
use chrono::Utc;

pub use self::decode::decode;
pub use self::types::EventData;
pub use self::types::EventType;
use crate::error::DecodeError;

/// An entry of the event log.
///
/// `data` is kept raw; it is only decoded when a query selects it.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Strictly increasing, used as the pagination cursor.
    pub id: i64,
    pub object_type: EventType,
    /// May be empty, for example for cluster backups.
    pub object_id: String,
    /// Empty when the event is not scoped to an app.
    pub app_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub data: Bytes,
}

impl Event {
    pub fn decode_data(&self) -> Result<EventData, DecodeError> {
        decode::decode_typed(self.object_type, &self.app_id, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::AppDeletionEvent;

    #[test]
    fn decodes_with_the_event_discriminator() {
        let event = Event {
            id: 7,
            object_type: EventType::AppDeletion,
            object_id: "a1".into(),
            app_id: "a1".into(),
            created_at: None,
            data: serde_json::to_vec(&json!({"error": "app is still running"}))
                .unwrap()
                .into(),
        };
        assert_eq!(
            event.decode_data(),
            Ok(EventData::AppDeletion(AppDeletionEvent {
                app_deletion: None,
                error: "app is still running".into(),
            }))
        );
    }
}
