use super::EventData;
use super::EventType;
use crate::error::DecodeError;
use crate::model::ReleaseDeletionEvent;

/// How much of a corrupt payload is quoted back in the error.
const SNIPPET_LEN: usize = 64;

/// Decodes a raw event payload according to its discriminator.
///
/// Pure: the only context used is the owning app id of the event, which older
/// release deletion payloads failed to record.
pub fn decode(object_type: &str, app_id: &str, raw: &[u8]) -> Result<EventData, DecodeError> {
    decode_typed(object_type.parse()?, app_id, raw)
}

pub(crate) fn decode_typed(
    event_type: EventType,
    app_id: &str,
    raw: &[u8],
) -> Result<EventData, DecodeError> {
    let mut data =
        EventData::decode_as(event_type, raw).map_err(|err| DecodeError::Payload {
            event_type: event_type.to_string(),
            size: raw.len(),
            snippet: snippet(raw),
            reason: err.to_string(),
        })?;
    backfill_release_deletion_app(&mut data, app_id);
    Ok(data)
}

fn backfill_release_deletion_app(data: &mut EventData, app_id: &str) {
    if let EventData::ReleaseDeletion(ReleaseDeletionEvent {
        release_deletion: Some(deletion),
        ..
    }) = data
    {
        if deletion.app_id.is_empty() && !app_id.is_empty() {
            deletion.app_id = app_id.to_string();
        }
    }
}

fn snippet(raw: &[u8]) -> String {
    let mut end = raw.len().min(SNIPPET_LEN);
    // Back off over continuation bytes so a multi-byte char is never split.
    while end > 0 && end < raw.len() && raw[end] & 0xC0 == 0x80 {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::ReleaseDeletion;

    fn release_deletion(data: serde_json::Value, app_id: &str) -> ReleaseDeletion {
        let raw = serde_json::to_vec(&data).unwrap();
        match decode("release_deletion", app_id, &raw).unwrap() {
            EventData::ReleaseDeletion(ReleaseDeletionEvent {
                release_deletion: Some(deletion),
                ..
            }) => deletion,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn backfills_an_empty_release_deletion_app() {
        let deletion = release_deletion(json!({"release_deletion": {"release": "r1"}}), "a1");
        assert_eq!(deletion.app_id, "a1");
        assert_eq!(deletion.release_id, "r1");
    }

    #[test]
    fn never_overwrites_a_populated_release_deletion_app() {
        let deletion = release_deletion(
            json!({"release_deletion": {"app": "a2", "release": "r1"}}),
            "a1",
        );
        assert_eq!(deletion.app_id, "a2");
    }

    #[test]
    fn leaves_unscoped_events_alone() {
        let deletion = release_deletion(json!({"release_deletion": {"release": "r1"}}), "");
        assert_eq!(deletion.app_id, "");

        let raw = serde_json::to_vec(&json!({"error": "boom"})).unwrap();
        let data = decode("release_deletion", "a1", &raw).unwrap();
        assert_eq!(
            data,
            EventData::ReleaseDeletion(ReleaseDeletionEvent {
                release_deletion: None,
                error: "boom".into(),
            })
        );
    }

    #[test]
    fn decodes_every_discriminator_into_its_own_shape() {
        for ty in EventType::ALL {
            let data = decode(ty.as_str(), "", b"{}").unwrap();
            assert_eq!(data.event_type(), *ty);
        }
    }

    #[test]
    fn unknown_discriminator_is_an_error() {
        assert_eq!(
            decode("app_update", "a1", b"{}"),
            Err(DecodeError::UnknownEventType("app_update".into()))
        );
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let raw = br#"{"id": 42, "name": ["not", "a", "string"]}"#;
        match decode("app", "", raw) {
            Err(DecodeError::Payload {
                event_type,
                size,
                snippet,
                reason,
            }) => {
                assert_eq!(event_type, "app");
                assert_eq!(size, raw.len());
                assert!(raw.starts_with(snippet.as_bytes()));
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn long_payloads_are_truncated_in_errors() {
        let raw = format!("[{}]", "1,".repeat(200));
        let Err(DecodeError::Payload { snippet, size, .. }) = decode("job", "", raw.as_bytes())
        else {
            panic!("expected a payload error");
        };
        assert_eq!(size, raw.len());
        assert_eq!(snippet.len(), SNIPPET_LEN);
    }

    #[test]
    fn truncation_keeps_multi_byte_chars_whole() {
        // 1 + 2 * 40 bytes: the cut at 64 falls inside an "é".
        let raw = format!("[{}", "é".repeat(40));
        let Err(DecodeError::Payload { snippet, .. }) = decode("job", "", raw.as_bytes()) else {
            panic!("expected a payload error");
        };
        assert!(!snippet.contains('\u{FFFD}'), "{snippet}");
        assert!(raw.starts_with(&snippet));
        assert_eq!(snippet.len(), SNIPPET_LEN - 1);
    }
}
