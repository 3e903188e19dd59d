//! The event interface and one concrete object per event shape.
//!
//! An event resolves to its concrete object from the discriminator alone. The
//! payload is only decoded when `data` is selected, and a corrupt payload only
//! fails that one field.

use std::collections::HashSet;

use async_graphql::dynamic::FieldValue;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;

use super::field::none;
use super::field::one;
use super::registry::Registry;
use super::scalars::EVENT_TYPE;
use super::scalars::TIME;
use super::value::*;
use super::Entity;
use super::FieldType;
use super::Fields;
use super::Node;
use crate::error::ResolveError;
use crate::event::Event;
use crate::event::EventType;
use crate::model::App;
use crate::query::EventQuery;
use crate::repository::Repositories;

impl Entity for Event {
    const TYPE_NAME: &'static str = "EventInterface";

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .scalar("id", FieldType::Int.non_null(), "ID of event", |event| {
                int(event.id)
            })
            .scalar(
                "object_type",
                FieldType::named(EVENT_TYPE),
                "Type of event",
                |event| enumerated(event.object_type.as_str()),
            )
            .scalar("object_id", FieldType::String, "UUID of object", |event| {
                string(&event.object_id)
            })
            .scalar(
                "created_at",
                FieldType::named(TIME),
                "Time event was created",
                |event| time(&event.created_at),
            )
            .optional(
                "app",
                FieldType::of::<App>(),
                "App event belongs to",
                |repositories, event, _| {
                    if event.app_id.is_empty() {
                        return none();
                    }
                    one(repositories.apps.get(&event.app_id))
                },
            )
    }
}

fn decode_data(event: &Event) -> Result<Option<Node>, ResolveError> {
    match event.decode_data() {
        Ok(data) => Ok(Some(data.into_field_value())),
        Err(err) => {
            warn!(
                event_id = event.id,
                object_type = %event.object_type,
                %err,
                "event payload could not be decoded"
            );
            Err(err.into())
        }
    }
}

/// Tags an event with the object type its discriminator resolves to.
pub(crate) fn event_node(event: Event) -> Node {
    let object = event.object_type.object_type_name();
    FieldValue::owned_any(event).with_type(object)
}

pub(crate) fn event_list(
    repositories: &Repositories,
    query: EventQuery,
) -> BoxFuture<'_, Result<Vec<Node>, ResolveError>> {
    async move {
        let events = query.fetch(repositories).await?;
        Ok(events.into_iter().map(event_node).collect())
    }
    .boxed()
}

pub(crate) fn register(registry: &mut Registry) {
    registry.interface(Event::TYPE_NAME, &Event::fields());

    let mut registered = HashSet::new();
    for event_type in EventType::ALL {
        let object = event_type.object_type_name();
        let data_type = event_type.data_type_name();
        registry.map_event_object(object, data_type);
        if !registered.insert(object) {
            continue;
        }
        let fields = Event::fields().derived(
            "data",
            FieldType::named(data_type),
            format!("{data_type} associated with event"),
            decode_data,
        );
        registry.object(object, fields, &[Event::TYPE_NAME]);
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn event(object_type: EventType, data: &'static [u8]) -> Event {
        Event {
            id: 3,
            object_type,
            object_id: "r1".into(),
            app_id: "a1".into(),
            created_at: None,
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn data_is_decoded_with_the_discriminator() {
        let node = decode_data(&event(EventType::Release, br#"{"id": "r1"}"#))
            .unwrap()
            .unwrap();
        let release = node.downcast_ref::<crate::model::Release>().unwrap();
        assert_eq!(release.id, "r1");
    }

    #[test]
    fn corrupt_data_is_a_payload_error() {
        let err = decode_data(&event(EventType::Release, b"{\"id\": 4")).err();
        assert_eq!(
            err.map(|err| err.extension_code()),
            Some("PAYLOAD_DECODE_ERROR")
        );
    }
}
