//! Listing arguments for the event log.

use tracing::debug;

use crate::error::ResolveError;
use crate::event::Event;
use crate::event::EventType;
use crate::repository::Repositories;
use crate::schema::args;
use crate::schema::Args;

/// A bounded, filtered view of the event log, translated from query arguments.
///
/// Both cursors are exclusive. A `count` of zero is treated as no limit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub app_id: Option<String>,
    /// Empty means every type.
    pub object_types: Vec<EventType>,
    pub object_id: Option<String>,
    pub before_id: Option<i64>,
    pub since_id: Option<i64>,
    pub count: Option<usize>,
}

impl EventQuery {
    /// Validates the arguments of an `events` field.
    ///
    /// Nothing is fetched when this fails.
    pub fn from_arguments(arguments: Args<'_>) -> Result<Self, ResolveError> {
        let object_types = args::strings(arguments, "object_types")?
            .unwrap_or_default()
            .iter()
            .map(|name| {
                name.parse::<EventType>()
                    .map_err(|err| ResolveError::invalid_argument("object_types", err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EventQuery {
            app_id: args::string(arguments, "app_id")?.filter(|id| !id.is_empty()),
            object_types,
            object_id: args::string(arguments, "object_id")?.filter(|id| !id.is_empty()),
            before_id: cursor(arguments, "before_id")?,
            since_id: cursor(arguments, "since_id")?,
            count: args::int(arguments, "count")?
                .map(|count| {
                    usize::try_from(count)
                        .map_err(|_| ResolveError::invalid_argument("count", "must not be negative"))
                })
                .transpose()?
                .filter(|count| *count > 0),
        })
    }

    /// Scopes the query to one app, whatever the arguments said.
    pub fn for_app(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.app_id.as_ref().map_or(true, |id| *id == event.app_id)
            && (self.object_types.is_empty() || self.object_types.contains(&event.object_type))
            && self.object_id.as_ref().map_or(true, |id| *id == event.object_id)
            && self.before_id.map_or(true, |before| event.id < before)
            && self.since_id.map_or(true, |since| event.id > since)
    }

    /// Runs the query with a single collaborator call.
    pub(crate) async fn fetch(&self, repositories: &Repositories) -> Result<Vec<Event>, ResolveError> {
        debug!(query = ?self, "listing events");
        Ok(repositories.events.list_events(self).await?)
    }
}

fn cursor(arguments: Args<'_>, name: &str) -> Result<Option<i64>, ResolveError> {
    match args::int(arguments, name)? {
        Some(id) if id < 0 => Err(ResolveError::invalid_argument(name, "must not be negative")),
        id => Ok(id),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn event(id: i64, object_type: EventType, app_id: &str) -> Event {
        Event {
            id,
            object_type,
            object_id: format!("object-{id}"),
            app_id: app_id.to_string(),
            created_at: None,
            data: Bytes::from_static(b"{}"),
        }
    }

    #[test]
    fn cursors_are_exclusive() {
        let query = EventQuery {
            before_id: Some(5),
            since_id: Some(2),
            ..Default::default()
        };
        let ids: Vec<i64> = (0..8)
            .map(|id| event(id, EventType::App, "a1"))
            .filter(|event| query.matches(event))
            .map(|event| event.id)
            .collect();
        assert_eq!(ids, [3, 4]);
    }

    #[test]
    fn filters_combine() {
        let query = EventQuery {
            object_types: vec![EventType::Scale, EventType::Deployment],
            ..Default::default()
        }
        .for_app("a1");

        assert!(query.matches(&event(1, EventType::Scale, "a1")));
        assert!(!query.matches(&event(2, EventType::Scale, "a2")));
        assert!(!query.matches(&event(3, EventType::Job, "a1")));

        let by_object = EventQuery {
            object_id: Some("object-4".into()),
            ..Default::default()
        };
        assert!(by_object.matches(&event(4, EventType::Job, "")));
        assert!(!by_object.matches(&event(5, EventType::Job, "")));
    }
}
