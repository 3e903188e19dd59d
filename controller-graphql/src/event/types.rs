use std::fmt;
use std::str::FromStr;

use async_graphql::dynamic::FieldValue;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::error::DecodeError;
use crate::model::*;
use crate::schema::Entity;

/// Generates the discriminator enum and the decoded payload sum type from one
/// table, so decoding and interface resolution always agree.
macro_rules! event_types {
    ($($variant:ident => $name:literal, $object:literal, $payload:ty;)*) => {
        /// Discriminator of an event, naming the shape of its payload.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum EventType {
            $($variant,)*
        }

        impl EventType {
            pub const ALL: &'static [EventType] = &[$(EventType::$variant,)*];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(EventType::$variant => $name,)*
                }
            }

            /// Concrete object type an event of this kind resolves to through
            /// the event interface.
            pub const fn object_type_name(self) -> &'static str {
                match self {
                    $(EventType::$variant => $object,)*
                }
            }

            /// Type of the decoded payload, as exposed on the `data` field.
            pub fn data_type_name(self) -> &'static str {
                match self {
                    $(EventType::$variant => <$payload as Entity>::TYPE_NAME,)*
                }
            }
        }

        /// A decoded event payload.
        #[derive(Clone, Debug, PartialEq)]
        pub enum EventData {
            $($variant($payload),)*
        }

        impl EventData {
            pub(crate) fn decode_as(
                event_type: EventType,
                raw: &[u8],
            ) -> Result<Self, serde_json::Error> {
                Ok(match event_type {
                    $(EventType::$variant => EventData::$variant(serde_json::from_slice(raw)?),)*
                })
            }

            pub fn event_type(&self) -> EventType {
                match self {
                    $(EventData::$variant(_) => EventType::$variant,)*
                }
            }

            pub(crate) fn into_field_value(self) -> FieldValue<'static> {
                match self {
                    $(EventData::$variant(data) => FieldValue::owned_any(data),)*
                }
            }
        }
    };
}

event_types! {
    App => "app", "EventApp", App;
    AppDeletion => "app_deletion", "EventAppDeletion", AppDeletionEvent;
    AppRelease => "app_release", "EventAppRelease", AppRelease;
    Deployment => "deployment", "EventDeployment", DeploymentEvent;
    Job => "job", "EventJob", Job;
    Scale => "scale", "EventScale", Scale;
    Release => "release", "EventRelease", Release;
    ReleaseDeletion => "release_deletion", "EventReleaseDeletion", ReleaseDeletionEvent;
    Artifact => "artifact", "EventArtifact", Artifact;
    Provider => "provider", "EventProvider", Provider;
    Resource => "resource", "EventResource", Resource;
    ResourceDeletion => "resource_deletion", "EventResource", Resource;
    ResourceAppDeletion => "resource_app_deletion", "EventResource", Resource;
    Route => "route", "EventRoute", Route;
    RouteDeletion => "route_deletion", "EventRoute", Route;
    DomainMigration => "domain_migration", "EventDomainMigration", DomainMigration;
    ClusterBackup => "cluster_backup", "EventClusterBackup", ClusterBackup;
    AppGarbageCollection => "app_garbage_collection", "EventAppGarbageCollection", AppGarbageCollectionEvent;
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownEventType(s.to_string()))
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
