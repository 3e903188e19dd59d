//! Projections of record fields into response values.

use async_graphql::Name;
use async_graphql::Value;
use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Serialize;
use tracing::error;

pub(crate) fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

pub(crate) fn int(value: impl Into<i64>) -> Value {
    let value: i64 = value.into();
    Value::Number(value.into())
}

pub(crate) fn optional_int(value: Option<i32>) -> Value {
    value.map_or(Value::Null, int)
}

pub(crate) fn boolean(value: bool) -> Value {
    Value::Boolean(value)
}

pub(crate) fn strings(values: &[String]) -> Value {
    Value::List(values.iter().map(|value| string(value)).collect())
}

/// RFC 3339, the way timestamps are written to the datastore.
pub(crate) fn time(value: &Option<DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |time| {
        Value::String(time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    })
}

pub(crate) fn enumerated(name: &str) -> Value {
    Value::Enum(Name::new(name))
}

/// Free-form maps exposed through the object scalars.
pub(crate) fn json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .and_then(Value::from_json)
        .unwrap_or_else(|err| {
            error!(%err, "could not project value to json");
            Value::Null
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn times_are_rfc3339() {
        let at = Utc.with_ymd_and_hms(2017, 3, 1, 12, 30, 0).single();
        assert_eq!(time(&at), Value::String("2017-03-01T12:30:00Z".into()));
        assert_eq!(time(&None), Value::Null);
    }

    #[test]
    fn maps_project_to_objects() {
        let meta = BTreeMap::from([("owner".to_string(), "ops".to_string())]);
        assert_eq!(
            json(&meta).into_json().unwrap(),
            serde_json::json!({"owner": "ops"})
        );
    }
}
