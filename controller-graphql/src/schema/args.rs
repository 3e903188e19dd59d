//! Typed access to field arguments.
//!
//! The engine has already checked arguments against their declared types, so
//! a mismatch here means the declaration and the resolver disagree. It is still
//! reported as an invalid argument rather than trusted.

use async_graphql::Value;
use serde::de::DeserializeOwned;

use super::Args;
use crate::error::ResolveError;

fn value<'a>(arguments: Args<'a>, name: &str) -> Option<&'a Value> {
    arguments
        .as_index_map()
        .get(name)
        .filter(|value| !matches!(value, Value::Null))
}

pub(crate) fn string(arguments: Args<'_>, name: &str) -> Result<Option<String>, ResolveError> {
    match value(arguments, name) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ResolveError::invalid_argument(name, "expected a string")),
    }
}

pub(crate) fn required_string(arguments: Args<'_>, name: &str) -> Result<String, ResolveError> {
    string(arguments, name)?.ok_or_else(|| ResolveError::invalid_argument(name, "is required"))
}

/// Enum arguments arrive as names; plain strings are accepted too.
pub(crate) fn enumerated(arguments: Args<'_>, name: &str) -> Result<Option<String>, ResolveError> {
    match value(arguments, name) {
        None => Ok(None),
        Some(Value::Enum(value)) => Ok(Some(value.to_string())),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ResolveError::invalid_argument(name, "expected an enum value")),
    }
}

pub(crate) fn int(arguments: Args<'_>, name: &str) -> Result<Option<i64>, ResolveError> {
    match value(arguments, name) {
        None => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| ResolveError::invalid_argument(name, "expected an integer")),
        Some(_) => Err(ResolveError::invalid_argument(name, "expected an integer")),
    }
}

pub(crate) fn strings(arguments: Args<'_>, name: &str) -> Result<Option<Vec<String>>, ResolveError> {
    match value(arguments, name) {
        None => Ok(None),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(item) => Ok(item.clone()),
                _ => Err(ResolveError::invalid_argument(name, "expected a list of strings")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ResolveError::invalid_argument(name, "expected a list of strings")),
    }
}

/// Decodes an object scalar argument into its map shape.
pub(crate) fn json<T: DeserializeOwned>(
    arguments: Args<'_>,
    name: &str,
) -> Result<Option<T>, ResolveError> {
    value(arguments, name)
        .map(|value| {
            let json = value
                .clone()
                .into_json()
                .map_err(|err| ResolveError::invalid_argument(name, err))?;
            serde_json::from_value(json).map_err(|err| ResolveError::invalid_argument(name, err))
        })
        .transpose()
}
