use async_graphql::ErrorExtensions;
use async_graphql::Value;
use displaydoc::Display;
use thiserror::Error;

/// Failures reported by a repository collaborator.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// {kind} '{id}' not found
    NotFound {
        /// The kind of record that was looked up.
        kind: &'static str,
        /// The id (or name) it was looked up by.
        id: String,
    },

    /// {0}
    Failure(String),
}

impl RepoError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound { .. })
    }
}

/// Failures while turning an event's raw payload into a typed value.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// unknown event type '{0}'
    UnknownEventType(String),

    /// could not decode {event_type} payload ({size} bytes, `{snippet}`): {reason}
    Payload {
        /// Discriminator the payload was decoded for.
        event_type: String,
        /// Size of the raw payload in bytes.
        size: usize,
        /// The start of the raw payload.
        snippet: String,
        /// The underlying parse failure.
        reason: String,
    },
}

/// Errors surfaced on a single field of a query response.
///
/// Every variant is reported with an `extensions.code` so clients can tell a
/// missing record apart from corrupt data or a failing backend.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// {kind} '{id}' not found
    NotFound { kind: &'static str, id: String },

    /// unknown event type '{0}'
    UnknownEventType(String),

    /// {0}
    PayloadDecode(String),

    /// invalid argument '{name}': {reason}
    InvalidArgument { name: String, reason: String },

    /// collaborator failure: {0}
    CollaboratorFailure(String),
}

impl ResolveError {
    pub fn invalid_argument(name: &str, reason: impl std::fmt::Display) -> Self {
        ResolveError::InvalidArgument {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn extension_code(&self) -> &'static str {
        match self {
            ResolveError::NotFound { .. } => "NOT_FOUND",
            ResolveError::UnknownEventType(_) => "UNKNOWN_EVENT_TYPE",
            ResolveError::PayloadDecode(_) => "PAYLOAD_DECODE_ERROR",
            ResolveError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            ResolveError::CollaboratorFailure(_) => "COLLABORATOR_FAILURE",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

impl ErrorExtensions for ResolveError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, extensions| {
            extensions.set("code", Value::String(self.extension_code().to_string()))
        })
    }
}

impl From<RepoError> for ResolveError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { kind, id } => ResolveError::NotFound { kind, id },
            RepoError::Failure(reason) => ResolveError::CollaboratorFailure(reason),
        }
    }
}

impl From<DecodeError> for ResolveError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownEventType(name) => ResolveError::UnknownEventType(name),
            err @ DecodeError::Payload { .. } => ResolveError::PayloadDecode(err.to_string()),
        }
    }
}

/// Problems found while assembling the schema at start-up.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// event type '{0}' has no registered event object
    MissingEventObject(String),

    /// event object '{object}' maps to both '{first}' and '{second}'
    ConflictingPayload {
        object: String,
        first: String,
        second: String,
    },

    /// type '{type_name}' referenced by '{referenced_by}' is not registered
    UnknownType {
        type_name: String,
        referenced_by: String,
    },

    /// schema could not be built: {0}
    Schema(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_keep_their_meaning() {
        let not_found: ResolveError = RepoError::not_found("app", "a1").into();
        assert_eq!(not_found.extension_code(), "NOT_FOUND");
        assert_eq!(not_found.to_string(), "app 'a1' not found");

        let failure: ResolveError = RepoError::Failure("connection reset".into()).into();
        assert_eq!(failure.extension_code(), "COLLABORATOR_FAILURE");
    }

    #[test]
    fn decode_errors_map_to_their_own_codes() {
        let unknown: ResolveError = DecodeError::UnknownEventType("bogus".into()).into();
        assert_eq!(unknown.extension_code(), "UNKNOWN_EVENT_TYPE");

        let payload: ResolveError = DecodeError::Payload {
            event_type: "app".into(),
            size: 3,
            snippet: "{{{".into(),
            reason: "key must be a string".into(),
        }
        .into();
        assert_eq!(payload.extension_code(), "PAYLOAD_DECODE_ERROR");
        assert!(payload.to_string().contains("app payload (3 bytes"));
    }

    #[test]
    fn extended_errors_carry_the_code() {
        let err = ResolveError::invalid_argument("count", "must not be negative").extend();
        assert_eq!(err.message, "invalid argument 'count': must not be negative");
        let code = err
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.get("code"))
            .cloned();
        assert_eq!(code, Some(Value::String("INVALID_ARGUMENT".into())));
    }
}
