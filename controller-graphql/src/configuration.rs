//! Logic for loading configuration in to an object model
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use displaydoc::Display;
use schemars::gen::SchemaSettings;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not read configuration file {path}: {error}
    CannotReadFile {
        path: String,
        error: std::io::Error,
    },
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4000))
}

fn default_path() -> String {
    "/graphql".to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_filter() -> String {
    "info".to_string()
}

/// The configuration of the query service.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Configuration options pertaining to the http server component.
    pub server: Server,

    /// Log output.
    pub logging: Logging,

    /// YAML or JSON file the in-memory store is seeded from.
    pub fixtures: Option<PathBuf>,
}

/// Configuration for the http server
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Server {
    /// The socket address and port to listen on.
    /// Defaults to 127.0.0.1:4000
    #[schemars(with = "String")]
    pub listen: SocketAddr,

    /// The HTTP path on which GraphQL requests will be served.
    /// Defaults to /graphql
    pub path: String,

    /// Time a single request may take in human-readable format; defaults to 30s
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub request_timeout: Duration,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Configuration for log output
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Logging {
    /// Output format, `text` or `json`.
    pub format: LogFormat,

    /// Log filter directives (off|error|warn|info|debug|trace, per target).
    /// `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
        }
    }
}

impl Configuration {
    /// Reads and validates a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let source =
            std::fs::read_to_string(path).map_err(|error| ConfigurationError::CannotReadFile {
                path: path.display().to_string(),
                error,
            })?;
        source.parse()
    }

    pub fn validate(self) -> Result<Self, ConfigurationError> {
        if !self.server.path.starts_with('/') {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid 'server.path' configuration",
                error: format!("'{}' must start with '/'", self.server.path),
            });
        }
        if self.server.request_timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid 'server.request_timeout' configuration",
                error: "must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // An empty file is the default configuration.
        if s.trim().is_empty() {
            return Ok(Configuration::default());
        }
        serde_yaml::from_str::<Configuration>(s)
            .map_err(ConfigurationError::DeserializeConfigError)?
            .validate()
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = false;
    });
    settings.into_generator().into_root_schema_for::<Configuration>()
}
