//! Installs the global tracing subscriber.

use tracing_subscriber::EnvFilter;

use crate::configuration::ConfigurationError;
use crate::configuration::LogFormat;
use crate::configuration::Logging;

/// Resolves the filter: an explicit override wins, then `RUST_LOG`, then the
/// configured directives.
pub fn env_filter(logging: &Logging, explicit: Option<&str>) -> Result<EnvFilter, ConfigurationError> {
    let directives = match explicit {
        Some(directives) => directives.to_string(),
        None => std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| logging.filter.clone()),
    };
    EnvFilter::try_new(&directives).map_err(|err| ConfigurationError::InvalidConfiguration {
        message: "could not parse log configuration",
        error: err.to_string(),
    })
}

/// Sets the global subscriber in the configured format.
pub fn init(logging: &Logging, explicit: Option<&str>) -> Result<(), ConfigurationError> {
    let builder = tracing_subscriber::fmt::fmt().with_env_filter(env_filter(logging, explicit)?);
    let installed = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| ConfigurationError::InvalidConfiguration {
        message: "could not install the log subscriber",
        error: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directives_win() {
        let filter = env_filter(&Logging::default(), Some("controller_graphql=trace")).unwrap();
        assert_eq!(filter.to_string(), "controller_graphql=trace");
    }

    #[test]
    fn bad_directives_are_a_configuration_error() {
        let err = env_filter(&Logging::default(), Some("controller_graphql=loud")).unwrap_err();
        assert!(err.to_string().starts_with("could not parse log configuration"));
    }
}
