//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. the level passed by the embedding application
//! 2. `BUILDGRAPH_LOG` environment variable, either a level name or
//!    `EnvFilter` directives (e.g. "warn,buildgraph::engine=debug")
//! 3. default to `info`

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV_VAR: &str = "BUILDGRAPH_LOG";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Another global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Installs the global fmt subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::Install`] when a global subscriber already exists.
pub fn init_logging(level: Option<Level>) -> Result<(), LoggingError> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    tracing_subscriber::registry()
        .with(log_filter(level, env_value.as_deref()))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))
}

/// Builds the filter from an explicit level or the `BUILDGRAPH_LOG` value.
///
/// A plain level name wins over directive parsing, since a bare word is a
/// valid target directive. Directives that do not parse fall back to `info`.
#[must_use]
pub fn log_filter(level: Option<Level>, env_value: Option<&str>) -> EnvFilter {
    let plain = level.or_else(|| env_value.and_then(parse_level_str));
    if let Some(resolved) = plain {
        return EnvFilter::new(resolved.as_str());
    }
    env_value
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(Level::INFO.as_str()))
}

/// Parses a level name, accepting `warning` for `warn`.
#[must_use]
pub fn parse_level_str(value: &str) -> Option<Level> {
    match value.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
