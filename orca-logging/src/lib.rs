use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{prelude::*, registry, EnvFilter};

/// Environment variable holding a full `tracing` filter directive.
/// When set it overrides both CLI flags and the persisted configuration.
pub const LOG_FILTER_ENV: &str = "ORCA_LOG";

/// Level value that disables log output entirely.
pub const LEVEL_NONE: &str = "none";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Unknown log format '{0}', expected 'text' or 'json'")]
    UnknownFormat(String),

    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: LEVEL_NONE.to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingOptions {
    /// Filter directive to install, or `None` when logging is switched off.
    pub fn filter_directive(&self) -> Option<String> {
        if let Ok(filter) = env::var(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                return Some(filter);
            }
        }

        let level = self.level.trim().to_ascii_lowercase();
        if level.is_empty() || level == LEVEL_NONE {
            None
        } else {
            Some(level)
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Output goes to stderr so command output on stdout stays machine readable.
/// Returns `Ok(false)` when logging is disabled and nothing was installed.
pub fn init_subscriber(options: &LoggingOptions) -> Result<bool, LoggingError> {
    let Some(directive) = options.filter_directive() else {
        return Ok(false);
    };

    let env_filter =
        EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
            filter: directive.clone(),
            message: e.to_string(),
        })?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let subscriber = registry().with(env_filter);
    let installed = match options.format {
        LogFormat::Json => subscriber.with(fmt_layer.json()).try_init(),
        LogFormat::Text => subscriber.with(fmt_layer).try_init(),
    };

    installed.map_err(|_| LoggingError::AlreadyInitialized)?;
    Ok(true)
}
