//! Logging configuration

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string for an `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Logging configuration
///
/// ```toml
/// [log]
/// level = "info"
/// filter = "info,spindle_recovery=debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Full `EnvFilter` directive; takes precedence over `level`
    pub filter: Option<String>,
}

impl LogConfig {
    /// Directive the subscriber is built from
    pub fn directive(&self) -> &str {
        match &self.filter {
            Some(filter) if !filter.trim().is_empty() => filter,
            _ => self.level.as_str(),
        }
    }
}
