//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is outside what the writer can run with
    #[error("[{section}] has invalid {field}: {message}")]
    InvalidValue {
        /// Config section, e.g. "buffer"
        section: &'static str,
        /// Field name
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// A channel index does not exist in the configured partition
    #[error("[{section}] {field} = {channel} is out of range for {channels} channels")]
    ChannelOutOfRange {
        section: &'static str,
        field: &'static str,
        channel: u16,
        channels: usize,
    },
}

impl ConfigError {
    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }

    /// Create a ChannelOutOfRange error
    pub fn channel_out_of_range(
        section: &'static str,
        field: &'static str,
        channel: u16,
        channels: usize,
    ) -> Self {
        Self::ChannelOutOfRange {
            section,
            field,
            channel,
            channels,
        }
    }
}
