//! Spindle Configuration
//!
//! TOML-based configuration with defaults for every field. An empty file is
//! a valid configuration.
//!
//! # Parsing
//!
//! ```
//! use spindle_config::{Config, SelectorKind};
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[writer]\nselector = \"broadcast\"").unwrap();
//! assert_eq!(config.writer.selector, SelectorKind::Broadcast);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [writer]
//! channels = 8
//! selector = "key_partitioned"
//! local_channel = 0
//!
//! [buffer]
//! buffer_size = 32768
//! pool_size = 64
//! request_timeout = "30s"
//!
//! [recovery]
//! enabled = true
//! path = "recovery-logs"
//! dataset = "ranks"
//!
//! [log]
//! level = "info"
//! ```

mod buffer;
mod error;
mod logging;
mod recovery;
mod validation;
mod writer;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use buffer::BufferConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogLevel};
pub use recovery::{RecoveryConfig, ReplayConfig};
pub use writer::{SelectorKind, WriterConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channels and selection policy
    pub writer: WriterConfig,

    /// Buffer pool sizing
    pub buffer: BufferConfig,

    /// Recovery log and replay
    pub recovery: RecoveryConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
