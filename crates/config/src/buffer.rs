//! Buffer pool configuration

use std::time::Duration;

use serde::Deserialize;

/// Buffer pool settings
///
/// # Example
///
/// ```toml
/// [buffer]
/// buffer_size = 65536
/// pool_size = 128
/// request_timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Capacity of each buffer in bytes
    /// Default: 32768 (32KB)
    pub buffer_size: usize,

    /// Number of buffers in the pool
    /// Default: 64
    pub pool_size: usize,

    /// Give up on an exhausted pool after this long
    /// Default: none (block until a buffer is recycled)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32 * 1024,
            pool_size: 64,
            request_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: BufferConfig = toml::from_str("").unwrap();
        assert_eq!(config.buffer_size, 32 * 1024);
        assert_eq!(config.pool_size, 64);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_request_timeout_humantime() {
        let config: BufferConfig = toml::from_str("request_timeout = \"1m 30s\"").unwrap();
        assert_eq!(config.request_timeout, Some(Duration::from_secs(90)));
    }
}
