//! Record writer configuration

use serde::Deserialize;

/// Channel selection policy
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// One record per channel in turn (default)
    #[default]
    RoundRobin,
    /// Every record to every channel
    Broadcast,
    /// Hash of the record key modulo the channel count
    KeyPartitioned,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Broadcast => "broadcast",
            Self::KeyPartitioned => "key_partitioned",
        }
    }
}

/// Writer settings
///
/// # Example
///
/// ```toml
/// [writer]
/// channels = 8
/// selector = "key_partitioned"
/// local_channel = 3
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Number of output channels
    /// Default: 4
    pub channels: usize,

    /// Default: round_robin
    pub selector: SelectorKind,

    /// Channel consumed on the producer's own node
    /// Default: none
    pub local_channel: Option<u16>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channels: 4,
            selector: SelectorKind::RoundRobin,
            local_channel: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: WriterConfig = toml::from_str("").unwrap();
        assert_eq!(config.channels, 4);
        assert_eq!(config.selector, SelectorKind::RoundRobin);
        assert_eq!(config.local_channel, None);
    }

    #[test]
    fn test_selector_names() {
        for kind in [
            SelectorKind::RoundRobin,
            SelectorKind::Broadcast,
            SelectorKind::KeyPartitioned,
        ] {
            let config: WriterConfig =
                toml::from_str(&format!("selector = \"{}\"", kind.as_str())).unwrap();
            assert_eq!(config.selector, kind);
        }
    }
}
