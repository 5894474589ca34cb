//! Recovery log and replay configuration

use std::path::PathBuf;

use serde::Deserialize;

/// Recovery settings
///
/// # Example
///
/// ```toml
/// [recovery]
/// enabled = true
/// path = "/var/lib/spindle/recovery"
/// dataset = "pagerank-ranks"
///
/// [recovery.replay]
/// lost_channel = 2
/// end_superstep = 14
/// original_parallelism = 8
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Mirror remote-channel records into segments
    /// Default: false
    pub enabled: bool,

    /// Segment directory
    /// Default: "recovery-logs"
    pub path: PathBuf,

    /// Dataset id used in segment names
    /// Default: "dataset-0"
    pub dataset: String,

    /// Replay only a lost node's traffic
    /// Default: none
    pub replay: Option<ReplayConfig>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("recovery-logs"),
            dataset: "dataset-0".into(),
            replay: None,
        }
    }
}

/// Selective replay after a node loss
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Channel the lost node consumed
    pub lost_channel: u16,

    /// Last superstep to replay
    pub end_superstep: u32,

    /// Channel count before the loss
    pub original_parallelism: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: RecoveryConfig = toml::from_str("").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.path, PathBuf::from("recovery-logs"));
        assert_eq!(config.dataset, "dataset-0");
        assert!(config.replay.is_none());
    }

    #[test]
    fn test_replay_requires_all_fields() {
        let toml = r#"
[replay]
lost_channel = 1
end_superstep = 5
"#;
        assert!(toml::from_str::<RecoveryConfig>(toml).is_err());
    }

    #[test]
    fn test_replay_table() {
        let toml = r#"
enabled = true
[replay]
lost_channel = 1
end_superstep = 5
original_parallelism = 3
"#;
        let config: RecoveryConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.replay,
            Some(ReplayConfig {
                lost_channel: 1,
                end_superstep: 5,
                original_parallelism: 3,
            })
        );
    }
}
