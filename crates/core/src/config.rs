use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// Directories where artifacts are materialized and keys are read from.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PathsConfig {
    /// Destination of scripts, datums and redeemers.
    pub script_dir: PathBuf,

    /// Directory scanned for `.skey` files.
    pub signing_key_dir: PathBuf,

    /// Destination of raw and signed transaction files.
    pub tx_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from("./scripts"),
            signing_key_dir: PathBuf::from("./signing-keys"),
            tx_dir: PathBuf::from("./txs"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NodeConfig {
    /// Path to the node-to-client unix socket.
    pub socket_path: PathBuf,

    pub network_magic: u64,

    /// Network id used in address headers (0 testnets, 1 mainnet).
    pub network_id: u8,

    /// Upper bound for a single query, in seconds.
    #[serde(default)]
    pub query_timeout: Option<u64>,
}

impl NodeConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout.map(Duration::from_secs)
    }
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug)]
pub struct LoggingConfig {
    #[serde_as(as = "DisplayFromStr")]
    pub max_level: tracing::Level,

    #[serde(default)]
    pub include_pallas: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_level: tracing::Level::INFO,
            include_pallas: Default::default(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    pub node: Option<NodeConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_level_from_string() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{ "max_level": "debug", "include_pallas": true }"#).unwrap();

        assert_eq!(config.max_level, tracing::Level::DEBUG);
        assert!(config.include_pallas);
    }

    #[test]
    fn root_config_defaults() {
        let config: RootConfig = serde_json::from_str("{}").unwrap();

        assert!(config.node.is_none());
        assert_eq!(config.paths.script_dir, PathBuf::from("./scripts"));
        assert_eq!(config.logging.max_level, tracing::Level::INFO);
    }

    #[test]
    fn node_timeout_is_optional() {
        let config: NodeConfig = serde_json::from_str(
            r#"{ "socket_path": "/tmp/node.socket", "network_magic": 2, "network_id": 0 }"#,
        )
        .unwrap();

        assert_eq!(config.query_timeout(), None);
    }
}
