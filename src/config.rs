use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::KdfParams;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatusConfig {
    pub node: NodeConfig,
    #[serde(default)]
    pub status: StatusServiceConfig,
    #[serde(default)]
    pub keystore: KdfParams,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeConfig {
    pub rpc_port: u16,
    pub log_level: String,
    #[serde(default = "default_keystore_dir")]
    pub keystore_dir: String,
}

fn default_keystore_dir() -> String {
    "./data/keystore".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatusServiceConfig {
    /// When false the `status` namespace is not exported
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds a sign request may wait before it is discarded
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Per-listener event queue depth
    #[serde(default = "default_listener_buffer")]
    pub listener_buffer: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_listener_buffer() -> usize {
    64
}

impl Default for StatusServiceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            request_timeout_secs: default_request_timeout_secs(),
            listener_buffer: default_listener_buffer(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                rpc_port: 9000,
                log_level: "info".to_string(),
                keystore_dir: default_keystore_dir(),
            },
            status: StatusServiceConfig::default(),
            keystore: KdfParams::default(),
        }
    }
}

impl StatusConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        warn!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            match toml::to_string_pretty(&config) {
                Ok(s) => {
                    if let Err(e) = std::fs::write(path, s) {
                        warn!("Could not write default config to {}: {}", path, e);
                    }
                }
                Err(e) => warn!("Could not serialize default config: {}", e),
            }
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statusd.toml");
        let path = path.to_str().unwrap();

        let config = StatusConfig::load_or_default(path);
        assert_eq!(config, StatusConfig::default());
        assert!(std::path::Path::new(path).exists());

        // The written file loads back to the same values
        assert_eq!(StatusConfig::load_or_default(path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statusd.toml");
        std::fs::write(
            &path,
            "[node]\nrpc_port = 9100\nlog_level = \"debug\"\n\n[status]\nenabled = false\n",
        )
        .unwrap();

        let config = StatusConfig::load_or_default(path.to_str().unwrap());
        assert_eq!(config.node.rpc_port, 9100);
        assert_eq!(config.node.keystore_dir, "./data/keystore");
        assert!(!config.status.enabled);
        assert_eq!(config.status.request_timeout_secs, 300);
        assert_eq!(config.keystore, KdfParams::default());
    }

    #[test]
    fn test_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statusd.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert_eq!(
            StatusConfig::load_or_default(path.to_str().unwrap()),
            StatusConfig::default()
        );
    }
}
