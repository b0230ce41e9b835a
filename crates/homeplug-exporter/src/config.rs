//! Configuration loading

use anyhow::Result;
use homeplug_core::MacAddress;
use homeplug_discovery::CollectorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub homeplug: HomeplugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address on which to expose metrics
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Path under which to expose metrics
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_path: default_metrics_path(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:9702".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeplugConfig {
    /// Interface to search for HomePlug devices on (first usable one if unset)
    #[serde(default)]
    pub interface: Option<String>,
    /// Destination address, or one of the aliases broadcast/all/local
    #[serde(default = "default_destination")]
    pub destination: MacAddress,
    /// Quiet period ending a discovery cycle
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for HomeplugConfig {
    fn default() -> Self {
        Self {
            interface: None,
            destination: default_destination(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

fn default_destination() -> MacAddress {
    MacAddress::HOMEPLUG_LOCAL
}

fn default_idle_timeout_ms() -> u64 {
    1000
}

impl Config {
    /// Convert to CollectorConfig
    pub fn to_collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            destination: self.homeplug.destination,
            idle_timeout_ms: self.homeplug.idle_timeout_ms,
        }
    }

    /// Metrics path with a leading slash
    pub fn metrics_path(&self) -> String {
        let path = self.daemon.metrics_path.trim();
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
