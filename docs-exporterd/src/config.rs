use std::path::Path;
use serde::Deserialize;
use anyhow::{Context, Result};
use shared::types::Service;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Registered services the collector fetches documentation for
    #[serde(default)]
    pub services: Vec<ServiceTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// 0 runs a single collection pass at startup
    #[serde(default)]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// One registered service, as listed in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceTarget {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub base_url: String,
}

impl ServiceTarget {
    pub fn service(&self) -> Service {
        Service {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 0,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}
