//! Client configuration: TOML file, then environment overrides

use crate::error::ConfigError;
use pipelens_core::Granularity;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const API_URL_ENV: &str = "PIPELENS_API_URL";
pub const TIMEOUT_ENV: &str = "PIPELENS_TIMEOUT_SECONDS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    // backend proxy root, endpoints are appended to it
    pub base_url: String,

    // per-request timeout
    pub timeout_seconds: u64,

    // default bucket size for time series
    pub granularity: Granularity,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".to_string(),
            timeout_seconds: 30,
            granularity: Granularity::Hour,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Override fields from `PIPELENS_API_URL` / `PIPELENS_TIMEOUT_SECONDS`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse() {
                Ok(secs) => self.timeout_seconds = secs,
                Err(_) => warn!(value = %raw, "ignoring invalid {}", TIMEOUT_ENV),
            }
        }
    }
}

// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ClientConfig = toml::from_str(&content)?;
    Ok(config)
}
