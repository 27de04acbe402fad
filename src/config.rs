use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::gbfs::{DEFAULT_INFORMATION_URL, DEFAULT_STATUS_URL};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub feeds: FeedsConfig,
    pub contours: ContoursConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedsConfig {
    pub status_url: String,
    pub information_url: String,
    pub cache_ttl_secs: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            status_url: DEFAULT_STATUS_URL.to_string(),
            information_url: DEFAULT_INFORMATION_URL.to_string(),
            cache_ttl_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContoursConfig {
    pub path: PathBuf,
}

impl Default for ContoursConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("geo-limit/communes.json"),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:8080"

            [contours]
            path = "/data/communes.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.contours.path, PathBuf::from("/data/communes.json"));
        assert_eq!(config.feeds.status_url, DEFAULT_STATUS_URL);
        assert_eq!(config.feeds.cache_ttl_secs, 60);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:3000");
    }
}
