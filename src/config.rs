// src/config.rs

//! Manages server configuration: loading from TOML and validation.

use crate::core::protocol::DEFAULT_MAX_FRAME_LENGTH;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

/// Configuration for the backing key-value store.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StoreConfig {
    /// Optional path to a JSON object of `key -> value` pairs loaded at startup.
    #[serde(default)]
    pub seed_file: Option<String>,
}

/// The resolved server configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Maximum number of simultaneously open client connections.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Incoming frames declaring a longer payload close the connection.
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            max_frame_length: default_max_frame_length(),
            store: StoreConfig::default(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7979
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}
fn default_max_frame_length() -> usize {
    DEFAULT_MAX_FRAME_LENGTH
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid configuration in '{path}'"))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// The `host:port` address the server listens on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        if self.max_frame_length == 0 {
            return Err(anyhow!("max_frame_length cannot be 0"));
        }
        if self.max_frame_length > u32::MAX as usize {
            return Err(anyhow!(
                "max_frame_length cannot exceed {} (the largest length prefix)",
                u32::MAX
            ));
        }
        if let Some(seed) = &self.store.seed_file
            && seed.trim().is_empty()
        {
            return Err(anyhow!("store.seed_file cannot be empty when set"));
        }
        if self.max_frame_length < 1024 {
            warn!(
                "low max_frame_length setting: {} bytes. Most requests will be rejected.",
                self.max_frame_length
            );
        }
        Ok(())
    }
}
