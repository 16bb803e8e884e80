//! Server configuration types

use crate::LogLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown log level: {0}")]
    InvalidLogLevel(String),
}

/// Dispatcher configuration
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Initial log level ("trace", "debug", "info", "warn", "error", "off")
    pub log_level: String,

    /// Reject anything but POST with `405 Method Not Allowed`
    pub require_post: bool,

    /// Use the only registered codec when a request has no `Content-Type`
    pub default_codec_for_missing_content_type: bool,

    /// Send `x-content-type-options: nosniff` with every RPC response
    pub nosniff: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            require_post: true,
            default_codec_for_missing_content_type: true,
            nosniff: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes; empty input yields the defaults
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Create configuration from a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;
