//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development. There is no shared global
//! service handle anywhere: adapters receive this configuration at
//! construction, and the credential that changes at login lives in a
//! swappable slot on the persistence adapter.

use std::time::Duration;

use tracing::Level;

/// Default base URL of the content-generation proxy.
const DEFAULT_CONTENT_API_URL: &str = "https://ai-proxy.hdev.rw";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub content_api_url: String,
    pub content_api_key: Option<String>,
    pub backend_url: String,
    pub log_level: Level,
    pub poll_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure
    /// tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let content_api_url = std::env::var("CONTENT_API_URL")
            .unwrap_or_else(|_| DEFAULT_CONTENT_API_URL.to_string());
        let content_api_key = std::env::var("CONTENT_API_KEY").ok();

        let backend_url = std::env::var("BACKEND_URL")
            .map_err(|_| ConfigError::MissingVar("BACKEND_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let poll_interval_str =
            std::env::var("POLL_INTERVAL_SECS").unwrap_or_else(|_| "3".to_string());
        let poll_interval_secs = poll_interval_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "POLL_INTERVAL_SECS".to_string(),
                format!("'{}' is not a number of seconds", poll_interval_str),
            )
        })?;

        Ok(Self {
            content_api_url,
            content_api_key,
            backend_url,
            log_level,
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }
}
