//! Configuration management for the vinyl entry backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with VINYL_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Inventory API configuration
    pub api: ApiConfig,

    /// Batch submission behaviour
    pub submission: SubmissionConfig,

    /// Row editing behaviour
    pub entry: EntryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the inventory API, e.g. http://localhost:8000/api
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubmissionConfig {
    /// How long success indicators stay visible before rows are cleared
    pub success_display_delay_ms: u64,

    /// Upper bound on rows submitted at the same time
    pub max_concurrent: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EntryConfig {
    /// Pause before a new blank row is appended after the last row completes
    pub append_debounce_ms: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("VINYL_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("api.base_url", "http://localhost:8000/api")?
            .set_default("api.request_timeout_secs", 10)?
            .set_default("submission.success_display_delay_ms", 1500)?
            .set_default("submission.max_concurrent", 4)?
            .set_default("entry.append_debounce_ms", 300)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (VINYL_ prefix)
            .add_source(
                Environment::with_prefix("VINYL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SubmissionConfig {
    pub fn success_display_delay(&self) -> Duration {
        Duration::from_millis(self.success_display_delay_ms)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            success_display_delay_ms: 1500,
            max_concurrent: 4,
        }
    }
}

impl EntryConfig {
    pub fn append_debounce(&self) -> Duration {
        Duration::from_millis(self.append_debounce_ms)
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            append_debounce_ms: 300,
        }
    }
}
