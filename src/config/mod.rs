use std::time::Duration;

use garde::Validate;
use serde::Deserialize;

use crate::services::progress::ProgressConfig;

/// Prefix of every environment variable read by [`AppConfig::from_env`].
pub const ENV_PREFIX: &str = "MEDISCAN_";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    /// Base URL of the verification service (e.g., "http://localhost:8000").
    #[serde(default = "default_api_base")]
    #[garde(custom(validate_api_base))]
    pub api_base: String,

    /// Whole-request timeout for a verification submission, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    #[garde(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,

    /// Interval between cosmetic progress increments, in milliseconds.
    #[serde(default = "default_progress_tick_ms")]
    #[garde(range(min = 1, max = 10_000))]
    pub progress_tick_ms: u64,

    /// Interval between cosmetic stage advances, in milliseconds.
    #[serde(default = "default_stage_advance_ms")]
    #[garde(range(min = 1, max = 60_000))]
    pub stage_advance_ms: u64,
}

fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_progress_tick_ms() -> u64 {
    150
}

fn default_stage_advance_ms() -> u64 {
    3000
}

fn validate_api_base(value: &String, _ctx: &()) -> garde::Result {
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"))
        .ok_or_else(|| garde::Error::new("must start with http:// or https://"))?;

    if rest.trim_end_matches('/').is_empty() {
        return Err(garde::Error::new("must include a host"));
    }
    if rest.chars().any(char::is_whitespace) {
        return Err(garde::Error::new("must not contain whitespace"));
    }
    Ok(())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            progress_tick_ms: default_progress_tick_ms(),
            stage_advance_ms: default_stage_advance_ms(),
        }
    }
}

impl AppConfig {
    /// Load from `MEDISCAN_*` environment variables (and `.env`), then validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn progress(&self) -> ProgressConfig {
        ProgressConfig {
            tick: Duration::from_millis(self.progress_tick_ms),
            stage_advance: Duration::from_millis(self.stage_advance_ms),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
