use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub vendor: VendorConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// SQLite database file. Defaults to `~/.mockgen/data/mockgen.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_error_log_capacity")]
    pub error_log_capacity: usize,
}

fn default_error_log_capacity() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Catalog-defined placement the marker artwork is printed on.
    #[serde(default = "default_placement")]
    pub placement: String,
    /// Publicly reachable URL of the solid magenta marker artwork.
    pub artwork_url: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_api_key_env() -> String {
    "MOCKGEN_VENDOR_API_KEY".to_string()
}

fn default_placement() -> String {
    "front".to_string()
}

fn default_format() -> String {
    "png".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl VendorConfig {
    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.api_key_env.clone()))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Timing of the vendor interaction. The defaults match the vendor's
/// rate limit and should only be lowered for tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_group_cooldown_ms")]
    pub group_cooldown_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_poll_attempts() -> u32 {
    30
}

fn default_group_cooldown_ms() -> u64 {
    60_000
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_attempts: default_poll_attempts(),
            group_cooldown_ms: default_group_cooldown_ms(),
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn group_cooldown(&self) -> Duration {
        Duration::from_millis(self.group_cooldown_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Substrings marking a stored template URL as a placeholder.
    #[serde(default = "default_invalid_url_patterns")]
    pub invalid_url_patterns: Vec<String>,
}

fn default_invalid_url_patterns() -> Vec<String> {
    vec!["placeholder".to_string(), "example.com".to_string()]
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            invalid_url_patterns: default_invalid_url_patterns(),
        }
    }
}

impl Config {
    /// Minimal configuration pointing at `base_url`, with default timings.
    pub fn new(base_url: &str, artwork_url: &str) -> Self {
        Self {
            version: "1.0".to_string(),
            vendor: VendorConfig {
                base_url: base_url.to_string(),
                api_key_env: default_api_key_env(),
                placement: default_placement(),
                artwork_url: artwork_url.to_string(),
                format: default_format(),
                connect_timeout_ms: default_connect_timeout_ms(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            schedule: ScheduleConfig::default(),
            discovery: DiscoveryConfig::default(),
            database_path: None,
            error_log_capacity: default_error_log_capacity(),
        }
    }
}
