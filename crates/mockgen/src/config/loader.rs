use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(validation(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    let vendor = &config.vendor;
    if !vendor.base_url.starts_with("http://") && !vendor.base_url.starts_with("https://") {
        return Err(validation(format!(
            "vendor.base_url must be an http(s) URL: {}",
            vendor.base_url
        )));
    }
    if vendor.artwork_url.trim().is_empty() {
        return Err(validation("vendor.artwork_url must not be empty"));
    }
    if vendor.placement.trim().is_empty() {
        return Err(validation("vendor.placement must not be empty"));
    }
    if vendor.api_key_env.trim().is_empty() {
        return Err(validation("vendor.api_key_env must not be empty"));
    }

    if config.schedule.poll_attempts == 0 {
        return Err(validation("schedule.poll_attempts must be at least 1"));
    }

    if config.error_log_capacity == 0 {
        return Err(validation("error_log_capacity must be at least 1"));
    }

    if config
        .discovery
        .invalid_url_patterns
        .iter()
        .any(|p| p.trim().is_empty())
    {
        return Err(validation(
            "discovery.invalid_url_patterns must not contain empty patterns",
        ));
    }

    Ok(())
}
