use std::time::Duration;

use crate::config::Config;

pub struct PipelineConfig {
    pub placement: String,
    pub artwork_url: String,
    pub group_cooldown: Duration,
    pub invalid_url_patterns: Vec<String>,
    pub error_log_capacity: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            placement: config.vendor.placement.clone(),
            artwork_url: config.vendor.artwork_url.clone(),
            group_cooldown: config.schedule.group_cooldown(),
            invalid_url_patterns: config.discovery.invalid_url_patterns.clone(),
            error_log_capacity: config.error_log_capacity,
        }
    }
}
