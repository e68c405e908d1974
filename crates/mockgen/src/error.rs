use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockgenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Detection error: {0}")]
    Detect(#[from] crate::detect::DetectError),

    #[error("Vendor error: {0}")]
    Vendor(#[from] crate::vendor::VendorError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Credentials not found: environment variable '{0}' is not set")]
    MissingApiKey(String),
}

pub type Result<T> = std::result::Result<T, MockgenError>;
