//! Downloading rendered template images.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::DetectError;

/// Source of rendered image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DetectError>;
}

/// Fetches images over HTTP.
pub struct HttpImageFetcher {
    client: Client,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

impl HttpImageFetcher {
    pub fn new() -> Result<Self, DetectError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DetectError::Fetch {
                url: String::new(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DetectError> {
        let fetch_err = |reason: String| DetectError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
