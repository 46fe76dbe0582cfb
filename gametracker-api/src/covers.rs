//! Cover-art lookup client
//!
//! Queries the RAWG games database for a title and extracts the first
//! result's image URL. Best-effort: any non-success response, empty result
//! set, or missing image field yields `Ok(None)`. The HTTP client is built
//! once at startup and shared across requests.

use gametracker_common::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// RAWG API base URL
const RAWG_API_URL: &str = "https://api.rawg.io/api";

/// Default timeout for cover lookups
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Long-lived RAWG search client
#[derive(Clone)]
pub struct CoverClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    background_image: Option<String>,
}

impl CoverClient {
    /// Create the client with the configured API key
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, RAWG_API_URL.to_string())
    }

    /// Create the client against a custom endpoint (used by tests)
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    /// Search for a title and return the first result's image URL
    ///
    /// Missing API key is a configuration error; every lookup miss is
    /// `Ok(None)`.
    pub async fn find_cover(&self, title: &str) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("RAWG API key is not configured".to_string()))?;

        let url = format!("{}/games", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("key", api_key), ("search", title), ("page_size", "1")])
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Cover lookup request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!(
                "Cover lookup for '{}' returned status {}",
                title,
                response.status()
            );
            return Ok(None);
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Cover lookup response invalid: {}", e)))?;

        let cover = body
            .results
            .into_iter()
            .next()
            .and_then(|r| r.background_image);

        debug!("Cover lookup for '{}': found={}", title, cover.is_some());
        Ok(cover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_is_a_config_error() {
        let client = CoverClient::new(None).unwrap();
        let err = client.find_cover("Hades").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn search_response_tolerates_missing_fields() {
        let body: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(body.results.is_empty());

        let body: SearchResponse =
            serde_json::from_str(r#"{"results": [{"name": "Hades"}]}"#).unwrap();
        assert_eq!(body.results.len(), 1);
        assert!(body.results[0].background_image.is_none());
    }
}
