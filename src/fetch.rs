// 🌐 Transport - fetch(url) -> bytes or error
//
// The rest of the crate only sees the `Fetcher` trait, so tests (and offline
// mirrors) can swap the HTTP client out.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::LoadError;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a resource; any non-success status is `LoadError::Status`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// Fetch and decode a JSON document
pub async fn fetch_json<T>(fetcher: &dyn Fetcher, url: &str) -> Result<T, LoadError>
where
    T: DeserializeOwned,
{
    let body = fetcher.fetch(url).await?;
    serde_json::from_slice(&body).map_err(|e| LoadError::decode(url, e))
}

// ============================================================================
// HTTP FETCHER
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LoadError::transport(url, e))?;

        Ok(body.to_vec())
    }
}

// ============================================================================
// IN-MEMORY FETCHER (tests)
// ============================================================================


// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::testing::MemoryFetcher;
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        name: String,
    }

    #[tokio::test]
    async fn test_fetch_json_decodes() {
        let fetcher = MemoryFetcher::new();
        fetcher.serve("https://host/probe.json", r#"{"name":"Noggin"}"#);

        let probe: Probe = fetch_json(&fetcher, "https://host/probe.json").await.unwrap();
        assert_eq!(probe.name, "Noggin");
    }

    #[tokio::test]
    async fn test_fetch_json_decode_error() {
        let fetcher = MemoryFetcher::new();
        fetcher.serve("https://host/probe.json", "<html>rate limited</html>");

        let err = fetch_json::<Probe>(&fetcher, "https://host/probe.json")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let fetcher = MemoryFetcher::new();

        let err = fetcher.fetch("https://host/missing.json").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fetcher.hits("https://host/missing.json"), 1);
    }

    #[test]
    fn test_http_fetcher_builds_from_default_config() {
        assert!(HttpFetcher::new(&Config::default()).is_ok());
    }
}
