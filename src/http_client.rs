//! HTTP access for schema and mapping-page fetches.
//!
//! One GET per resource, bounded by the configured timeout; a timeout is
//! indistinguishable from an unreachable host to callers, and nothing is
//! retried. The authoritative repository serves pages and legacy schema
//! artifacts in windows-1250, which are re-encoded to UTF-8 before use.

use std::time::Duration;

use reqwest::Client;

use crate::error::{Result, ValidateError};

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("validate-dasta/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Async HTTP client for downloading remote schemas and the mapping page.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .map_err(ValidateError::from)?;

        Ok(Self { client, config })
    }

    /// Single GET returning the raw body; any transport failure or
    /// non-success status is an error for the caller to absorb.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ValidateError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// GET a windows-1250 resource and re-encode it to UTF-8.
    pub async fn fetch_windows1250(&self, url: &str) -> Result<String> {
        let bytes = self.fetch(url).await?;
        let (text, _, _) = encoding_rs::WINDOWS_1250.decode(&bytes);
        Ok(text.into_owned())
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.user_agent.starts_with("validate-dasta/"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let client = HttpClient::new(HttpClientConfig {
            timeout_seconds: 1,
            ..HttpClientConfig::default()
        })
        .unwrap();

        let result = client.fetch("http://127.0.0.1:1/ds4.dtd").await;
        assert!(result.is_err());
    }
}
