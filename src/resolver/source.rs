//! Remote asset source
//!
//! This module handles all HTTP requests made by the resolver:
//! - Building the HTTP client with the configured user agent
//! - HEAD requests to establish that an asset exists
//! - GET requests to retrieve asset bytes
//! - Error classification

use crate::config::RemoteConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Why a fetch did not produce bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection refused")]
    Connect,

    #[error("Empty response body")]
    EmptyBody,

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Remote store of assets addressed by URL
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Returns true if an asset exists at `url`
    ///
    /// Any failure (transport error, timeout, non-success status) means the
    /// asset does not exist. Implementations must not download the body.
    async fn exists(&self, url: &str) -> bool;

    /// Retrieves the asset bytes at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportFailure>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The remote source configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &RemoteConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(5))
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `AssetSource` backed by HTTP HEAD/GET requests
///
/// Each request carries its own timeout: probes use the short probe timeout,
/// downloads the longer fetch timeout.
#[derive(Debug, Clone)]
pub struct HttpAssetSource {
    client: Client,
    probe_timeout: Duration,
    fetch_timeout: Duration,
}

impl HttpAssetSource {
    pub fn new(client: Client, probe_timeout: Duration, fetch_timeout: Duration) -> Self {
        Self {
            client,
            probe_timeout,
            fetch_timeout,
        }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn exists(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let found = response.status() == StatusCode::OK;
                tracing::debug!("HEAD {} -> {}", url, response.status().as_u16());
                found
            }
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, TransportFailure::from(e));
                false
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportFailure> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(TransportFailure::EmptyBody);
        }

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = RemoteConfig {
            base_url: "https://wg.com/apigame".to_string(),
            user_agent: "asset-sweep/test".to_string(),
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_transport_failure_display() {
        assert_eq!(TransportFailure::Status(404).to_string(), "HTTP 404");
        assert_eq!(TransportFailure::Timeout.to_string(), "Request timeout");
        assert_eq!(TransportFailure::EmptyBody.to_string(), "Empty response body");
    }

    #[tokio::test]
    async fn test_unreachable_host_does_not_exist() {
        let config = RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "asset-sweep/test".to_string(),
        };
        let source = HttpAssetSource::new(
            build_http_client(&config).unwrap(),
            Duration::from_millis(500),
            Duration::from_millis(500),
        );

        assert!(!source.exists("http://127.0.0.1:9/zh/img/1.webp").await);
        assert!(source.fetch("http://127.0.0.1:9/zh/img/1.webp").await.is_err());
    }
}
