//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the downloader, including:
//! - Building the HTTP client with user agent and timeout
//! - Issuing one GET per attempt against the image endpoint
//! - Classifying failures (status, timeout, transport)

use crate::config::DownloadConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// A network-level failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The request (or body read) exceeded the configured timeout
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    /// Connection, DNS, TLS or body transfer failure
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// HTTP status code, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if e.is_connect() {
            Self::Transport {
                url: url.to_string(),
                message: format!("Connection failed: {}", e),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// A source of image bytes
///
/// Each call should return a fresh, independently chosen image. The
/// production source is [`HttpFetcher`]; tests substitute scripted sources.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches one image
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - Download configuration (user agent, request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &DownloadConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches images from a fixed HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    /// Creates a fetcher using a preconfigured client
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Builds a client from `config` and targets its endpoint
    pub fn from_config(config: &DownloadConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?, config.endpoint.clone()))
    }

    /// The endpoint this fetcher requests
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ImageSource for HttpFetcher {
    /// Issues one GET against the endpoint
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 2xx | body bytes |
    /// | Any other status | `FetchError::Status` |
    /// | Timeout (request or body) | `FetchError::Timeout` |
    /// | Connect/DNS/TLS/body error | `FetchError::Transport` |
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))?;

        let status: StatusCode = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))?;

        tracing::trace!("Fetched {} bytes from {}", body.len(), self.url);
        Ok(body.to_vec())
    }
}
