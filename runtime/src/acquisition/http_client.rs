//! HTTP fetch layer for pages and sitemaps.
//!
//! A single GET per URL with a fixed timeout and a browser-identifying
//! `User-Agent`. Redirects are followed; the final URL is reported back so
//! the classifiers see where the page actually lives. Non-2xx responses are
//! errors. There are no retries.

use crate::config::RunConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A fetched document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Response body decoded as text.
    pub body: String,
    /// URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
}

/// Capability: `GET(url) → (body, final_url)`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed [`Fetcher`].
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, FetchError> {
        Self::new(config.fetch_timeout, &config.user_agent)
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let timeout_secs = self.timeout.as_secs();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout_secs))?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout_secs))?;

        debug!(url, final_url = %final_url, bytes = body.len(), "fetched");

        Ok(FetchedPage {
            body,
            final_url,
            status: status.as_u16(),
        })
    }
}
