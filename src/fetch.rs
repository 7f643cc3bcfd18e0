//! Remote document fetching.
//!
//! A [`Fetcher`] performs one HTTP GET and returns the body. There are no
//! retries: a failed fetch surfaces immediately as a [`FetchError`] and the
//! caller decides what that means for the batch.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::FetchError;

/// Single-attempt document fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Return the body of `url` on a 2xx response.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client with a fixed deadline.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        Self::new(source.timeout(), &source.user_agent)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let cause = if e.is_timeout() {
                format!("timed out: {}", e)
            } else {
                e.to_string()
            };
            FetchError::new(url, cause)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::new(url, format!("reading body: {}", e)))?;
        debug!(url, bytes = body.len(), "fetched document");
        Ok(body)
    }
}
