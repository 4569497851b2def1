//! Document fetching
//!
//! This module defines the `Fetcher` interface the crawl session retrieves
//! documents through, and the reqwest-backed `HttpFetcher`:
//! - per-host client reuse through a shared `HostPool`
//! - an inactivity timeout on the response headers and on every body chunk
//! - classification of failures into timeouts and transport errors

use crate::config::CrawlerConfig;
use crate::crawler::pool::HostPool;
use crate::url::ResourceLocator;
use crate::{FetchError, UrlError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Retrieves the text of one resource
///
/// Implementations deliver exactly one outcome per call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &ResourceLocator) -> Result<String, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, locator: &ResourceLocator) -> Result<String, FetchError> {
        (**self).fetch(locator).await
    }
}

/// HTTP fetcher backed by reqwest
///
/// # Request Flow
///
/// 1. Reject locators without a host (relative references cannot be routed)
/// 2. Take the host's client from the pool, creating it on first use
/// 3. Send `GET` with `Accept: text/html`
/// 4. Read the body chunk by chunk
///
/// # Failure Handling
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | No headers or no chunk within the timeout | `Timeout`, host client evicted |
/// | Connection, TLS or protocol failure | `Transport` |
/// | Locator without host | `Transport` (`UrlError::MissingHost`) |
/// | Any HTTP status | Success, the body is the document |
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    pool: Arc<HostPool>,
    timeout: Duration,
    user_agent: String,
}

impl HttpFetcher {
    /// Creates a fetcher on the process-wide host pool
    pub fn new(config: &CrawlerConfig) -> Self {
        Self::with_pool(config, HostPool::global())
    }

    /// Creates a fetcher on a caller-provided pool
    pub fn with_pool(config: &CrawlerConfig, pool: Arc<HostPool>) -> Self {
        Self {
            pool,
            timeout: config.timeout(),
            user_agent: config.user_agent(),
        }
    }

    pub fn pool(&self) -> &Arc<HostPool> {
        &self.pool
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self, host_key: &str, url: &str) -> FetchError {
        self.pool.evict(host_key);
        FetchError::Timeout {
            url: url.to_string(),
            after: self.timeout,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &ResourceLocator) -> Result<String, FetchError> {
        let (url, host_key) = match (locator.as_url(), locator.host_key()) {
            (Some(url), Some(host_key)) => (url, host_key),
            _ => {
                return Err(FetchError::transport(
                    locator.as_str(),
                    UrlError::MissingHost(locator.as_str().to_string()),
                ))
            }
        };

        let client = self
            .pool
            .client_for(&host_key)
            .map_err(|e| FetchError::transport(url.as_str(), e))?;

        tracing::debug!("Fetching {}", url);
        let request = client
            .get(url.clone())
            .header(ACCEPT, "text/html")
            .header(USER_AGENT, &self.user_agent);

        let mut response = match timeout(self.timeout, request.send()).await {
            Err(_) => return Err(self.timed_out(&host_key, url.as_str())),
            Ok(Err(e)) => return Err(FetchError::transport(url.as_str(), e)),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered with HTTP {}", url, status.as_u16());
        }

        let mut body = Vec::new();
        loop {
            match timeout(self.timeout, response.chunk()).await {
                Err(_) => return Err(self.timed_out(&host_key, url.as_str())),
                Ok(Err(e)) => return Err(FetchError::transport(url.as_str(), e)),
                Ok(Ok(Some(chunk))) => body.extend_from_slice(&chunk),
                Ok(Ok(None)) => break,
            }
        }

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
