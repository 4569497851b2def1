//! Per-host connection reuse
//!
//! A `HostPool` maps a `host[:port]` key to the `reqwest::Client` whose
//! connection pool serves that host. Clients are created lazily on first use
//! and kept until evicted. The process-wide pool returned by
//! [`HostPool::global`] outlives every crawl session, so concurrent sessions
//! share (and may contend on) the same per-host connections.

use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Lazily populated map of host keys to HTTP clients
#[derive(Debug, Default)]
pub struct HostPool {
    clients: Mutex<HashMap<String, Client>>,
}

impl HostPool {
    /// Creates an empty, private pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide pool
    pub fn global() -> Arc<HostPool> {
        static GLOBAL: OnceLock<Arc<HostPool>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(HostPool::new())))
    }

    /// Returns the client for a host, creating it on first use
    ///
    /// # Returns
    ///
    /// * `Ok(Client)` - A handle sharing the host's connection pool
    /// * `Err(reqwest::Error)` - The client could not be built
    pub fn client_for(&self, host_key: &str) -> Result<Client, reqwest::Error> {
        let mut clients = self.lock();
        if let Some(client) = clients.get(host_key) {
            return Ok(client.clone());
        }

        tracing::debug!("Opening client for host {}", host_key);
        let client = build_http_client()?;
        clients.insert(host_key.to_string(), client.clone());
        Ok(client)
    }

    /// Drops the host's client
    ///
    /// Idle connections close once every outstanding handle to the evicted
    /// client is dropped. The next request to the host opens a fresh client.
    ///
    /// Returns true if a client was evicted.
    pub fn evict(&self, host_key: &str) -> bool {
        let evicted = self.lock().remove(host_key).is_some();
        if evicted {
            tracing::debug!("Evicted client for host {}", host_key);
        }
        evicted
    }

    pub fn contains(&self, host_key: &str) -> bool {
        self.lock().contains_key(host_key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Client>> {
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Builds the HTTP client used for one host
///
/// Redirects are not followed: a redirect response is a document like any
/// other. Timeouts are applied per request by the fetcher.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}
