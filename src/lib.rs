//! Ripple-Crawl: a rule-driven web-resource crawler
//!
//! This crate implements an embeddable traversal engine. Starting from one or
//! more seed URLs it fetches each page, extracts outbound anchors, evaluates
//! declarative follow/skip/match rules against every link, and recurses over
//! accepted links until no work remains. Matched links are accumulated and
//! reported once the whole traversal has settled.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawl::{Crawler, Rule};
//!
//! # async fn example() -> Result<(), ripple_crawl::CrawlError> {
//! let crawler = Crawler::http(Default::default())?
//!     .follow(Rule::href("^/docs/")?)
//!     .skip(Rule::text("(?i)logout")?)
//!     .matching(Rule::href(r"\.pdf$")?);
//!
//! let report = crawler.run(["https://example.com/"]).await;
//! for url in &report.results {
//!     println!("{}", url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod output;
pub mod rules;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Ripple-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::SessionPhase,
        to: state::SessionPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Empty URL")]
    Empty,

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Rule construction errors
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Failure of a single fetch
///
/// Fetch errors are scoped to one resource. The crawl session reports them as
/// events and keeps going.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url} after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Wraps an underlying transport failure for `url`
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// The locator the failed fetch was issued for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. } | Self::Transport { url, .. } => url,
        }
    }

    /// Returns true if the fetch was abandoned for inactivity
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for Ripple-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlerConfig, ExtractorKind, LinkMode};
pub use crawler::{
    CrawlEvent, CrawlReport, CrawlSession, Crawler, Fetcher, HostPool, HttpFetcher, Link,
    LinkExtractor,
};
pub use rules::{LinkContext, Rule, RuleSet};
pub use state::{SessionPhase, VisitedSet};
pub use self::url::ResourceLocator;
