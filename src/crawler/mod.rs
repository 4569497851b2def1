//! Crawler module for fetching documents and orchestrating traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching through a process-wide per-host client pool
//! - Anchor extraction from fetched documents
//! - Crawl sessions: concurrent fan-out, deduplication and the event bus

mod events;
mod fetcher;
mod parser;
mod pool;
mod session;

pub use events::CrawlEvent;
pub use fetcher::{Fetcher, HttpFetcher};
pub use parser::{build_extractor, HtmlExtractor, LexicalExtractor, Link, LinkExtractor};
pub use pool::{build_http_client, HostPool};
pub use session::{CrawlReport, CrawlSession, Crawler};
