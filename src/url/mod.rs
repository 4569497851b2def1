//! URL handling module for Ripple-Crawl
//!
//! This module provides the parsed [`ResourceLocator`] used as the identity
//! key for deduplication, host key extraction for connection reuse, and
//! resolution of hrefs against the page they were found on.

mod domain;
mod locator;
mod resolve;

// Re-export main types and functions
pub use domain::{extract_host, host_key};
pub use locator::ResourceLocator;
pub use resolve::resolve_href;
