//! Output module for reporting crawl results
//!
//! This module handles:
//! - Collecting and printing crawl statistics
//! - Generating markdown summaries of crawl results

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Prints the matched results, one per line
pub fn print_results(results: &[String]) {
    for url in results {
        println!("{}", url);
    }
}
