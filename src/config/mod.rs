//! Configuration module for Ripple-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning them into runtime crawler settings and rule sets.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will start from {} seeds", config.seeds.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExtractorKind, LinkMode, OutputConfig, RuleEntry, UserAgentConfig,
    DEFAULT_TIMEOUT_MS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate_seeds;
