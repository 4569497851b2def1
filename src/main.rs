//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl link crawler.

use anyhow::{Context, Result};
use clap::Parser;
use ripple_crawl::config::{load_config_with_hash, validate_seeds, Config};
use ripple_crawl::output::{generate_markdown_summary, print_results, print_statistics};
use ripple_crawl::Crawler;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Ripple-Crawl: a rule-driven link crawler
///
/// Ripple-Crawl fetches the seed pages, follows the links accepted by the
/// configured follow/skip rules and prints every link accepted by a match
/// rule.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A rule-driven link crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed URLs, appended to the configured seeds
    #[arg(value_name = "SEED")]
    seeds: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write a markdown summary to this path (overrides the config)
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    validate_seeds(&cli.seeds).context("Invalid seed on the command line")?;
    config.seeds.extend(cli.seeds);

    let summary_path = cli
        .summary
        .or_else(|| config.output.summary_path.as_ref().map(PathBuf::from));

    if cli.dry_run {
        handle_dry_run(&config, summary_path.as_deref());
        return Ok(());
    }

    handle_crawl(&config, &config_hash, summary_path.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr, results and statistics to stdout
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, summary_path: Option<&Path>) {
    let crawler_config = config.crawler_config();

    println!("=== Ripple-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Timeout: {}ms", crawler_config.timeout);
    println!("  Extractor: {:?}", crawler_config.extractor);
    println!("  Link mode: {:?}", crawler_config.link_mode);
    println!("  User agent: {}", crawler_config.user_agent());

    println!("\nRules:");
    println!("  Follow: {}", config.follow.len());
    println!("  Skip: {}", config.skip.len());
    println!("  Match: {}", config.matchers.len());
    if config.follow.is_empty() && config.skip.is_empty() {
        println!("  (no follow or skip rules: only the seeds will be fetched)");
    }

    println!("\nOutput:");
    match summary_path {
        Some(path) => println!("  Summary: {}", path.display()),
        None => println!("  Summary: none"),
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.seeds.len()
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, summary_path: Option<&Path>) -> Result<()> {
    let rules = config.rule_set().context("Failed to compile rules")?;
    let crawler = Crawler::http(config.crawler_config())?.with_rules(rules);

    tracing::info!("Total seed URLs: {}", config.seeds.len());
    let session = crawler.crawl(&config.seeds);

    // Cancel on Ctrl-C; the session still settles and reports partial results
    let token = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling crawl");
            token.cancel();
        }
    });

    let report = session.finish().await;
    tracing::info!("Crawl {} with {} results", report.phase, report.results.len());

    print_results(&report.results);
    println!();
    print_statistics(&report.stats);

    if let Some(path) = summary_path {
        generate_markdown_summary(&report, Some(config_hash), path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }

    Ok(())
}
