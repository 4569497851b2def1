//! Statistics collected while a crawl session runs
//!
//! The session records every event it emits, so the counters always agree
//! with what a subscriber to the event stream observed.

use crate::crawler::CrawlEvent;
use crate::CrawlError;
use chrono::{DateTime, Duration, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Number of seed locators the session started with
    pub seeds: usize,

    /// Documents fetched successfully
    pub documents_fetched: u64,

    /// Links accepted for recursion
    pub follows: u64,

    /// Links not followed plus dispatches that found their locator visited
    pub skips: u64,

    /// Links recorded as results
    pub matches: u64,

    /// Failed fetches and unparsable seeds
    pub errors: u64,

    /// The subset of `errors` caused by a fetch timeout
    pub timeouts: u64,

    /// Documents whose whole subtree has settled
    pub completed: u64,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// When the terminal event was emitted
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlStatistics {
    pub fn new(seeds: usize) -> Self {
        Self {
            seeds,
            documents_fetched: 0,
            follows: 0,
            skips: 0,
            matches: 0,
            errors: 0,
            timeouts: 0,
            completed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Updates the counters for an emitted event
    pub fn record(&mut self, event: &CrawlEvent) {
        match event {
            CrawlEvent::Skip { .. } => self.skips += 1,
            CrawlEvent::Follow { .. } => self.follows += 1,
            CrawlEvent::Match { .. } => self.matches += 1,
            CrawlEvent::Error { error, .. } => {
                self.errors += 1;
                if matches!(error, CrawlError::Fetch(e) if e.is_timeout()) {
                    self.timeouts += 1;
                }
            }
            CrawlEvent::Completed { .. } => self.completed += 1,
            CrawlEvent::Done { .. } | CrawlEvent::Cancelled { .. } => {
                self.finished_at = Some(Utc::now());
            }
        }
    }

    pub fn record_document(&mut self) {
        self.documents_fetched += 1;
    }

    /// Time between start and the terminal event, if the session finished
    pub fn duration(&self) -> Option<Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }

    /// Percentage of fetch attempts that failed
    pub fn error_rate(&self) -> f64 {
        let attempts = self.documents_fetched + self.errors;
        if attempts == 0 {
            0.0
        } else {
            (self.errors as f64 / attempts as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Seeds: {}", stats.seeds);
    println!("  Documents fetched: {}", stats.documents_fetched);
    println!("  Documents completed: {}", stats.completed);
    if let Some(duration) = stats.duration() {
        println!("  Duration: {}ms", duration.num_milliseconds());
    }
    println!();

    println!("Links:");
    println!("  Followed: {}", stats.follows);
    println!("  Skipped: {}", stats.skips);
    println!("  Matched: {}", stats.matches);
    println!();

    if stats.errors > 0 {
        println!("Errors:");
        println!("  Total: {}", stats.errors);
        println!("  Timeouts: {}", stats.timeouts);
        println!();
    }

    println!(
        "Error Rate: {:.1}% ({} failed / {} attempted)",
        stats.error_rate(),
        stats.errors,
        stats.documents_fetched + stats.errors
    );
}
