//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of one crawl:
//! run information, statistics, and the matched results.

use crate::crawler::CrawlReport;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a crawl report
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `config_hash` - Hash of the configuration the crawl ran with, if any
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    report: &CrawlReport,
    config_hash: Option<&str>,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(report, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport, config_hash: Option<&str>) -> String {
    let stats = &report.stats;
    let mut md = String::new();

    md.push_str("# Ripple-Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        stats.started_at.to_rfc3339()
    ));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = stats.duration() {
        md.push_str(&format!(
            "- **Duration**: {:.2} seconds\n",
            duration.num_milliseconds() as f64 / 1000.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", report.phase));
    if let Some(hash) = config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Statistics
    md.push_str("## Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Seeds | {} |\n", stats.seeds));
    md.push_str(&format!(
        "| Documents Fetched | {} |\n",
        stats.documents_fetched
    ));
    md.push_str(&format!("| Links Followed | {} |\n", stats.follows));
    md.push_str(&format!("| Links Skipped | {} |\n", stats.skips));
    md.push_str(&format!("| Matches | {} |\n", stats.matches));
    md.push_str(&format!("| Errors | {} |\n", stats.errors));
    md.push_str(&format!("| Timeouts | {} |\n\n", stats.timeouts));

    // Results
    md.push_str(&format!("## Results ({})\n\n", report.results.len()));
    if report.results.is_empty() {
        md.push_str("_No links matched._\n");
    } else {
        for url in &report.results {
            md.push_str(&format!("- <{}>\n", url));
        }
    }

    md
}
