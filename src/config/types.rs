use crate::rules::{Rule, RuleSet};
use crate::RuleError;
use serde::Deserialize;
use std::time::Duration;

/// Default per-fetch inactivity timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Main configuration structure for Ripple-Crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Seed URLs the crawl starts from
    #[serde(default)]
    pub seeds: Vec<String>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<UserAgentConfig>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub follow: Vec<RuleEntry>,

    #[serde(default)]
    pub skip: Vec<RuleEntry>,

    #[serde(rename = "match", default)]
    pub matchers: Vec<RuleEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Inactivity timeout applied to each fetch (milliseconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Which anchor extractor to run on fetched documents
    #[serde(default)]
    pub extractor: ExtractorKind,

    /// How discovered hrefs are handed to the rules and the visited set
    #[serde(rename = "link-mode", default)]
    pub link_mode: LinkMode,

    /// User-Agent header sent with every request
    #[serde(skip)]
    pub user_agent: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_MS,
            extractor: ExtractorKind::default(),
            link_mode: LinkMode::default(),
            user_agent: None,
        }
    }
}

impl CrawlerConfig {
    /// The fetch timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// The User-Agent header value, falling back to the crate name and version
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("ripple-crawl/{}", env!("CARGO_PKG_VERSION")))
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Anchor extractor selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Full HTML parse with `scraper`
    #[default]
    Html,

    /// Lexical scan for anchor tokens
    Lexical,
}

/// Treatment of discovered hrefs
///
/// `Raw` evaluates rules, checks the visited set and dispatches follows
/// against the href exactly as written, resolving it only for the match
/// result. `Resolved` resolves the href against the page first and uses the
/// absolute URL everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    #[default]
    Raw,
    Resolved,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value as `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

/// A structural rule as written in the config file
///
/// An omitted pattern matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleEntry {
    pub href: Option<String>,

    #[serde(alias = "html")]
    pub text: Option<String>,
}

impl RuleEntry {
    pub fn to_rule(&self) -> Result<Rule, RuleError> {
        Rule::pattern(self.href.as_deref(), self.text.as_deref())
    }
}

impl Config {
    /// Runtime crawler settings, including the configured user agent
    pub fn crawler_config(&self) -> CrawlerConfig {
        let mut crawler = self.crawler.clone();
        if let Some(user_agent) = &self.user_agent {
            crawler.user_agent = Some(user_agent.header_value());
        }
        crawler
    }

    /// Compiles the configured follow, skip and match rules
    pub fn rule_set(&self) -> Result<RuleSet, RuleError> {
        let mut rules = RuleSet::new();
        for entry in &self.follow {
            rules.add_follow(entry.to_rule()?);
        }
        for entry in &self.skip {
            rules.add_skip(entry.to_rule()?);
        }
        for entry in &self.matchers {
            rules.add_match(entry.to_rule()?);
        }
        Ok(rules)
    }
}
