//! Crawl sessions
//!
//! A `Crawler` holds everything that is reusable across crawls: the fetcher,
//! the link extractor, the registered rules and the configuration. Each call
//! to `Crawler::crawl` starts an independent `CrawlSession` with its own
//! visited set, result accumulator and outstanding-work counter.
//!
//! # Work Accounting
//!
//! Every dispatched unit (a seed or a followed link) is one entry in the
//! session's outstanding-work counter and decrements it exactly once. A unit
//! that spawns K follow dispatches registers them with `fetch_add(K)` before
//! its own decrement, so the counter cannot reach zero while spawned work is
//! still pending. The decrement that takes the counter from 1 to 0 emits the
//! terminal event.
//!
//! Per-document `Completed` events are tracked separately: each fetched
//! document owns a `Subtree` node counting its own processing plus its direct
//! follow dispatches, linked to the node of the document it was found on.

use crate::config::{CrawlerConfig, LinkMode};
use crate::crawler::events::CrawlEvent;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::parser::{build_extractor, LinkExtractor};
use crate::output::CrawlStatistics;
use crate::rules::{LinkContext, Rule, RuleSet};
use crate::state::{SessionPhase, VisitedSet};
use crate::url::{resolve_href, ResourceLocator};
use crate::{ConfigError, CrawlError};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type UnitFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Reusable crawl configuration: fetcher, extractor and rules
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::{Crawler, CrawlEvent, Rule};
///
/// # async fn example() -> Result<(), ripple_crawl::CrawlError> {
/// let crawler = Crawler::http(Default::default())?
///     .follow(Rule::href("^https://example\\.com/")?)
///     .matching(Rule::text("(?i)download")?);
///
/// let mut session = crawler.crawl(["https://example.com/"]);
/// while let Some(event) = session.next_event().await {
///     if let CrawlEvent::Match { resolved, .. } = &event {
///         println!("{}", resolved);
///     }
///     if event.is_terminal() {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Crawler<F = HttpFetcher> {
    fetcher: Arc<F>,
    extractor: Arc<dyn LinkExtractor>,
    rules: Arc<RuleSet>,
    config: CrawlerConfig,
}

impl Crawler<HttpFetcher> {
    /// Creates a crawler that fetches over HTTP through the process-wide
    /// host pool
    pub fn http(config: CrawlerConfig) -> Result<Self, CrawlError> {
        if config.timeout == 0 {
            return Err(ConfigError::Validation("timeout must be greater than 0".to_string()).into());
        }

        let fetcher = HttpFetcher::new(&config);
        Ok(Self::new(fetcher, config))
    }
}

impl<F: Fetcher + 'static> Crawler<F> {
    /// Creates a crawler around any fetcher
    pub fn new(fetcher: F, config: CrawlerConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: build_extractor(config.extractor),
            rules: Arc::new(RuleSet::new()),
            config,
        }
    }

    /// Replaces all registered rules
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    /// Replaces the link extractor chosen by the configuration
    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Registers a rule a link must satisfy to be followed
    pub fn follow(mut self, rule: Rule) -> Self {
        Arc::make_mut(&mut self.rules).add_follow(rule);
        self
    }

    /// Registers a rule that prevents a link from being followed
    pub fn skip(mut self, rule: Rule) -> Self {
        Arc::make_mut(&mut self.rules).add_skip(rule);
        self
    }

    /// Registers a rule that records a link as a result
    pub fn matching(mut self, rule: Rule) -> Self {
        Arc::make_mut(&mut self.rules).add_match(rule);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Starts a crawl session over `seeds`
    ///
    /// The traversal runs on spawned tokio tasks, so this must be called from
    /// within a tokio runtime. It returns immediately; progress is observed
    /// through the returned session.
    pub fn crawl<I, S>(&self, seeds: I) -> CrawlSession
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seeds: Vec<String> = seeds
            .into_iter()
            .map(|seed| seed.as_ref().to_string())
            .collect();

        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let stats = Arc::new(Mutex::new(CrawlStatistics::new(seeds.len())));
        let results = Arc::new(Mutex::new(Vec::new()));
        let phase = Arc::new(Mutex::new(SessionPhase::Pending));

        let shared = Arc::new(Shared {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            rules: Arc::clone(&self.rules),
            link_mode: self.config.link_mode,
            visited: VisitedSet::new(),
            results: Arc::clone(&results),
            outstanding: AtomicUsize::new(seeds.len()),
            phase: Arc::clone(&phase),
            stats: Arc::clone(&stats),
            events: sender,
            cancel: cancel.clone(),
        });

        tracing::info!("Starting crawl session with {} seeds", seeds.len());

        if seeds.is_empty() {
            shared.finalize();
        }

        for seed in seeds {
            match ResourceLocator::parse_absolute(&seed) {
                Ok(locator) => shared.dispatch(locator, None),
                Err(e) => {
                    tracing::warn!("Invalid seed {}: {}", seed, e);
                    shared.emit(CrawlEvent::Error {
                        locator: seed,
                        error: e.into(),
                    });
                    shared.complete_unit();
                }
            }
        }

        CrawlSession {
            events: receiver,
            cancel,
            stats,
            results,
            phase,
        }
    }

    /// Crawls `seeds` and waits for the session to settle
    pub async fn run<I, S>(&self, seeds: I) -> CrawlReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.crawl(seeds).finish().await
    }
}

impl<F> Clone for Crawler<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            rules: Arc::clone(&self.rules),
            config: self.config.clone(),
        }
    }
}

/// Outcome of a finished crawl session
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Resolved URLs of every match, in completion order
    pub results: Vec<String>,

    /// `Resolved`, or `Cancelled` if the session was cancelled
    pub phase: SessionPhase,

    pub stats: CrawlStatistics,
}

/// Handle to a running crawl
///
/// Dropping the handle cancels the crawl.
pub struct CrawlSession {
    events: mpsc::UnboundedReceiver<CrawlEvent>,
    cancel: CancellationToken,
    stats: Arc<Mutex<CrawlStatistics>>,
    results: Arc<Mutex<Vec<String>>>,
    phase: Arc<Mutex<SessionPhase>>,
}

impl CrawlSession {
    /// Receives the next event
    ///
    /// Returns `None` once the terminal event has been received and every
    /// task of the session has exited.
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        self.events.recv().await
    }

    /// Stops dispatching new work and abandons in-flight fetches
    ///
    /// The session then settles and emits `Cancelled` as its terminal event.
    /// Has no effect once the session has resolved.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        *lock(&self.phase)
    }

    /// Snapshot of the statistics collected so far
    pub fn statistics(&self) -> CrawlStatistics {
        lock(&self.stats).clone()
    }

    /// Drains the remaining events and returns the session's outcome
    pub async fn finish(mut self) -> CrawlReport {
        let mut results = None;

        while let Some(event) = self.events.recv().await {
            match event {
                CrawlEvent::Done { results: r } | CrawlEvent::Cancelled { results: r } => {
                    results = Some(r);
                    break;
                }
                _ => {}
            }
        }

        let results = results.unwrap_or_else(|| {
            tracing::warn!("Crawl session ended without a terminal event");
            lock(&self.results).clone()
        });

        CrawlReport {
            results,
            phase: self.phase(),
            stats: self.statistics(),
        }
    }
}

impl Drop for CrawlSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// State shared by every task of one session
struct Shared<F> {
    fetcher: Arc<F>,
    extractor: Arc<dyn LinkExtractor>,
    rules: Arc<RuleSet>,
    link_mode: LinkMode,
    visited: VisitedSet,
    results: Arc<Mutex<Vec<String>>>,
    outstanding: AtomicUsize,
    phase: Arc<Mutex<SessionPhase>>,
    stats: Arc<Mutex<CrawlStatistics>>,
    events: mpsc::UnboundedSender<CrawlEvent>,
    cancel: CancellationToken,
}

/// Pending work below one fetched document
struct Subtree {
    locator: ResourceLocator,
    pending: AtomicUsize,
    parent: Option<Arc<Subtree>>,
}

impl<F: Fetcher + 'static> Shared<F> {
    fn dispatch(self: &Arc<Self>, locator: ResourceLocator, parent: Option<Arc<Subtree>>) {
        tokio::spawn(Arc::clone(self).visit(locator, parent));
    }

    fn visit(self: Arc<Self>, locator: ResourceLocator, parent: Option<Arc<Subtree>>) -> UnitFuture {
        Box::pin(async move {
            self.run_unit(locator, parent).await;
            self.complete_unit();
        })
    }

    async fn run_unit(self: &Arc<Self>, locator: ResourceLocator, parent: Option<Arc<Subtree>>) {
        if self.cancel.is_cancelled() {
            self.release(parent);
            return;
        }

        if !self.visited.claim(&locator) {
            tracing::debug!("Already visited {}", locator);
            self.emit(CrawlEvent::Skip { link: locator });
            self.release(parent);
            return;
        }

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("Abandoning fetch of {}", locator);
                self.release(parent);
                return;
            }
            outcome = self.fetcher.fetch(&locator) => outcome,
        };

        let document = match outcome {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", locator, e);
                self.emit(CrawlEvent::Error {
                    locator: locator.to_string(),
                    error: e.into(),
                });
                self.release(parent);
                return;
            }
        };

        lock(&self.stats).record_document();
        let follows = self.process_document(&document, &locator);

        let node = Arc::new(Subtree {
            locator,
            pending: AtomicUsize::new(follows.len() + 1),
            parent,
        });

        if !follows.is_empty() {
            self.outstanding.fetch_add(follows.len(), Ordering::AcqRel);
            for link in follows {
                self.dispatch(link, Some(Arc::clone(&node)));
            }
        }

        self.release(Some(node));
    }

    /// Classifies every link of a document and returns the ones to follow
    fn process_document(&self, document: &str, base: &ResourceLocator) -> Vec<ResourceLocator> {
        let links = self.extractor.extract_links(document);
        tracing::debug!("Found {} links on {}", links.len(), base);

        let mut follows = Vec::new();
        for link in links {
            let Some((target, resolved)) = self.locate(base, &link.href) else {
                tracing::debug!("Dropping malformed href {:?} on {}", link.href, base);
                continue;
            };

            let ctx = LinkContext {
                link: &target,
                text: &link.text,
                page: base,
            };
            let is_match = self.rules.is_match(&ctx);
            let should_follow = self.rules.should_follow(&ctx);

            if is_match {
                lock(&self.results).push(resolved.clone());
                self.emit(CrawlEvent::Match {
                    link: target.clone(),
                    resolved,
                });
            }

            if should_follow && !self.visited.contains(&target) && !self.cancel.is_cancelled() {
                self.emit(CrawlEvent::Follow {
                    link: target.clone(),
                });
                follows.push(target);
            } else {
                self.emit(CrawlEvent::Skip { link: target });
            }
        }

        follows
    }

    /// Parses an href into the locator rules see, plus its resolved form
    fn locate(&self, base: &ResourceLocator, href: &str) -> Option<(ResourceLocator, String)> {
        match self.link_mode {
            LinkMode::Raw => {
                let target = ResourceLocator::parse(href).ok()?;
                let resolved =
                    resolve_href(base, href).unwrap_or_else(|| target.as_str().to_string());
                Some((target, resolved))
            }
            LinkMode::Resolved => {
                let target = ResourceLocator::parse(&resolve_href(base, href)?).ok()?;
                let resolved = target.as_str().to_string();
                Some((target, resolved))
            }
        }
    }

    /// Settles one unit of a subtree, emitting `Completed` for every
    /// document whose pending count drops to zero
    fn release(&self, mut node: Option<Arc<Subtree>>) {
        while let Some(current) = node {
            if current.pending.fetch_sub(1, Ordering::AcqRel) != 1 {
                return;
            }
            self.emit(CrawlEvent::Completed {
                locator: current.locator.clone(),
            });
            node = current.parent.clone();
        }
    }

    fn complete_unit(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.finalize();
        }
    }

    fn finalize(&self) {
        let next = if self.cancel.is_cancelled() {
            SessionPhase::Cancelled
        } else {
            SessionPhase::Resolved
        };

        {
            let mut phase = lock(&self.phase);
            match phase.transition(next) {
                Ok(p) => *phase = p,
                Err(e) => {
                    tracing::error!("{}", e);
                    return;
                }
            }
        }

        let results = lock(&self.results).clone();
        tracing::info!(
            "Crawl session {} with {} results ({} resources visited)",
            next,
            results.len(),
            self.visited.len()
        );

        let event = match next {
            SessionPhase::Cancelled => CrawlEvent::Cancelled { results },
            _ => CrawlEvent::Done { results },
        };
        self.emit(event);
    }
}

impl<F> Shared<F> {
    fn emit(&self, event: CrawlEvent) {
        lock(&self.stats).record(&event);
        // The receiver may already be gone; the crawl keeps settling anyway
        let _ = self.events.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// In-memory fetcher serving a fixed set of documents
    #[derive(Default)]
    struct ScriptedFetcher {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedFetcher {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                ..Default::default()
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay: Some(delay),
                ..Default::default()
            })
        }

        fn requests(&self) -> Vec<String> {
            let mut requests = self.requests.lock().unwrap().clone();
            requests.sort();
            requests
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, locator: &ResourceLocator) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(locator.as_str().to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.pages
                .get(locator.as_str())
                .cloned()
                .ok_or_else(|| FetchError::transport(locator.as_str(), "no such page"))
        }
    }

    fn crawler(fetcher: &Arc<ScriptedFetcher>) -> Crawler<Arc<ScriptedFetcher>> {
        Crawler::new(Arc::clone(fetcher), CrawlerConfig::default())
    }

    async fn drain(mut session: CrawlSession) -> Vec<CrawlEvent> {
        let mut events = Vec::new();
        while let Some(event) = session.next_event().await {
            events.push(event);
        }
        events
    }

    fn count(events: &[CrawlEvent], kind: &str) -> usize {
        events.iter().filter(|e| e.kind() == kind).count()
    }

    const TWO_LINKS: &str = r#"<a href="/p1">t1</a> <a href="/p2">t2</a>"#;

    #[tokio::test]
    async fn test_no_follow_rules_fetches_only_seeds() {
        let fetcher = ScriptedFetcher::new(&[("http://h/", TWO_LINKS)]);
        let crawler = crawler(&fetcher).matching(Rule::href("^/p1$").unwrap());

        let report = crawler.run(["http://h/"]).await;

        assert_eq!(report.results, vec!["http://h/p1".to_string()]);
        assert_eq!(report.phase, SessionPhase::Resolved);
        assert_eq!(fetcher.requests(), vec!["http://h/".to_string()]);
    }

    #[tokio::test]
    async fn test_follow_dispatches_unresolved_href() {
        let fetcher = ScriptedFetcher::new(&[("http://h/", TWO_LINKS), ("/p2", "")]);
        let crawler = crawler(&fetcher)
            .follow(Rule::href("^/p2$").unwrap())
            .matching(Rule::href("^/p1$").unwrap());

        let events = drain(crawler.crawl(["http://h/"])).await;

        assert_eq!(
            fetcher.requests(),
            vec!["/p2".to_string(), "http://h/".to_string()]
        );
        assert_eq!(count(&events, "follow"), 1);
        assert_eq!(count(&events, "error"), 0);
        match events.last() {
            Some(CrawlEvent::Done { results }) => {
                assert_eq!(results, &vec!["http://h/p1".to_string()])
            }
            other => panic!("expected Done last, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_seed_fetched_once() {
        let fetcher = ScriptedFetcher::new(&[("http://h/", "no links here")]);
        let crawler = crawler(&fetcher);

        let events = drain(crawler.crawl(["http://h/", "http://h/"])).await;

        assert_eq!(fetcher.requests().len(), 1);
        assert_eq!(count(&events, "skip"), 1);
        assert_eq!(count(&events, "done"), 1);
        assert!(events.iter().any(
            |e| matches!(e, CrawlEvent::Skip { link } if link.as_str() == "http://h/")
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_identity_reachable_by_many_paths_fetched_once() {
        let fetcher = ScriptedFetcher::new(&[
            (
                "http://h/",
                r#"<a href="http://h/a">a</a><a href="http://h/b">b</a>"#,
            ),
            ("http://h/a", r#"<a href="http://h/c">c</a>"#),
            ("http://h/b", r#"<a href="http://h/c">c</a>"#),
            ("http://h/c", r#"<a href="http://h/">home</a>"#),
        ]);
        let crawler = crawler(&fetcher).follow(Rule::any());

        let report = crawler.run(["http://h/"]).await;

        assert_eq!(
            fetcher.requests(),
            vec!["http://h/", "http://h/a", "http://h/b", "http://h/c"]
        );
        assert_eq!(report.stats.documents_fetched, 4);
        assert_eq!(report.phase, SessionPhase::Resolved);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_done_fires_once_after_dynamic_fan_out() {
        let hub: String = (0..25)
            .map(|i| format!(r#"<a href="http://h/leaf{}">leaf</a>"#, i))
            .collect();
        let mut pages = vec![("http://h/".to_string(), hub)];
        for i in 0..25 {
            pages.push((
                format!("http://h/leaf{}", i),
                r#"<a href="http://h/">back</a>"#.to_string(),
            ));
        }
        let pages: Vec<(&str, &str)> = pages
            .iter()
            .map(|(url, body)| (url.as_str(), body.as_str()))
            .collect();
        let fetcher = ScriptedFetcher::new(&pages);
        let crawler = crawler(&fetcher)
            .follow(Rule::any())
            .matching(Rule::href("leaf").unwrap());

        let events = drain(crawler.crawl(["http://h/"])).await;

        assert_eq!(count(&events, "done"), 1);
        assert!(events.last().unwrap().is_terminal());
        assert_eq!(fetcher.requests().len(), 26);
        match events.last() {
            Some(CrawlEvent::Done { results }) => assert_eq!(results.len(), 25),
            other => panic!("expected Done last, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_match_rule_yields_one_result() {
        let fetcher = ScriptedFetcher::new(&[("http://h/", TWO_LINKS)]);
        let rule = Rule::href("^/p1$").unwrap();
        let crawler = crawler(&fetcher).matching(rule.clone()).matching(rule);

        let events = drain(crawler.crawl(["http://h/"])).await;

        assert_eq!(count(&events, "match"), 1);
        match events.last() {
            Some(CrawlEvent::Done { results }) => assert_eq!(results.len(), 1),
            other => panic!("expected Done last, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_relative_match_resolved_against_page() {
        let fetcher = ScriptedFetcher::new(&[("http://example.com/x", r#"<a href="/a/b">ab</a>"#)]);
        let crawler = crawler(&fetcher).matching(Rule::any());

        let report = crawler.run(["http://example.com/x"]).await;

        assert_eq!(report.results, vec!["http://example.com/a/b".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_fatal() {
        let fetcher = ScriptedFetcher::new(&[("http://h/", TWO_LINKS)]);
        let crawler = crawler(&fetcher).matching(Rule::href("^/p1$").unwrap());

        let events = drain(crawler.crawl(["http://h/", "http://missing/"])).await;

        assert_eq!(count(&events, "error"), 1);
        assert!(events.iter().any(
            |e| matches!(e, CrawlEvent::Error { locator, .. } if locator == "http://missing/")
        ));
        match events.last() {
            Some(CrawlEvent::Done { results }) => assert_eq!(results.len(), 1),
            other => panic!("expected Done last, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_seed_reported_and_counted() {
        let fetcher = ScriptedFetcher::new(&[]);
        let crawler = crawler(&fetcher);

        let report = crawler.run(["/not-absolute"]).await;

        assert!(report.results.is_empty());
        assert_eq!(report.phase, SessionPhase::Resolved);
        assert_eq!(report.stats.errors, 1);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_zero_seeds_resolve_immediately() {
        let fetcher = ScriptedFetcher::new(&[]);
        let crawler = crawler(&fetcher);

        let events = drain(crawler.crawl(Vec::<String>::new())).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CrawlEvent::Done { results } if results.is_empty()));
    }

    #[tokio::test]
    async fn test_completed_follows_subtree() {
        let fetcher = ScriptedFetcher::new(&[
            ("http://h/", r#"<a href="http://h/p2">t2</a>"#),
            ("http://h/p2", "leaf"),
        ]);
        let crawler = crawler(&fetcher).follow(Rule::any());

        let events = drain(crawler.crawl(["http://h/"])).await;

        let completed: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                CrawlEvent::Completed { locator } => Some(locator.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec!["http://h/p2", "http://h/"]);
        assert!(matches!(events.last(), Some(CrawlEvent::Done { .. })));
    }

    #[tokio::test]
    async fn test_cancel_resolves_with_cancelled() {
        let fetcher = ScriptedFetcher::slow(Duration::from_secs(30));
        let crawler = crawler(&fetcher);

        let session = crawler.crawl(["http://h/", "http://h/other"]);
        session.cancel();
        let report = tokio::time::timeout(Duration::from_secs(5), session.finish())
            .await
            .expect("cancelled session should settle");

        assert_eq!(report.phase, SessionPhase::Cancelled);
        assert!(report.results.is_empty());
        assert!(report.stats.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_during_fetch() {
        let fetcher = ScriptedFetcher::slow(Duration::from_secs(30));
        let crawler = crawler(&fetcher);

        let mut session = crawler.crawl(["http://h/"]);
        let token = session.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let mut terminal = Vec::new();
        while let Some(event) = tokio::time::timeout(Duration::from_secs(5), session.next_event())
            .await
            .expect("cancelled session should settle")
        {
            if event.is_terminal() {
                terminal.push(event);
            }
        }

        assert_eq!(terminal.len(), 1);
        assert!(matches!(terminal[0], CrawlEvent::Cancelled { .. }));
        assert_eq!(session.phase(), SessionPhase::Cancelled);
    }

    #[tokio::test]
    async fn test_resolved_mode_deduplicates_relative_aliases() {
        let fetcher = ScriptedFetcher::new(&[
            ("http://h/", r#"<a href="/a">a</a><a href="/">home</a>"#),
            ("http://h/a", r#"<a href="/">home</a><a href="./a">self</a>"#),
        ]);
        let config = CrawlerConfig {
            link_mode: LinkMode::Resolved,
            ..CrawlerConfig::default()
        };
        let crawler = Crawler::new(Arc::clone(&fetcher), config).follow(Rule::any());

        let events = drain(crawler.crawl(["http://h/"])).await;

        assert_eq!(fetcher.requests(), vec!["http://h/", "http://h/a"]);
        assert_eq!(count(&events, "follow"), 1);
        assert_eq!(count(&events, "error"), 0);
    }

    #[tokio::test]
    async fn test_predicate_sees_page_context() {
        let fetcher = ScriptedFetcher::new(&[
            ("http://h/", r#"<a href="http://h/a">a</a>"#),
            ("http://h/a", r#"<a href="http://h/b">b</a>"#),
            ("http://h/b", ""),
        ]);
        let crawler =
            crawler(&fetcher).follow(Rule::predicate(|ctx| ctx.page.as_str() == "http://h/"));

        crawler.run(["http://h/"]).await;

        assert_eq!(fetcher.requests(), vec!["http://h/", "http://h/a"]);
    }

    #[tokio::test]
    async fn test_skip_rule_blocks_recursion() {
        let fetcher = ScriptedFetcher::new(&[
            (
                "http://h/",
                r#"<a href="http://h/docs">docs</a><a href="http://h/logout">Log out</a>"#,
            ),
            ("http://h/docs", ""),
        ]);
        let crawler = crawler(&fetcher).skip(Rule::text("(?i)log ?out").unwrap());

        let report = crawler.run(["http://h/"]).await;

        assert_eq!(fetcher.requests(), vec!["http://h/", "http://h/docs"]);
        assert_eq!(report.stats.follows, 1);
        assert_eq!(report.stats.skips, 1);
    }

    #[test]
    fn test_http_rejects_zero_timeout() {
        let config = CrawlerConfig {
            timeout: 0,
            ..CrawlerConfig::default()
        };
        assert!(matches!(
            Crawler::http(config),
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_builder_registers_rules() {
        let crawler = Crawler::http(CrawlerConfig::default())
            .unwrap()
            .follow(Rule::any())
            .skip(Rule::href("logout").unwrap())
            .matching(Rule::href("\\.pdf$").unwrap());

        assert_eq!(crawler.rules().follow_rules().len(), 2);
        assert_eq!(crawler.rules().match_rules().len(), 1);
    }
}
