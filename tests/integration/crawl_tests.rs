//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawl
//! sessions end-to-end through the real `HttpFetcher`.

use ripple_crawl::{
    CrawlError, CrawlEvent, CrawlSession, Crawler, CrawlerConfig, HostPool, HttpFetcher, LinkMode,
    Rule, SessionPhase,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawler on a private host pool so tests don't share clients
fn create_crawler(config: CrawlerConfig, pool: &Arc<HostPool>) -> Crawler {
    Crawler::new(HttpFetcher::with_pool(&config, Arc::clone(pool)), config)
}

fn host_key(base_url: &str) -> String {
    base_url.trim_start_matches("http://").to_string()
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn drain(mut session: CrawlSession) -> Vec<CrawlEvent> {
    let mut events = Vec::new();
    while let Some(event) = session.next_event().await {
        events.push(event);
    }
    events
}

fn final_results(events: &[CrawlEvent]) -> Vec<String> {
    match events.last() {
        Some(CrawlEvent::Done { results }) => {
            let mut results = results.clone();
            results.sort();
            results
        }
        other => panic!("expected Done as the last event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_crawl_follow_and_match() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{base}/page1">Page 1</a>
            <a href="{base}/page2">Page 2</a>
            <a href="{base}/report.pdf">Annual report</a>
            </body></html>"#,
            base = base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        format!(
            r#"<a href="/doc.pdf">Doc</a> <a href="{base}/page2">Page 2 again</a>"#,
            base = base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        format!(r#"<a href="{base}/">Home</a>"#, base = base_url),
    )
    .await;

    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(CrawlerConfig::default(), &pool)
        .follow(Rule::href("^http://").unwrap())
        .skip(Rule::href(r"\.pdf$").unwrap())
        .matching(Rule::href(r"\.pdf$").unwrap());

    let events = drain(crawler.crawl([format!("{}/", base_url)])).await;

    assert_eq!(
        final_results(&events),
        vec![
            format!("{}/doc.pdf", base_url),
            format!("{}/report.pdf", base_url)
        ]
    );
    assert!(!events.iter().any(|e| matches!(e, CrawlEvent::Error { .. })));
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn test_relative_match_resolves_against_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/x", r#"<a href="/a/b">ab</a>"#.to_string()).await;

    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(CrawlerConfig::default(), &pool).matching(Rule::any());

    let report = crawler.run([format!("{}/x", base_url)]).await;

    assert_eq!(report.results, vec![format!("{}/a/b", base_url)]);
    assert_eq!(report.phase, SessionPhase::Resolved);
    assert_eq!(report.stats.documents_fetched, 1);
}

#[tokio::test]
async fn test_timeout_reports_error_and_session_resolves() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/fast",
        r#"<a href="/found">found</a>"#.to_string(),
    )
    .await;

    let config = CrawlerConfig {
        timeout: 200,
        ..CrawlerConfig::default()
    };
    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(config, &pool).matching(Rule::any());

    let events = drain(crawler.crawl([
        format!("{}/slow", base_url),
        format!("{}/fast", base_url),
    ]))
    .await;

    let timeouts: Vec<&CrawlEvent> = events
        .iter()
        .filter(|e| {
            matches!(e, CrawlEvent::Error { error: CrawlError::Fetch(f), .. } if f.is_timeout())
        })
        .collect();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(final_results(&events), vec![format!("{}/found", base_url)]);
    assert!(!pool.contains(&host_key(&base_url)));
}

#[tokio::test]
async fn test_raw_mode_relative_follow_is_transport_error() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/p2">t2</a>"#.to_string()).await;

    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(CrawlerConfig::default(), &pool).follow(Rule::href("^/p2$").unwrap());

    let events = drain(crawler.crawl([format!("{}/", base_url)])).await;

    assert!(events.iter().any(|e| matches!(
        e,
        CrawlEvent::Error { locator, error: CrawlError::Fetch(f) } if locator == "/p2" && !f.is_timeout()
    )));
    assert!(final_results(&events).is_empty());
}

#[tokio::test]
async fn test_resolved_mode_follows_relative_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/p1">one</a> <a href="/">home</a>"#.to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/p1",
        r#"<a href="/">home</a> <a href="p1">self</a>"#.to_string(),
    )
    .await;

    let config = CrawlerConfig {
        link_mode: LinkMode::Resolved,
        ..CrawlerConfig::default()
    };
    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(config, &pool)
        .follow(Rule::any())
        .matching(Rule::text("one").unwrap());

    let events = drain(crawler.crawl([format!("{}/", base_url)])).await;

    assert_eq!(final_results(&events), vec![format!("{}/p1", base_url)]);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, CrawlEvent::Follow { .. }))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_error_status_is_still_a_document() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(r#"<a href="/found">Back home</a>"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(CrawlerConfig::default(), &pool).matching(Rule::any());

    let report = crawler.run([format!("{}/missing", base_url)]).await;

    assert_eq!(report.results, vec![format!("{}/found", base_url)]);
    assert_eq!(report.stats.errors, 0);
}

#[tokio::test]
async fn test_duplicate_seed_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", "<p>no links</p>".to_string()).await;

    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(CrawlerConfig::default(), &pool);
    let seed = format!("{}/", base_url);

    let report = crawler.run([seed.clone(), seed]).await;

    assert_eq!(report.stats.documents_fetched, 1);
    assert_eq!(report.stats.skips, 1);
}

#[tokio::test]
async fn test_sessions_share_host_pool() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(CrawlerConfig::default(), &pool);

    crawler.run([format!("{}/", base_url)]).await;
    assert!(pool.contains(&host_key(&base_url)));

    crawler.run([format!("{}/", base_url)]).await;
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header("accept", "text/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = CrawlerConfig {
        user_agent: Some("TestBot/1.0".to_string()),
        ..CrawlerConfig::default()
    };
    let pool = Arc::new(HostPool::new());
    let crawler = create_crawler(config, &pool);

    let report = crawler.run([format!("{}/", base_url)]).await;
    assert_eq!(report.stats.documents_fetched, 1);
}
