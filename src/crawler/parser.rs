//! Anchor extraction
//!
//! This module turns a fetched document into the links the rules are
//! evaluated against. Two extractors are provided:
//! - `HtmlExtractor` parses the document with `scraper`
//! - `LexicalExtractor` scans for anchor-like tokens with regular expressions
//!
//! Both drop anchors without a usable `href` instead of failing.

use crate::config::ExtractorKind;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::{Arc, OnceLock};

/// A link as written in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The href attribute, unresolved
    pub href: String,

    /// The anchor's visible text
    pub text: String,
}

impl Link {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// Extracts candidate links from document text
pub trait LinkExtractor: Send + Sync {
    /// Returns every anchor found in `document`, in document order
    fn extract_links(&self, document: &str) -> Vec<Link>;
}

/// Builds the extractor selected in the configuration
pub fn build_extractor(kind: ExtractorKind) -> Arc<dyn LinkExtractor> {
    match kind {
        ExtractorKind::Html => Arc::new(HtmlExtractor),
        ExtractorKind::Lexical => Arc::new(LexicalExtractor),
    }
}

/// Extractor backed by a full HTML parse
///
/// # Extraction Rules
///
/// - every `<a href="...">` element is a link, wherever it appears
/// - the text is the element's text content with whitespace collapsed
/// - anchors whose href is empty or whitespace are skipped
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::{HtmlExtractor, Link, LinkExtractor};
///
/// let html = r#"<ul><li><a href="/p1">First
///     page</a></li><li><a name="top">no href</a></li></ul>"#;
/// let links = HtmlExtractor.extract_links(html);
/// assert_eq!(links, vec![Link::new("/p1", "First page")]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl LinkExtractor for HtmlExtractor {
    fn extract_links(&self, document: &str) -> Vec<Link> {
        let document = Html::parse_document(document);
        let mut links = Vec::new();

        if let Ok(a_selector) = Selector::parse("a[href]") {
            for element in document.select(&a_selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };

                let href = href.trim();
                if href.is_empty() {
                    continue;
                }

                let text = element
                    .text()
                    .flat_map(str::split_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ");

                links.push(Link::new(href, text));
            }
        }

        links
    }
}

/// Extractor that scans for anchor tokens without building a DOM
///
/// A token is `<a ...>` with at least one attribute, followed by either plain
/// text or a single `<img ...>` tag, followed by `</a>`. The href must be a
/// double-quoted `href="..."` attribute. The text is the token's inner markup,
/// trimmed, so an image link carries its `<img>` tag as text.
///
/// Nested markup other than a lone image is not recognized.
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::{LexicalExtractor, Link, LinkExtractor};
///
/// let html = r#"<a href="/p1">t1</a> <a href="/p2"><img src="x.png"></a>"#;
/// let links = LexicalExtractor.extract_links(html);
/// assert_eq!(
///     links,
///     vec![Link::new("/p1", "t1"), Link::new("/p2", r#"<img src="x.png">"#)]
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalExtractor;

struct LexicalPatterns {
    anchor: Regex,
    href: Regex,
    inner: Regex,
}

fn lexical_patterns() -> &'static LexicalPatterns {
    static PATTERNS: OnceLock<LexicalPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LexicalPatterns {
        anchor: Regex::new(r"(?i)<a\s[^>]+>\s*(?:<img\s[^>]+>|[^<]+)</a>")
            .expect("anchor token pattern is valid"),
        href: Regex::new(r#"(?i)\shref\s*=\s*"([^"]+)""#).expect("href pattern is valid"),
        inner: Regex::new(r"(?is)^<a\s[^>]+>(.*)</a>$").expect("inner text pattern is valid"),
    })
}

impl LinkExtractor for LexicalExtractor {
    fn extract_links(&self, document: &str) -> Vec<Link> {
        let patterns = lexical_patterns();

        patterns
            .anchor
            .find_iter(document)
            .filter_map(|token| {
                let token = token.as_str();
                let href = patterns.href.captures(token)?.get(1)?.as_str().trim();
                if href.is_empty() {
                    return None;
                }
                let text = patterns.inner.captures(token)?.get(1)?.as_str().trim();
                Some(Link::new(href, text))
            })
            .collect()
    }
}
