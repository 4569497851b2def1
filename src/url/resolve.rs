use crate::url::ResourceLocator;
use url::{Position, Url};

/// Origin used when neither the base nor the href carries one
const PROBE_ORIGIN: &str = "http://relative.invalid/";
const PROBE_HOST: &str = "relative.invalid";

/// Resolves an href against the page it was found on
///
/// # Resolution Rules
///
/// | Base | Href | Result |
/// |------|------|--------|
/// | absolute | anything | RFC 3986 resolution against the base |
/// | relative | absolute | the href itself |
/// | relative | relative | the href resolved against the base's path, still relative |
///
/// Returns `None` if the href cannot be resolved.
///
/// # Examples
///
/// ```
/// use ripple_crawl::ResourceLocator;
/// use ripple_crawl::url::resolve_href;
///
/// let base = ResourceLocator::parse("http://example.com/x").unwrap();
/// assert_eq!(
///     resolve_href(&base, "/a/b"),
///     Some("http://example.com/a/b".to_string())
/// );
/// ```
pub fn resolve_href(base: &ResourceLocator, href: &str) -> Option<String> {
    let href = href.trim();

    if let Some(base_url) = base.as_url() {
        return base_url.join(href).ok().map(String::from);
    }

    if let Ok(absolute) = Url::parse(href) {
        return Some(absolute.into());
    }

    // Both sides relative: resolve under a placeholder origin, then strip it
    let resolved = Url::parse(PROBE_ORIGIN)
        .and_then(|probe| probe.join(base.as_str()))
        .and_then(|joined| joined.join(href))
        .ok()?;

    if resolved.host_str() == Some(PROBE_HOST) {
        Some(resolved[Position::BeforePath..].to_string())
    } else {
        // Protocol-relative base or href
        Some(format!("//{}", &resolved[Position::BeforeUsername..]))
    }
}
