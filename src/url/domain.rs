use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_crawl::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Builds the `host[:port]` key that identifies a connection target
///
/// The port is only included when it differs from the scheme's default, so
/// `https://example.com/` and `https://example.com:443/` share a key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_crawl::url::host_key;
///
/// let url = Url::parse("http://127.0.0.1:8080/x").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = extract_host(url)?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
