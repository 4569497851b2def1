use crate::url::domain::host_key;
use crate::{UrlError, UrlResult};
use std::fmt;
use url::{ParseError, Url};

/// Placeholder origin used to validate and split relative references
const PROBE_BASE: &str = "http://relative.invalid/";

/// A parsed resource locator
///
/// A locator is either absolute (it carries a scheme and is backed by a
/// [`Url`]) or relative (a reference such as `/a/b?x#y` as written in a
/// page). The identity of a locator is its normalized form:
///
/// - absolute locators use the `Url` serialization, which lowercases the
///   scheme and host, drops default ports and adds the root path;
/// - relative locators use the trimmed reference text.
///
/// Two locators are equal exactly when their identities are equal.
///
/// # Examples
///
/// ```
/// use ripple_crawl::ResourceLocator;
///
/// let abs = ResourceLocator::parse("HTTP://Example.COM:80").unwrap();
/// assert_eq!(abs.as_str(), "http://example.com/");
/// assert!(abs.is_absolute());
///
/// let rel = ResourceLocator::parse(" /docs/intro?lang=en#top ").unwrap();
/// assert_eq!(rel.as_str(), "/docs/intro?lang=en#top");
/// assert_eq!(rel.path(), "/docs/intro");
/// assert_eq!(rel.query(), Some("lang=en"));
/// assert_eq!(rel.fragment(), Some("top"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocator {
    repr: Repr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Absolute(Url),
    Relative(Reference),
}

/// A relative reference split into its components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Reference {
    raw: String,
    host: Option<String>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl ResourceLocator {
    /// Parses a locator from an href or URL string
    ///
    /// # Returns
    ///
    /// * `Ok(ResourceLocator)` - An absolute or relative locator
    /// * `Err(UrlError)` - The input is empty or cannot be parsed
    pub fn parse(input: &str) -> UrlResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }

        match Url::parse(trimmed) {
            Ok(url) => Ok(Self {
                repr: Repr::Absolute(url),
            }),
            Err(ParseError::RelativeUrlWithoutBase) => {
                let reference = Reference::split(trimmed)?;
                Ok(Self {
                    repr: Repr::Relative(reference),
                })
            }
            Err(e) => Err(UrlError::Parse(format!("{}: {}", trimmed, e))),
        }
    }

    /// Parses a locator and requires it to be an absolute URL
    pub fn parse_absolute(input: &str) -> UrlResult<Self> {
        let locator = Self::parse(input)?;
        if !locator.is_absolute() {
            return Err(UrlError::MissingHost(locator.as_str().to_string()));
        }
        Ok(locator)
    }

    /// The normalized identity of this locator
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Absolute(url) => url.as_str(),
            Repr::Relative(reference) => &reference.raw,
        }
    }

    /// Returns true if the locator carries a scheme
    pub fn is_absolute(&self) -> bool {
        matches!(self.repr, Repr::Absolute(_))
    }

    /// The underlying URL for absolute locators
    pub fn as_url(&self) -> Option<&Url> {
        match &self.repr {
            Repr::Absolute(url) => Some(url),
            Repr::Relative(_) => None,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        self.as_url().map(Url::scheme)
    }

    /// The host, if the locator names one
    ///
    /// Protocol-relative references (`//host/path`) report their host even
    /// though they are not absolute.
    pub fn host(&self) -> Option<&str> {
        match &self.repr {
            Repr::Absolute(url) => url.host_str(),
            Repr::Relative(reference) => reference.host.as_deref(),
        }
    }

    /// The `host[:port]` key used for connection reuse
    pub fn host_key(&self) -> Option<String> {
        self.as_url().and_then(host_key)
    }

    pub fn path(&self) -> &str {
        match &self.repr {
            Repr::Absolute(url) => url.path(),
            Repr::Relative(reference) => &reference.path,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match &self.repr {
            Repr::Absolute(url) => url.query(),
            Repr::Relative(reference) => reference.query.as_deref(),
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        match &self.repr {
            Repr::Absolute(url) => url.fragment(),
            Repr::Relative(reference) => reference.fragment.as_deref(),
        }
    }
}

impl Reference {
    /// Splits a relative reference, rejecting ones no base could resolve
    fn split(raw: &str) -> UrlResult<Self> {
        let probe = Url::parse(PROBE_BASE)
            .and_then(|base| base.join(raw))
            .map_err(|e| UrlError::Malformed(format!("{}: {}", raw, e)))?;

        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (rest, None),
        };

        let (host, path) = match path.strip_prefix("//") {
            Some(authority_and_path) => {
                let path_start = authority_and_path
                    .find('/')
                    .unwrap_or(authority_and_path.len());
                (
                    probe.host_str().map(str::to_string),
                    authority_and_path[path_start..].to_string(),
                )
            }
            None => (None, path.to_string()),
        };

        Ok(Self {
            raw: raw.to_string(),
            host,
            path,
            query,
            fragment,
        })
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Url> for ResourceLocator {
    fn from(url: Url) -> Self {
        Self {
            repr: Repr::Absolute(url),
        }
    }
}

impl std::str::FromStr for ResourceLocator {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
