use crate::url::ResourceLocator;
use crate::RuleError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A discovered link as seen by the rules
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    /// The link's href, parsed
    pub link: &'a ResourceLocator,

    /// The anchor's visible text
    pub text: &'a str,

    /// The page the link was found on
    pub page: &'a ResourceLocator,
}

/// Closure form of a rule
pub type Predicate = Arc<dyn Fn(&LinkContext<'_>) -> bool + Send + Sync>;

/// A follow, skip or match condition
///
/// Rules come in two shapes evaluated through the same
/// [`evaluate`](Rule::evaluate) call:
///
/// - `Pattern`: independent regular expressions over the href and the
///   visible text; an omitted expression matches everything
/// - `Predicate`: an arbitrary closure over the [`LinkContext`]
///
/// `Not` wraps another rule and inverts it; it is what `skip` registers.
///
/// # Examples
///
/// ```
/// use ripple_crawl::{LinkContext, ResourceLocator, Rule};
///
/// let rule = Rule::pattern(Some("^/docs/"), Some("(?i)guide")).unwrap();
///
/// let page = ResourceLocator::parse("https://example.com/").unwrap();
/// let link = ResourceLocator::parse("/docs/start").unwrap();
/// let ctx = LinkContext { link: &link, text: "User Guide", page: &page };
///
/// assert!(rule.evaluate(&ctx));
/// assert!(!rule.negate().evaluate(&ctx));
/// ```
#[derive(Clone)]
pub enum Rule {
    Pattern(PatternRule),
    Predicate(Predicate),
    Not(Box<Rule>),
}

/// Structural rule: optional href and text patterns, both must match
#[derive(Debug, Clone, Default)]
pub struct PatternRule {
    pub href: Option<Regex>,
    pub text: Option<Regex>,
}

impl PatternRule {
    fn matches(&self, ctx: &LinkContext<'_>) -> bool {
        let text_ok = self.text.as_ref().map_or(true, |re| re.is_match(ctx.text));
        let href_ok = self
            .href
            .as_ref()
            .map_or(true, |re| re.is_match(ctx.link.as_str()));
        text_ok && href_ok
    }
}

impl Rule {
    /// A rule that accepts every link
    pub fn any() -> Self {
        Self::Pattern(PatternRule::default())
    }

    /// A rule on the link's href only
    pub fn href(pattern: &str) -> Result<Self, RuleError> {
        Self::pattern(Some(pattern), None)
    }

    /// A rule on the anchor's visible text only
    pub fn text(pattern: &str) -> Result<Self, RuleError> {
        Self::pattern(None, Some(pattern))
    }

    /// A structural rule from optional href and text patterns
    ///
    /// # Returns
    ///
    /// * `Ok(Rule)` - Both patterns compiled
    /// * `Err(RuleError)` - One of the patterns is not a valid regex
    pub fn pattern(href: Option<&str>, text: Option<&str>) -> Result<Self, RuleError> {
        Ok(Self::Pattern(PatternRule {
            href: href.map(compile).transpose()?,
            text: text.map(compile).transpose()?,
        }))
    }

    /// A rule backed by a closure
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&LinkContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// The logical negation of this rule
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Evaluates the rule against a link
    pub fn evaluate(&self, ctx: &LinkContext<'_>) -> bool {
        match self {
            Self::Pattern(pattern) => pattern.matches(ctx),
            Self::Predicate(predicate) => predicate(ctx),
            Self::Not(inner) => !inner.evaluate(ctx),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(pattern) => f
                .debug_struct("Pattern")
                .field("href", &pattern.href.as_ref().map(Regex::as_str))
                .field("text", &pattern.text.as_ref().map(Regex::as_str))
                .finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}

impl From<PatternRule> for Rule {
    fn from(pattern: PatternRule) -> Self {
        Self::Pattern(pattern)
    }
}
