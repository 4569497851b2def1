use crate::url::ResourceLocator;
use crate::CrawlError;

/// A notification emitted by a crawl session
///
/// Events from concurrent branches interleave in no particular order. A
/// session emits exactly one terminal event (`Done` or `Cancelled`) and it is
/// always the last event.
#[derive(Debug)]
pub enum CrawlEvent {
    /// A link was not followed, or a dispatched locator was already visited
    Skip { link: ResourceLocator },

    /// A link was accepted and will be fetched
    Follow { link: ResourceLocator },

    /// A link matched; `resolved` was appended to the results
    Match {
        link: ResourceLocator,
        resolved: String,
    },

    /// A resource could not be fetched (or a seed could not be parsed)
    Error { locator: String, error: CrawlError },

    /// A document and everything it spawned have been processed
    Completed { locator: ResourceLocator },

    /// All work has settled
    Done { results: Vec<String> },

    /// The session was cancelled; `results` holds what was matched so far
    Cancelled { results: Vec<String> },
}

impl CrawlEvent {
    /// Returns true for the session's final event
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Cancelled { .. })
    }

    /// Short name of the event kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Skip { .. } => "skip",
            Self::Follow { .. } => "follow",
            Self::Match { .. } => "match",
            Self::Error { .. } => "error",
            Self::Completed { .. } => "completed",
            Self::Done { .. } => "done",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
