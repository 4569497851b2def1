/// Session phase definitions for tracking a crawl session's lifecycle
///
/// A session starts `Pending` and ends in exactly one terminal phase.
use crate::CrawlError;
use std::fmt;

/// Represents the current phase of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Work is outstanding
    Pending,

    /// Every dispatched unit has completed and the results were emitted
    Resolved,

    /// The session was cancelled; partial results were emitted
    Cancelled,
}

impl SessionPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Checks whether moving from this phase to `next` is legal
    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Resolved) | (Self::Pending, Self::Cancelled)
        )
    }

    /// Performs a transition, rejecting illegal ones
    ///
    /// # Returns
    ///
    /// * `Ok(SessionPhase)` - The new phase
    /// * `Err(CrawlError::InvalidTransition)` - The transition is not allowed
    pub fn transition(self, next: SessionPhase) -> Result<SessionPhase, CrawlError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CrawlError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
