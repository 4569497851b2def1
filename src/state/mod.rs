//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `SessionPhase`: Lifecycle of one crawl session (pending, resolved, cancelled)
//! - `VisitedSet`: Session-scoped set of locator identities already dispatched

mod session_phase;
mod visited;

// Re-export main types
pub use session_phase::SessionPhase;
pub use visited::VisitedSet;
