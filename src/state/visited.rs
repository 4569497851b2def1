//! Session-scoped deduplication of resource identities

use crate::url::ResourceLocator;
use std::collections::HashSet;
use std::sync::Mutex;

/// The set of locator identities a crawl session has dispatched
///
/// The set only grows. [`claim`](VisitedSet::claim) performs the membership
/// test and the insert under one lock, so two concurrent dispatches of the
/// same identity cannot both be admitted.
#[derive(Debug, Default)]
pub struct VisitedSet {
    identities: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims an identity for fetching
    ///
    /// # Returns
    ///
    /// * `true` - The identity was not present and is now claimed
    /// * `false` - The identity was already claimed by an earlier dispatch
    pub fn claim(&self, locator: &ResourceLocator) -> bool {
        let mut identities = self.lock();
        identities.insert(locator.as_str().to_string())
    }

    pub fn contains(&self, locator: &ResourceLocator) -> bool {
        self.lock().contains(locator.as_str())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A set of strings is never left half-updated by a panic
        self.identities
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
