//! Bounded in-memory activity store.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use pulse_proto::ActivityEnvelope;

/// Shared, bounded store of recent activity, newest first.
///
/// Cloning is cheap; clones share the same underlying buffer.
#[derive(Clone)]
pub struct FeedStore {
    inner: Arc<RwLock<VecDeque<ActivityEnvelope>>>,
    capacity: usize,
}

impl FeedStore {
    /// Create a store retaining at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Prepend a single activity item, evicting the oldest past capacity.
    pub fn push(&self, envelope: ActivityEnvelope) {
        let mut items = self.inner.write();
        items.push_front(envelope);
        items.truncate(self.capacity);
    }

    /// Replace the whole contents with a fresh snapshot.
    pub fn replace(&self, activities: Vec<ActivityEnvelope>) {
        let mut items = self.inner.write();
        items.clear();
        items.extend(activities.into_iter().take(self.capacity));
    }

    /// Current contents, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActivityEnvelope> {
        self.inner.read().iter().cloned().collect()
    }

    /// Number of retained items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl std::fmt::Debug for FeedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn envelope(kind: &str) -> ActivityEnvelope {
        ActivityEnvelope::new(kind, Utc::now())
    }

    #[test]
    fn test_push_is_newest_first() {
        let store = FeedStore::new(10);
        store.push(envelope("older"));
        store.push(envelope("newer"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].kind, "newer");
        assert_eq!(snapshot[1].kind, "older");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = FeedStore::new(3);
        for i in 0..5 {
            store.push(envelope(&format!("activity-{i}")));
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].kind, "activity-4");
        assert_eq!(snapshot[2].kind, "activity-2");
    }

    #[test]
    fn test_replace_swaps_contents() {
        let store = FeedStore::new(10);
        store.push(envelope("stale"));

        store.replace(vec![envelope("fresh-a"), envelope("fresh-b")]);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].kind, "fresh-a");
    }

    #[test]
    fn test_replace_respects_capacity() {
        let store = FeedStore::new(2);
        store.replace(vec![envelope("a"), envelope("b"), envelope("c")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clones_share_contents() {
        let store = FeedStore::new(10);
        let clone = store.clone();
        store.push(envelope("shared"));

        assert_eq!(clone.len(), 1);
        assert!(!clone.is_empty());
    }
}
