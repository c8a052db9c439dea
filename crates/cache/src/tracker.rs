//! Process-local recency tracking for eviction ordering.
//!
//! The tracker is advisory cache metadata: it orders the keys this
//! process believes are in the table from most to least recently
//! written, and hands out eviction victims from the cold end. It is
//! never shared across processes: each attached process rebuilds its
//! own view, so two processes may disagree about recency. That is
//! acceptable; the table itself stays authoritative for membership.

use lru::LruCache;
use parking_lot::Mutex;

/// Recency bookkeeping consumed by the eviction coordinator.
pub trait RecencyTracker: Send + Sync {
    /// Note that `key` was just written (or observed during warm-up).
    fn on_access(&self, key: &[u8]);

    /// Current least-recently-used key, if any. Does not refresh it.
    fn next_victim(&self) -> Option<Vec<u8>>;

    /// Confirm that `key` left the table (evicted or deleted).
    fn on_evicted(&self, key: &[u8]);

    /// Forget all recency state.
    fn clear(&self);

    /// Number of keys currently tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default tracker: an unbounded LRU list over written keys.
pub struct LruTracker {
    entries: Mutex<LruCache<Vec<u8>, ()>>,
}

impl LruTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }
}

impl Default for LruTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RecencyTracker for LruTracker {
    fn on_access(&self, key: &[u8]) {
        // put refreshes recency for keys already present
        self.entries.lock().put(key.to_vec(), ());
    }

    fn next_victim(&self) -> Option<Vec<u8>> {
        self.entries.lock().peek_lru().map(|(key, _)| key.clone())
    }

    fn on_evicted(&self, key: &[u8]) {
        self.entries.lock().pop(key);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
