//! Cache handle, guard, and process-local statistics.

use crate::table::SlotTable;
use crate::tracker::{LruTracker, RecencyTracker};
use parking_lot::Mutex;
use shmkv_core::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Whether the cache may evict old records to make room for new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    Enabled,
    Disabled,
}

impl Eviction {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, Eviction::Enabled)
    }
}

/// Concurrent cache over a shared-memory slot table.
///
/// One instance per process per segment. The table handle is only ever
/// touched inside the process-wide guard: the guard serializes this
/// process's compound operations (such as the delete-and-retry sequence
/// during eviction) against themselves. Safety against other processes
/// mutating the same table is the primitive's own responsibility.
pub struct SharedCache<T: SlotTable> {
    pub(super) table: Mutex<Option<T>>,
    pub(super) tracker: Box<dyn RecencyTracker>,
    pub(super) eviction: Eviction,
    pub(super) initialized: AtomicBool,
    pub(super) stats: CacheStats,
}

impl<T: SlotTable> SharedCache<T> {
    pub(super) fn assemble(table: T, eviction: Eviction, initialized: bool) -> Self {
        Self {
            table: Mutex::new(Some(table)),
            tracker: Box::new(LruTracker::new()),
            eviction,
            initialized: AtomicBool::new(initialized),
            stats: CacheStats::default(),
        }
    }

    /// True from the moment create/attach fully succeeded until teardown.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Detach from the table and mark the instance unusable.
    ///
    /// Teardown order is guard, detach, clear the flag, so an operation
    /// racing with teardown observes either full validity or
    /// `NotInitialized`, never a half-torn handle. The underlying
    /// segment persists for other processes.
    pub fn close(&self) {
        let mut guard = self.table.lock();
        *guard = None;
        self.initialized.store(false, Ordering::Release);
    }

    pub(super) fn ensure_init(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Run one primitive call inside the process-wide guard. The guard
    /// is held for the duration of `op` only; codec work stays outside.
    pub(super) fn with_table<R>(&self, op: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut guard = self.table.lock();
        match guard.as_mut() {
            Some(table) => Ok(op(table)),
            None => Err(Error::NotInitialized),
        }
    }

    /// Point-in-time copy of this process's operation counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl<T: SlotTable> Drop for SharedCache<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: SlotTable> std::fmt::Debug for SharedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("initialized", &self.is_initialized())
            .field("eviction", &self.eviction)
            .finish()
    }
}

/// Internal operation counters. Advisory and process-local; updated
/// outside the table guard.
#[derive(Default)]
pub(super) struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub writes: AtomicU64,
    pub deletes: AtomicU64,
    pub evictions: AtomicU64,
    pub corruptions: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corruption(&self) {
        self.corruptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            corruptions: self.corruptions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the cache's process-local counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub corruptions: u64,
}

impl StatsSnapshot {
    /// Hits as a fraction of all lookups.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
