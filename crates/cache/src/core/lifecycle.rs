//! Creating and attaching cache instances.

use super::types::{Eviction, SharedCache};
use crate::codec;
use crate::segment::{SegmentBlock, SegmentId};
use crate::table::{SegmentTable, SlotCursor, SlotTable};
use shmkv_core::{Error, Result};
use std::sync::atomic::Ordering;

impl<T: SegmentTable> SharedCache<T> {
    /// Create the shared segment for `id` sized to `capacity_hint`
    /// slots and lay a fresh table over it.
    ///
    /// Creation is exclusive at the OS level but idempotent here: when
    /// another process already created the segment, this transparently
    /// attaches to it instead.
    pub fn create(id: &SegmentId, capacity_hint: usize, eviction: Eviction) -> Result<Self> {
        let bytes = T::segment_bytes(capacity_hint);
        let Some(block) = SegmentBlock::create(id, bytes as u64)? else {
            tracing::debug!(segment = %id.path().display(), "segment already exists, attaching");
            return Self::attach(id, eviction);
        };

        let path = block.path().to_path_buf();
        let table = T::create_or_size(block, bytes)
            .ok_or_else(|| Error::segment_unavailable(&path, "table layout failed"))?;
        tracing::debug!(segment = %path.display(), slots = capacity_hint, "created segment");
        Ok(Self::create_with(table, eviction))
    }

    /// Attach to the existing segment for `id`.
    pub fn attach(id: &SegmentId, eviction: Eviction) -> Result<Self> {
        let block = SegmentBlock::open(id)?;
        let path = block.path().to_path_buf();
        let table = T::create_or_size(block, 0).ok_or_else(|| {
            Error::segment_unavailable(&path, "segment does not hold a usable table")
        })?;
        Self::attach_with(table, eviction)
    }
}

impl<T: SlotTable> SharedCache<T> {
    /// Wrap a handle to a freshly created, empty table.
    #[must_use]
    pub fn create_with(table: T, eviction: Eviction) -> Self {
        Self::assemble(table, eviction, true)
    }

    /// Wrap a handle bound to a pre-existing table.
    ///
    /// With eviction enabled this scans the whole table once to rebuild
    /// the recency tracker; the instance becomes usable only when that
    /// scan completes cleanly.
    pub fn attach_with(table: T, eviction: Eviction) -> Result<Self> {
        let cache = Self::assemble(table, eviction, false);
        if eviction.is_enabled() {
            cache.warm_tracker()?;
        }
        cache.initialized.store(true, Ordering::Release);
        Ok(cache)
    }

    /// Full forward scan feeding every stored key into the tracker.
    /// Anything other than a verified record or end-of-table is fatal.
    fn warm_tracker(&self) -> Result<()> {
        let mut cursor = SlotCursor::default();
        loop {
            let step = self.with_table(|table| table.next_slot(&mut cursor))?;
            let record = match step {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => return Err(Error::warmup(format!("slot scan failed: {err}"))),
            };
            if let Err(err) = codec::decode(&record.value) {
                return Err(Error::warmup(format!(
                    "record failed verification during scan: {err}"
                )));
            }
            if !record.key.is_empty() {
                self.tracker.on_access(&record.key);
            }
        }
        tracing::debug!(keys = self.tracker.len(), "recency tracker warmed from segment scan");
        Ok(())
    }
}
