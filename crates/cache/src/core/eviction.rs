//! Overflow handling: the eviction retry loop.

use crate::core::types::SharedCache;
use crate::table::{PutError, SlotTable};
use shmkv_core::{Error, Result};

impl<T: SlotTable> SharedCache<T> {
    /// Guarded put with overflow recovery.
    ///
    /// On an out-of-slots signal with eviction enabled, repeatedly
    /// deletes the tracker's least-recently-used key and retries the
    /// put. The loop ends when the put lands, when the tracker runs out
    /// of victims (`NotEnoughSpace`), or when a victim's removal fails
    /// for a reason other than being already gone. Each put and delete
    /// is a separately guarded primitive call.
    pub(super) fn store(&self, key: &[u8], wire: &[u8]) -> Result<()> {
        let mut outcome = self.with_table(|table| table.put(key, wire))?;
        let mut evicting = false;

        loop {
            match outcome {
                Ok(()) => return Ok(()),
                Err(PutError::Other(reason)) => return Err(Error::StoreFailed { reason }),
                Err(PutError::OutOfSlots) => {
                    if !self.eviction.is_enabled() {
                        return Err(Error::NotEnoughSpace);
                    }
                    if !evicting {
                        evicting = true;
                        tracing::warn!("table out of slots, evicting least recently used records");
                    }

                    let Some(victim) = self.tracker.next_victim() else {
                        tracing::warn!("eviction exhausted, nothing left to evict");
                        return Err(Error::NotEnoughSpace);
                    };

                    // Removing an already-absent victim is fine; any
                    // other removal failure aborts the whole set.
                    let removed = self
                        .with_table(|table| table.remove(&victim))?
                        .map_err(|err| Error::table("remove", err.to_string()))?;
                    self.tracker.on_evicted(&victim);
                    if removed {
                        self.stats.record_eviction();
                        tracing::debug!(victim = %String::from_utf8_lossy(&victim), "evicted");
                    }

                    outcome = self.with_table(|table| table.put(key, wire))?;
                }
            }
        }
    }
}
