//! Guarded write path.

use crate::codec;
use crate::core::types::SharedCache;
use crate::table::SlotTable;
use shmkv_core::{Error, Result};

impl<T: SlotTable> SharedCache<T> {
    /// Store `value` under `key`, evicting old records on overflow when
    /// eviction is enabled.
    ///
    /// Writing the exact value a key already holds short-circuits to
    /// `SetSameValue` without touching the table or the tracker. Only a
    /// record that still verifies short-circuits; a corrupted record
    /// can always be overwritten.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_init()?;
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }

        if let Some(wire) = self.with_table(|table| table.get(key))? {
            if codec::decode(&wire).is_ok_and(|current| current == value) {
                return Err(Error::SetSameValue);
            }
        }

        // Encode outside the guard
        let wire = codec::encode(value);
        self.store(key, &wire)?;
        self.tracker.on_access(key);
        self.stats.record_write();
        Ok(())
    }
}
