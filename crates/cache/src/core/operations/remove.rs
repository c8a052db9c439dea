//! Guarded removal.

use crate::core::types::SharedCache;
use crate::table::SlotTable;
use shmkv_core::{Error, Result};

impl<T: SlotTable> SharedCache<T> {
    /// Remove `key`. Deleting an already-absent key is not an error.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.ensure_init()?;
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }

        let removed = self
            .with_table(|table| table.remove(key))?
            .map_err(|err| Error::table("remove", err.to_string()))?;

        // The tracker must not hand a deleted key out as a victim later
        self.tracker.on_evicted(key);
        if removed {
            self.stats.record_delete();
        }
        Ok(())
    }
}
