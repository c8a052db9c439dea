//! Guarded read operations.

use crate::codec;
use crate::core::types::SharedCache;
use crate::table::SlotTable;
use shmkv_core::{Error, Result};

impl<T: SlotTable> SharedCache<T> {
    /// Fetch and verify the value stored under `key`.
    ///
    /// A record that fails verification is reported as `DataCorrupt`
    /// and left in place; whether to delete it is the caller's call.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.ensure_init()?;
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }

        let Some(wire) = self.with_table(|table| table.get(key))? else {
            self.stats.record_miss();
            return Err(Error::NotFound);
        };

        // Verification happens outside the guard
        match codec::decode(&wire) {
            Ok(value) => {
                self.stats.record_hit();
                Ok(value)
            }
            Err(err) => {
                self.stats.record_corruption();
                Err(err)
            }
        }
    }

    /// Membership probe. Does not copy or verify the stored record.
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.ensure_init()?;
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }
        self.with_table(|table| table.exists(key))
    }
}
