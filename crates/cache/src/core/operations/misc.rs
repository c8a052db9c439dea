//! Occupancy reporting and bulk clearing.

use crate::core::types::SharedCache;
use crate::table::{SlotTable, TableStats};
use shmkv_core::Result;

impl<T: SlotTable> SharedCache<T> {
    /// Capacity and occupancy of the underlying table.
    pub fn size(&self) -> Result<TableStats> {
        self.ensure_init()?;
        self.with_table(|table| table.stats())
    }

    /// Remove every record. Also resets the recency tracker, which
    /// holds no useful ordering over an empty table.
    pub fn clear(&self) -> Result<()> {
        self.ensure_init()?;
        self.with_table(|table| table.clear())?;
        self.tracker.clear();
        Ok(())
    }
}
