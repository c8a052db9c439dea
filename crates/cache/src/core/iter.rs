//! Lazy, restartable iteration over stored records.

use crate::codec;
use crate::core::types::SharedCache;
use crate::table::{SlotCursor, SlotTable};
use shmkv_core::{Error, Result};

impl<T: SlotTable> SharedCache<T> {
    /// Advance `cursor` to the next record and return its decoded pair.
    ///
    /// Each step guards a single primitive call, so other processes may
    /// mutate the table between steps; iteration offers no snapshot
    /// isolation. `Ok(None)` is the end of the table. A record that
    /// fails verification is `DataCorrupt` with the cursor already
    /// advanced, so the caller may skip it and continue; a slot that
    /// could not be read at all is a `Table` error, distinct from both.
    pub fn next_entry(&self, cursor: &mut SlotCursor) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.ensure_init()?;
        let record = self
            .with_table(|table| table.next_slot(cursor))?
            .map_err(|err| Error::table("scan", err.to_string()))?;
        let Some(record) = record else {
            return Ok(None);
        };
        let value = codec::decode(&record.value)?;
        Ok(Some((record.key, value)))
    }

    /// Iterator over all stored records, decoding as it goes. Corrupt
    /// slots surface as `Err` items and the iterator continues past
    /// them.
    #[must_use]
    pub fn entries(&self) -> Entries<'_, T> {
        Entries {
            cache: self,
            cursor: SlotCursor::default(),
            done: false,
        }
    }
}

/// See [`SharedCache::entries`].
pub struct Entries<'a, T: SlotTable> {
    cache: &'a SharedCache<T>,
    cursor: SlotCursor,
    done: bool,
}

impl<T: SlotTable> Iterator for Entries<'_, T> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cache.next_entry(&mut self.cursor) {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                // A torn-down cache can only keep erroring; stop there
                if matches!(err, Error::NotInitialized) {
                    self.done = true;
                }
                Some(Err(err))
            }
        }
    }
}
