//! Seams to the fixed-capacity slot-table primitive.
//!
//! The table that actually performs hashing, collision resolution and
//! physical segment layout is not implemented here. The cache consumes
//! it exclusively through [`SlotTable`], and binds it to a mapped
//! segment through [`SegmentTable`]. All failure modes travel in-band
//! through return values; there is no shared error state to poll after
//! a failed call.

use crate::segment::SegmentBlock;

/// Capacity and occupancy as reported by the table primitive.
///
/// `used_slots` counts physical slots (a large record spans several);
/// `used_keys` counts stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub max_slots: usize,
    pub used_slots: usize,
    pub used_keys: usize,
}

/// Why a put was rejected.
#[derive(Debug, thiserror::Error)]
pub enum PutError {
    /// No free slot family can hold this record. Recoverable by
    /// evicting other records.
    #[error("table is out of free slots")]
    OutOfSlots,
    /// Any other primitive failure. Not recoverable by eviction.
    #[error("{0}")]
    Other(String),
}

/// A primitive failure outside the put path.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TableOpError(pub String);

/// One stored key/value pair, copied out of its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Restartable position in a forward slot scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCursor {
    /// Index of the next slot to examine.
    pub slot: usize,
}

/// The table primitive's operation surface.
///
/// Implementations must be safe for concurrent access from other
/// processes at the primitive level; the cache only serializes calls
/// made through one handle.
pub trait SlotTable: Send {
    /// Fetch the raw stored bytes for `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous record.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), PutError>;

    /// Remove `key`. `Ok(true)` when a record was removed, `Ok(false)`
    /// when the key was already absent.
    fn remove(&mut self, key: &[u8]) -> Result<bool, TableOpError>;

    /// Membership probe without copying the value out.
    fn exists(&self, key: &[u8]) -> bool;

    /// Capacity and occupancy counters.
    fn stats(&self) -> TableStats;

    /// Yield the record at or after `cursor`, advancing the cursor past
    /// the examined slots. `Ok(None)` is end-of-table. `Err` is a slot
    /// that could not be read; the cursor is still advanced, so a
    /// caller may choose to continue past it.
    fn next_slot(&self, cursor: &mut SlotCursor) -> Result<Option<SlotRecord>, TableOpError>;

    /// Drop every record.
    fn clear(&mut self);
}

/// Binding between the table primitive and a mapped shared segment.
pub trait SegmentTable: SlotTable + Sized {
    /// Segment bytes required for a table sized to `capacity_hint` slots.
    fn segment_bytes(capacity_hint: usize) -> usize;

    /// Bind a table to `block`. A non-zero `capacity_bytes` lays a fresh
    /// table out across the block; zero opens the layout already
    /// present. `None` when the block cannot carry a table.
    fn create_or_size(block: SegmentBlock, capacity_bytes: usize) -> Option<Self>;
}
