//! Concurrent cache layer over a fixed-capacity shared-memory table.
//!
//! Many reader/writer processes share one in-memory table without a
//! server process. Each process maps the segment, binds the table
//! primitive to it, and wraps every call in a process-wide guard.
//! Stored values carry a self-describing, integrity-checked encoding,
//! so corruption is always surfaced and never returned as data; writes
//! that overflow the table evict least-recently-used records until they
//! fit, or report exhaustion.
//!
//! The table primitive itself (hashing, collision resolution, physical
//! slot layout) is external. Implement [`SlotTable`] over it (and
//! [`SegmentTable`] to bind it to mapped segments) and hand the handle
//! to [`SharedCache`].

pub mod codec;
pub mod core;
pub mod segment;
pub mod table;
pub mod testing;
pub mod tracker;

pub use crate::core::{Entries, Eviction, SharedCache, StatsSnapshot};
pub use crate::segment::{SegmentBlock, SegmentId};
pub use crate::table::{
    PutError, SegmentTable, SlotCursor, SlotRecord, SlotTable, TableOpError, TableStats,
};
pub use crate::tracker::{LruTracker, RecencyTracker};
pub use shmkv_core::{Error, Result};
