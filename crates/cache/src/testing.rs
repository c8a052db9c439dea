//! Deterministic in-memory stand-ins for the table primitive.
//!
//! [`FixtureTable`] models a fixed-capacity slot table without touching
//! real shared memory. Records cost one slot per [`SLOT_UNIT`] bytes of
//! payload (minimum one), so a table "sized for N small records" holds
//! exactly N of them. State lives behind an `Arc`: cloned handles share
//! the same underlying storage, which is how tests model several
//! processes attached to one segment. A process-wide registry keyed by
//! segment path backs the [`SegmentTable`] binding for lifecycle tests.
//!
//! Failure injection covers the put, remove, and scan paths, plus
//! in-place corruption of stored bytes to simulate a torn write.

use crate::segment::SegmentBlock;
use crate::table::{
    PutError, SegmentTable, SlotCursor, SlotRecord, SlotTable, TableOpError, TableStats,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Payload bytes one slot holds; larger records span several slots.
pub const SLOT_UNIT: usize = 256;

fn record_cost(value_len: usize) -> usize {
    1 + value_len / SLOT_UNIT
}

#[derive(Debug, Clone)]
struct StoredRecord {
    key: Vec<u8>,
    value: Vec<u8>,
    cost: usize,
}

#[derive(Debug, Default)]
struct Injected {
    fail_put: Option<String>,
    fail_remove: Option<String>,
    fail_scan: bool,
}

#[derive(Debug)]
struct FixtureState {
    max_slots: usize,
    used_slots: usize,
    entries: Vec<Option<StoredRecord>>,
    injected: Injected,
}

impl FixtureState {
    fn new(max_slots: usize) -> Self {
        Self {
            max_slots,
            used_slots: 0,
            entries: vec![None; max_slots],
            injected: Injected::default(),
        }
    }

    fn find(&self, key: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|record| record.key == key))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), PutError> {
        if let Some(reason) = self.injected.fail_put.take() {
            return Err(PutError::Other(reason));
        }

        let cost = record_cost(value.len());
        let record = StoredRecord {
            key: key.to_vec(),
            value: value.to_vec(),
            cost,
        };

        if let Some(idx) = self.find(key) {
            let old_cost = self.entries[idx].as_ref().map_or(0, |r| r.cost);
            if self.used_slots - old_cost + cost > self.max_slots {
                // The old record stays; an overflowing write never
                // partially replaces anything.
                return Err(PutError::OutOfSlots);
            }
            self.used_slots = self.used_slots - old_cost + cost;
            self.entries[idx] = Some(record);
            return Ok(());
        }

        let Some(free) = self.entries.iter().position(Option::is_none) else {
            return Err(PutError::OutOfSlots);
        };
        if self.used_slots + cost > self.max_slots {
            return Err(PutError::OutOfSlots);
        }
        self.used_slots += cost;
        self.entries[free] = Some(record);
        Ok(())
    }
}

/// Shared-state table double. Clones share the same underlying storage,
/// the way two attached processes share one segment.
#[derive(Clone)]
pub struct FixtureTable {
    state: Arc<Mutex<FixtureState>>,
    _block: Option<Arc<SegmentBlock>>,
}

impl FixtureTable {
    /// A table with capacity for `max_slots` slots.
    #[must_use]
    pub fn with_slots(max_slots: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(FixtureState::new(max_slots))),
            _block: None,
        }
    }

    /// Make the next put fail with a non-overflow store error.
    pub fn inject_put_failure(&self, reason: &str) {
        self.state.lock().injected.fail_put = Some(reason.to_string());
    }

    /// Make the next remove fail.
    pub fn inject_remove_failure(&self, reason: &str) {
        self.state.lock().injected.fail_remove = Some(reason.to_string());
    }

    /// Make the next scanned record unreadable.
    pub fn inject_scan_failure(&self) {
        self.state.lock().injected.fail_scan = true;
    }

    /// Flip a byte inside the stored bytes for `key`, simulating a torn
    /// write. Returns false when the key is absent.
    pub fn corrupt_record(&self, key: &[u8]) -> bool {
        let mut state = self.state.lock();
        let Some(idx) = state.find(key) else {
            return false;
        };
        match state.entries[idx]
            .as_mut()
            .and_then(|record| record.value.last_mut())
        {
            Some(byte) => {
                *byte ^= 0xff;
                true
            }
            None => false,
        }
    }

    /// Raw stored bytes for `key`, exactly as the table holds them.
    #[must_use]
    pub fn raw_record(&self, key: &[u8]) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state
            .find(key)
            .and_then(|idx| state.entries[idx].as_ref().map(|r| r.value.clone()))
    }
}

impl SlotTable for FixtureTable {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let state = self.state.lock();
        state
            .find(key)
            .and_then(|idx| state.entries[idx].as_ref().map(|r| r.value.clone()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), PutError> {
        self.state.lock().put(key, value)
    }

    fn remove(&mut self, key: &[u8]) -> Result<bool, TableOpError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.injected.fail_remove.take() {
            return Err(TableOpError(reason));
        }
        match state.find(key) {
            Some(idx) => {
                let cost = state.entries[idx].as_ref().map_or(0, |r| r.cost);
                state.entries[idx] = None;
                state.used_slots -= cost;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn exists(&self, key: &[u8]) -> bool {
        self.state.lock().find(key).is_some()
    }

    fn stats(&self) -> TableStats {
        let state = self.state.lock();
        TableStats {
            max_slots: state.max_slots,
            used_slots: state.used_slots,
            used_keys: state.entries.iter().flatten().count(),
        }
    }

    fn next_slot(&self, cursor: &mut SlotCursor) -> Result<Option<SlotRecord>, TableOpError> {
        let mut state = self.state.lock();
        while cursor.slot < state.entries.len() {
            let idx = cursor.slot;
            cursor.slot += 1;
            if let Some(record) = state.entries[idx].clone() {
                if state.injected.fail_scan {
                    state.injected.fail_scan = false;
                    return Err(TableOpError(format!("slot {idx} unreadable")));
                }
                return Ok(Some(SlotRecord {
                    key: record.key,
                    value: record.value,
                }));
            }
        }
        Ok(None)
    }

    fn clear(&mut self) {
        let mut state = self.state.lock();
        let max = state.max_slots;
        state.entries = vec![None; max];
        state.used_slots = 0;
    }
}

fn registry() -> &'static Mutex<HashMap<PathBuf, Arc<Mutex<FixtureState>>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<FixtureState>>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

impl SegmentTable for FixtureTable {
    fn segment_bytes(capacity_hint: usize) -> usize {
        capacity_hint * SLOT_UNIT
    }

    fn create_or_size(block: SegmentBlock, capacity_bytes: usize) -> Option<Self> {
        let path = block.path().to_path_buf();
        if capacity_bytes > 0 {
            let slots = capacity_bytes / SLOT_UNIT;
            if slots == 0 {
                return None;
            }
            let state = Arc::new(Mutex::new(FixtureState::new(slots)));
            registry().lock().insert(path, Arc::clone(&state));
            Some(Self {
                state,
                _block: Some(Arc::new(block)),
            })
        } else {
            let state = registry().lock().get(&path).cloned()?;
            Some(Self {
                state,
                _block: Some(Arc::new(block)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_enforced_per_slot_cost() {
        let mut table = FixtureTable::with_slots(3);
        table.put(b"a", &[1u8; 10]).unwrap();
        table.put(b"b", &[2u8; 10]).unwrap();
        table.put(b"c", &[3u8; 10]).unwrap();
        assert!(matches!(
            table.put(b"d", &[4u8; 10]),
            Err(PutError::OutOfSlots)
        ));

        let stats = table.stats();
        assert_eq!(stats.max_slots, 3);
        assert_eq!(stats.used_slots, 3);
        assert_eq!(stats.used_keys, 3);
    }

    #[test]
    fn large_records_span_multiple_slots() {
        let mut table = FixtureTable::with_slots(3);
        // SLOT_UNIT + 1 bytes costs two slots
        table.put(b"big", &vec![0u8; SLOT_UNIT + 1]).unwrap();
        assert_eq!(table.stats().used_slots, 2);
        table.put(b"small", &[0u8; 4]).unwrap();
        assert!(matches!(
            table.put(b"extra", &[0u8; 4]),
            Err(PutError::OutOfSlots)
        ));
    }

    #[test]
    fn failed_replacement_keeps_the_old_record() {
        let mut table = FixtureTable::with_slots(2);
        table.put(b"k", &[9u8; 10]).unwrap();
        table.put(b"other", &[1u8; 10]).unwrap();
        // Replacing k with a record costing two slots cannot fit
        assert!(matches!(
            table.put(b"k", &vec![0u8; SLOT_UNIT + 1]),
            Err(PutError::OutOfSlots)
        ));
        assert_eq!(table.get(b"k").unwrap(), vec![9u8; 10]);
    }

    #[test]
    fn clones_share_storage() {
        let mut writer = FixtureTable::with_slots(4);
        let reader = writer.clone();
        writer.put(b"k", b"v").unwrap();
        assert_eq!(reader.get(b"k").unwrap(), b"v".to_vec());
    }

    #[test]
    fn scan_walks_records_in_slot_order() {
        let mut table = FixtureTable::with_slots(4);
        table.put(b"a", b"1").unwrap();
        table.put(b"b", b"2").unwrap();
        table.remove(b"a").unwrap();
        table.put(b"c", b"3").unwrap();

        let mut cursor = SlotCursor::default();
        let mut keys = Vec::new();
        while let Some(record) = table.next_slot(&mut cursor).unwrap() {
            keys.push(record.key);
        }
        // c reused a's freed slot
        assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn injected_failures_fire_once() {
        let mut table = FixtureTable::with_slots(4);
        table.inject_put_failure("wedged");
        assert!(matches!(table.put(b"k", b"v"), Err(PutError::Other(_))));
        table.put(b"k", b"v").unwrap();

        table.inject_remove_failure("wedged");
        assert!(table.remove(b"k").is_err());
        assert_eq!(table.remove(b"k").unwrap(), true);

        table.put(b"k", b"v").unwrap();
        table.inject_scan_failure();
        let mut cursor = SlotCursor::default();
        assert!(table.next_slot(&mut cursor).is_err());
        // Cursor moved past the bad slot; the scan can continue
        assert!(table.next_slot(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn corruption_flips_stored_bytes() {
        let mut table = FixtureTable::with_slots(4);
        table.put(b"k", b"value").unwrap();
        assert!(table.corrupt_record(b"k"));
        assert_ne!(table.get(b"k").unwrap(), b"value".to_vec());
        assert!(!table.corrupt_record(b"missing"));
    }
}
