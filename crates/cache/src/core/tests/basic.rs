//! Basic cache operation tests.

use crate::codec;
use crate::core::{Eviction, SharedCache};
use crate::testing::FixtureTable;
use shmkv_core::Error;

fn fresh_cache(slots: usize, eviction: Eviction) -> (FixtureTable, SharedCache<FixtureTable>) {
    let table = FixtureTable::with_slots(slots);
    let cache = SharedCache::create_with(table.clone(), eviction);
    (table, cache)
}

#[test]
fn set_then_get_round_trips() {
    let (_table, cache) = fresh_cache(8, Eviction::Disabled);

    cache.set(b"key1", b"value1").unwrap();
    assert_eq!(cache.get(b"key1").unwrap(), b"value1".to_vec());
    assert!(cache.exists(b"key1").unwrap());

    assert!(matches!(cache.get(b"key2"), Err(Error::NotFound)));
    assert!(!cache.exists(b"key2").unwrap());
}

#[test]
fn empty_keys_are_rejected() {
    let (_table, cache) = fresh_cache(8, Eviction::Disabled);

    assert!(matches!(cache.get(b""), Err(Error::InvalidKey)));
    assert!(matches!(cache.set(b"", b"v"), Err(Error::InvalidKey)));
    assert!(matches!(cache.delete(b""), Err(Error::InvalidKey)));
    assert!(matches!(cache.exists(b""), Err(Error::InvalidKey)));
}

#[test]
fn delete_is_idempotent() {
    let (_table, cache) = fresh_cache(8, Eviction::Disabled);

    cache.set(b"key", b"value").unwrap();
    cache.delete(b"key").unwrap();
    assert!(matches!(cache.get(b"key"), Err(Error::NotFound)));

    // Absent both times, Ok both times
    cache.delete(b"key").unwrap();
    cache.delete(b"never-stored").unwrap();
}

#[test]
fn identical_value_set_short_circuits() {
    let (table, cache) = fresh_cache(8, Eviction::Disabled);

    cache.set(b"key", b"value").unwrap();
    let stored = table.raw_record(b"key").unwrap();

    assert!(matches!(
        cache.set(b"key", b"value"),
        Err(Error::SetSameValue)
    ));
    assert_eq!(table.raw_record(b"key").unwrap(), stored);

    // A different value still writes
    cache.set(b"key", b"other").unwrap();
    assert_eq!(cache.get(b"key").unwrap(), b"other".to_vec());
}

#[test]
fn records_are_stored_in_wire_form() {
    let (table, cache) = fresh_cache(8, Eviction::Disabled);

    cache.set(b"key", b"plain").unwrap();
    let stored = table.raw_record(b"key").unwrap();
    assert_ne!(stored, b"plain".to_vec());
    assert_eq!(codec::decode(&stored).unwrap(), b"plain".to_vec());
}

#[test]
fn size_reports_capacity_and_occupancy() {
    let (_table, cache) = fresh_cache(4, Eviction::Disabled);

    let stats = cache.size().unwrap();
    assert_eq!(stats.max_slots, 4);
    assert_eq!(stats.used_keys, 0);

    cache.set(b"a", b"1").unwrap();
    cache.set(b"b", b"2").unwrap();
    let stats = cache.size().unwrap();
    assert_eq!(stats.used_keys, 2);
    assert_eq!(stats.used_slots, 2);

    cache.delete(b"a").unwrap();
    assert_eq!(cache.size().unwrap().used_keys, 1);
}

#[test]
fn clear_empties_table_and_tracker() {
    let (_table, cache) = fresh_cache(4, Eviction::Enabled);

    cache.set(b"a", b"1").unwrap();
    cache.set(b"b", b"2").unwrap();
    assert_eq!(cache.tracker.len(), 2);

    cache.clear().unwrap();
    assert_eq!(cache.size().unwrap().used_keys, 0);
    assert!(matches!(cache.get(b"a"), Err(Error::NotFound)));
    assert_eq!(cache.tracker.len(), 0);
}

#[test]
fn operations_after_close_report_not_initialized() {
    let (_table, cache) = fresh_cache(4, Eviction::Disabled);
    cache.set(b"key", b"value").unwrap();

    assert!(cache.is_initialized());
    cache.close();
    assert!(!cache.is_initialized());

    assert!(matches!(cache.get(b"key"), Err(Error::NotInitialized)));
    assert!(matches!(
        cache.set(b"key", b"value"),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(cache.delete(b"key"), Err(Error::NotInitialized)));
    assert!(matches!(cache.exists(b"key"), Err(Error::NotInitialized)));
    assert!(matches!(cache.size(), Err(Error::NotInitialized)));
    assert!(matches!(cache.clear(), Err(Error::NotInitialized)));
}

#[test]
fn corruption_is_surfaced_and_left_in_place() {
    let (table, cache) = fresh_cache(4, Eviction::Disabled);

    cache.set(b"key", b"value").unwrap();
    assert!(table.corrupt_record(b"key"));

    assert!(matches!(cache.get(b"key"), Err(Error::DataCorrupt { .. })));
    // The record is not deleted behind the caller's back
    assert!(cache.exists(b"key").unwrap());
    assert!(matches!(cache.get(b"key"), Err(Error::DataCorrupt { .. })));
    assert_eq!(cache.stats().corruptions, 2);
}

#[test]
fn corrupt_record_can_be_overwritten() {
    let (table, cache) = fresh_cache(4, Eviction::Disabled);

    cache.set(b"key", b"value").unwrap();
    table.corrupt_record(b"key");

    // No identical-value short-circuit against a corrupt record
    cache.set(b"key", b"value").unwrap();
    assert_eq!(cache.get(b"key").unwrap(), b"value".to_vec());
}

#[test]
fn counters_track_operations() {
    let (_table, cache) = fresh_cache(4, Eviction::Disabled);

    cache.set(b"a", b"1").unwrap();
    let _ = cache.get(b"a").unwrap();
    let _ = cache.get(b"missing");
    cache.delete(b"a").unwrap();

    let stats = cache.stats();
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.deletes, 1);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn store_failures_surface_as_store_failed() {
    let (table, cache) = fresh_cache(4, Eviction::Disabled);

    table.inject_put_failure("segment fault");
    match cache.set(b"key", b"value") {
        Err(Error::StoreFailed { reason }) => assert_eq!(reason, "segment fault"),
        other => panic!("expected StoreFailed, got {other:?}"),
    }
}

#[test]
fn delete_failures_surface_as_table_errors() {
    let (table, cache) = fresh_cache(4, Eviction::Disabled);

    cache.set(b"key", b"value").unwrap();
    table.inject_remove_failure("slot header mangled");
    assert!(matches!(
        cache.delete(b"key"),
        Err(Error::Table {
            operation: "remove",
            ..
        })
    ));
}
