//! Store Tests
//!
//! Tests verify:
//! - Flat table get/set
//! - Hash table operations and independence from the flat table
//! - Lazy expiration and TTL reporting
//! - Both EXPIRE policies for missing keys
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use emberkv::config::ExpirePolicy;
use emberkv::store::{Keyspace, Store};

fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

// =============================================================================
// Flat Table Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = Store::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert_eq!(store.hash_len(), 0);
}

#[test]
fn test_set_and_get() {
    let store = Store::new();
    store.set(b("foo"), b("bar"));
    assert_eq!(store.get(b"foo"), Some(b("bar")));
}

#[test]
fn test_get_missing_key() {
    let store = Store::new();
    assert_eq!(store.get(b"missing"), None);
}

#[test]
fn test_set_overwrites() {
    let store = Store::new();
    store.set(b("k"), b("v1"));
    store.set(b("k"), b("v2"));
    assert_eq!(store.get(b"k"), Some(b("v2")));
    assert_eq!(store.len(), 1);
}

// =============================================================================
// Hash Table Tests
// =============================================================================

#[test]
fn test_hset_and_hget() {
    let store = Store::new();
    store.hset(b("h"), b("f1"), b("v1"));
    assert_eq!(store.hget(b"h", b"f1"), Some(b("v1")));
    assert_eq!(store.hash_len(), 1);
}

#[test]
fn test_hget_missing_field_and_key() {
    let store = Store::new();
    store.hset(b("h"), b("f1"), b("v1"));
    assert_eq!(store.hget(b"h", b"f2"), None);
    assert_eq!(store.hget(b"other", b"f1"), None);
}

#[test]
fn test_hset_does_not_touch_other_fields_or_flat_table() {
    let store = Store::new();
    store.set(b("a"), b("flat"));
    store.hset(b("a"), b("f2"), b("v2"));
    store.hset(b("a"), b("f1"), b("v1"));

    assert_eq!(store.hget(b"a", b"f2"), Some(b("v2")));
    assert_eq!(store.get(b"a"), Some(b("flat")));
}

#[test]
fn test_hgetall_returns_all_pairs() {
    let store = Store::new();
    store.hset(b("h"), b("f1"), b("v1"));
    store.hset(b("h"), b("f2"), b("v2"));

    let mut pairs = store.hgetall(b"h").unwrap();
    pairs.sort();
    assert_eq!(pairs, vec![(b("f1"), b("v1")), (b("f2"), b("v2"))]);
}

#[test]
fn test_hgetall_missing_key() {
    let store = Store::new();
    assert_eq!(store.hgetall(b"nope"), None);
}

// =============================================================================
// Expiration Tests
// =============================================================================

#[test]
fn test_ttl_without_expire_is_absent() {
    let store = Store::new();
    store.set(b("k"), b("v"));
    assert_eq!(store.ttl(b"k"), None);
    assert_eq!(store.ttl(b"missing"), None);
}

#[test]
fn test_expire_zero_hides_key() {
    let store = Store::new();
    store.set(b("x"), b("1"));
    assert!(store.expire(b("x"), 0));

    thread::sleep(Duration::from_millis(5));
    assert_eq!(store.get(b"x"), None);
    assert_eq!(store.ttl(b"x"), None);
    assert_eq!(store.len(), 0);
}

#[test]
fn test_expire_negative_hides_key() {
    let store = Store::new();
    store.set(b("x"), b("1"));
    store.expire(b("x"), -10);
    assert_eq!(store.get(b"x"), None);
}

#[test]
fn test_expire_preserves_value_and_reports_ttl() {
    let store = Store::new();
    store.set(b("k"), b("v"));
    assert!(store.expire(b("k"), 100));

    assert_eq!(store.get(b"k"), Some(b("v")));
    let left = store.ttl(b"k").unwrap();
    assert!(left <= Duration::from_secs(100));
    assert!(left > Duration::from_secs(98));
}

#[test]
fn test_set_after_expire_clears_deadline() {
    let store = Store::new();
    store.set(b("k"), b("v"));
    store.expire(b("k"), 0);
    store.set(b("k"), b("again"));

    thread::sleep(Duration::from_millis(5));
    assert_eq!(store.get(b"k"), Some(b("again")));
    assert_eq!(store.ttl(b"k"), None);
}

#[test]
fn test_expire_missing_key_materializes_by_default() {
    let store = Store::new();
    assert!(store.expire(b("ghost"), 60));

    assert_eq!(store.get(b"ghost"), Some(Bytes::new()));
    assert!(store.ttl(b"ghost").is_some());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_expire_missing_key_ignored_under_policy() {
    let store = Store::with_expire_policy(ExpirePolicy::IgnoreMissing);
    assert!(!store.expire(b("ghost"), 60));

    assert_eq!(store.get(b"ghost"), None);
    assert_eq!(store.ttl(b"ghost"), None);
    assert_eq!(store.len(), 0);
}

#[test]
fn test_expire_on_expired_key_counts_as_missing() {
    let store = Store::with_expire_policy(ExpirePolicy::IgnoreMissing);
    store.set(b("k"), b("v"));
    store.expire(b("k"), -1);
    assert!(!store.expire(b("k"), 60));
    assert_eq!(store.get(b"k"), None);
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_skips_expired_entries() {
    let store = Store::new();
    store.set(b("live"), b("1"));
    store.set(b("dead"), b("2"));
    store.expire(b("dead"), -1);
    store.hset(b("h"), b("f"), b("v"));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.strings.len(), 1);
    assert_eq!(snapshot.strings.get(&b("live")), Some(&b("1")));
    assert_eq!(snapshot.hashes[&b("h")][&b("f")], b("v"));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let store = Arc::new(Store::new());
    let mut handles = Vec::new();

    for t in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..250 {
                let key = Bytes::from(format!("k{}-{}", t, i));
                store.set(key.clone(), Bytes::from(format!("v{}", i)));
                store.hset(Bytes::from(format!("h{}", t)), key.clone(), b("x"));
                assert!(store.get(&key).is_some());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 1000);
    assert_eq!(store.hash_len(), 4);
    assert_eq!(store.hgetall(b"h0").unwrap().len(), 250);
}
