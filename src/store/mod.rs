//! Store Module
//!
//! In-memory keyspace: a flat table of strings and a nested table of hashes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Independent shared/exclusive locks for the two tables
//! - Optional per-key expiration, checked lazily on read
//!
//! ## Data Structure Choice
//! Two `HashMap`s, each wrapped in its own `parking_lot::RwLock`:
//! - No ordering requirement (HGETALL is unordered)
//! - A flat-table operation never waits on hash activity and vice versa
//! - No background sweeper: expired entries stay in memory until overwritten

mod entry;
mod table;

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;

pub use entry::Entry;
pub use table::Store;

/// The mutation and lookup surface command handlers run against
///
/// All operations are total. Dispatch validates argument shapes before any
/// of these are called.
pub trait Keyspace: Send + Sync {
    /// Value of `key` if present and not expired
    fn get(&self, key: &[u8]) -> Option<Bytes>;

    /// Insert or replace `key`, clearing any expiration
    fn set(&self, key: Bytes, value: Bytes);

    /// Value of `field` inside hash `key` if present and not expired
    fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes>;

    /// Set `field` inside hash `key`, creating the hash if needed
    fn hset(&self, key: Bytes, field: Bytes, value: Bytes);

    /// All live `(field, value)` pairs of hash `key`, in no particular order
    fn hgetall(&self, key: &[u8]) -> Option<Vec<(Bytes, Bytes)>>;

    /// Expire `key` after `seconds` (zero or negative expires it at once)
    ///
    /// Returns whether an expiration was recorded.
    fn expire(&self, key: Bytes, seconds: i64) -> bool;

    /// Remaining lifetime of `key`, if it has an expiration and is still live
    fn ttl(&self, key: &[u8]) -> Option<Duration>;
}

/// Point-in-time copy of every live value, used to compare keyspaces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub strings: HashMap<Bytes, Bytes>,
    pub hashes: HashMap<Bytes, HashMap<Bytes, Bytes>>,
}
