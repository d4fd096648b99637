//! Store implementation
//!
//! HashMap-based tables, each behind its own RwLock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::ExpirePolicy;
use super::entry::deadline_after;
use super::{Entry, Keyspace, Snapshot};

type FlatTable = HashMap<Bytes, Entry>;
type NestedTable = HashMap<Bytes, HashMap<Bytes, Entry>>;

/// In-memory keyspace
///
/// ## Concurrency:
/// - `strings`: RwLock (many concurrent readers, exclusive writer)
/// - `hashes`: separate RwLock, never held together with `strings`
/// - All methods use `&self`
pub struct Store {
    /// Flat table: key -> entry
    strings: RwLock<FlatTable>,

    /// Nested table: key -> field -> entry
    hashes: RwLock<NestedTable>,

    /// What EXPIRE does for keys that do not exist
    expire_policy: ExpirePolicy,
}

impl Store {
    /// Create an empty store with the default EXPIRE policy
    pub fn new() -> Self {
        Self::with_expire_policy(ExpirePolicy::Materialize)
    }

    /// Create an empty store with the given EXPIRE policy
    pub fn with_expire_policy(expire_policy: ExpirePolicy) -> Self {
        Self {
            strings: RwLock::new(HashMap::new()),
            hashes: RwLock::new(HashMap::new()),
            expire_policy,
        }
    }

    /// Number of live string keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.strings
            .read()
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    /// Whether there are no live string keys and no hashes
    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.hash_len() == 0
    }

    /// Number of hash keys
    pub fn hash_len(&self) -> usize {
        self.hashes.read().len()
    }

    /// Copy every live value out of both tables
    pub fn snapshot(&self) -> Snapshot {
        let now = Instant::now();

        let strings = self
            .strings
            .read()
            .iter()
            .filter_map(|(k, entry)| entry.live_value(now).map(|v| (k.clone(), v.clone())))
            .collect();

        let hashes = self
            .hashes
            .read()
            .iter()
            .map(|(k, fields)| {
                let fields = fields
                    .iter()
                    .filter_map(|(f, entry)| entry.live_value(now).map(|v| (f.clone(), v.clone())))
                    .collect();
                (k.clone(), fields)
            })
            .collect();

        Snapshot { strings, hashes }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyspace for Store {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        // Clone out so the read lock is released before the expiry check
        let entry = self.strings.read().get(key).cloned()?;
        entry.live_value(Instant::now()).cloned()
    }

    fn set(&self, key: Bytes, value: Bytes) {
        self.strings.write().insert(key, Entry::new(value));
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes> {
        let entry = self
            .hashes
            .read()
            .get(key)
            .and_then(|fields| fields.get(field))
            .cloned()?;
        entry.live_value(Instant::now()).cloned()
    }

    fn hset(&self, key: Bytes, field: Bytes, value: Bytes) {
        self.hashes
            .write()
            .entry(key)
            .or_default()
            .insert(field, Entry::new(value));
    }

    fn hgetall(&self, key: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        let fields = self.hashes.read().get(key).cloned()?;
        let now = Instant::now();
        Some(
            fields
                .into_iter()
                .filter_map(|(f, entry)| entry.live_value(now).cloned().map(|v| (f, v)))
                .collect(),
        )
    }

    fn expire(&self, key: Bytes, seconds: i64) -> bool {
        let now = Instant::now();
        let deadline = deadline_after(now, seconds);
        let mut strings = self.strings.write();

        match strings.get_mut(&key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.set_deadline(deadline);
                true
            }
            _ => match self.expire_policy {
                ExpirePolicy::Materialize => {
                    strings.insert(key, Entry::expiring(Bytes::new(), deadline));
                    true
                }
                ExpirePolicy::IgnoreMissing => {
                    strings.remove(&key);
                    false
                }
            },
        }
    }

    fn ttl(&self, key: &[u8]) -> Option<Duration> {
        let entry = self.strings.read().get(key).cloned()?;
        entry.remaining_at(Instant::now())
    }
}
