//! Entry definitions

use std::time::{Duration, Instant};

use bytes::Bytes;

/// Upper bound applied to relative expirations (100 years)
const MAX_EXPIRE_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// A stored value plus an optional absolute expiration instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    /// Entry that never expires
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Entry that expires at `deadline`
    pub fn expiring(value: Bytes, deadline: Instant) -> Self {
        Self {
            value,
            expires_at: Some(deadline),
        }
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Replace the expiration, keeping the value
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.expires_at = Some(deadline);
    }

    /// An entry is logically gone once `now` reaches its deadline
    pub fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }

    /// Time left before expiry, `None` when there is no deadline or it passed
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .and_then(|deadline| deadline.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    /// Value if still live at `now`
    pub fn live_value(&self, now: Instant) -> Option<&Bytes> {
        if self.is_expired_at(now) {
            None
        } else {
            Some(&self.value)
        }
    }
}

/// Absolute deadline for a relative expiration in seconds
///
/// Negative values produce a deadline that has already passed.
pub fn deadline_after(now: Instant, seconds: i64) -> Instant {
    let span = Duration::from_secs(seconds.unsigned_abs().min(MAX_EXPIRE_SECS));
    if seconds >= 0 {
        now.checked_add(span).unwrap_or(now)
    } else {
        now.checked_sub(span).unwrap_or(now)
    }
}
