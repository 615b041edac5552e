//! Authoritative `key -> expiry` lookup.
//!
//! The index answers "does this key have a TTL and when does it fire". It is
//! never mutated on its own: the [`Database`](super::Database) always pairs
//! each change with the matching [`ExpiryList`](super::ExpiryList) change
//! under one lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Longest TTL a key may carry (100 years).
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A pending deadline for a key.
///
/// The record refers to its value by name only; the value itself lives in the
/// [`DataStore`](super::DataStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlRecord {
    pub key: String,
    pub expiry: Instant,
}

impl TtlRecord {
    pub fn new(key: impl Into<String>, expiry: Instant) -> Self {
        Self {
            key: key.into(),
            expiry,
        }
    }

    /// Creates a record that fires `ttl` from now.
    ///
    /// Returns `None` if `ttl` exceeds [`MAX_TTL`] or the deadline cannot be
    /// represented as an `Instant`.
    pub fn expiring_in(key: impl Into<String>, ttl: Duration) -> Option<Self> {
        if ttl > MAX_TTL {
            return None;
        }
        let expiry = Instant::now().checked_add(ttl)?;
        Some(Self::new(key, expiry))
    }

    /// Time left before the record fires, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.expiry.saturating_duration_since(Instant::now())
    }

    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expiry <= now
    }
}

#[derive(Debug, Default)]
pub struct TtlIndex {
    records: HashMap<String, TtlRecord>,
}

impl TtlIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record for its key, returning the record it replaced.
    pub fn set(&mut self, record: TtlRecord) -> Option<TtlRecord> {
        self.records.insert(record.key.clone(), record)
    }

    pub fn get(&self, key: &str) -> Option<&TtlRecord> {
        self.records.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<TtlRecord> {
        self.records.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
