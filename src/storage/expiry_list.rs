//! Pending TTL deadlines, earliest first.
//!
//! ## Layout
//!
//! ```text
//!   order:     BTreeSet<(expiry, key)>    ascending, walked by the reclaimer
//!   positions: HashMap<key, expiry>       locates a key's slot in `order`
//! ```
//!
//! Records are addressed by their `(expiry, key)` pair rather than by links
//! between nodes. A key occupies at most one slot. Two records with the same
//! expiry are ordered by key.
//!
//! ## Costs
//!
//! | Operation      | Cost                          |
//! |----------------|-------------------------------|
//! | `insert`       | O(log n)                      |
//! | `remove`       | O(log n)                      |
//! | `take_expired` | O(k log n) for k expired keys |
//!
//! The list is not synchronized. The owning database keeps it behind the same
//! lock as the [`TtlIndex`](super::TtlIndex).

use crate::storage::ttl_index::TtlRecord;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct ExpiryList {
    order: BTreeSet<(Instant, String)>,
    positions: HashMap<String, Instant>,
}

impl ExpiryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record at its sorted position.
    ///
    /// If the key is already tracked, its previous slot is released first.
    pub fn insert(&mut self, record: TtlRecord) {
        if let Some(previous) = self.positions.insert(record.key.clone(), record.expiry) {
            self.order.remove(&(previous, record.key.clone()));
        }
        self.order.insert((record.expiry, record.key));
        debug_assert_eq!(self.order.len(), self.positions.len());
    }

    /// Removes the record for `key`. Removing an untracked key is a no-op.
    ///
    /// Returns whether a record was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.positions.remove_entry(key) {
            Some((key, expiry)) => {
                let removed = self.order.remove(&(expiry, key));
                debug_assert!(removed, "expiry list slot missing for tracked key");
                true
            }
            None => false,
        }
    }

    /// Detaches every record whose expiry is at or before `now`.
    ///
    /// Records come back in ascending expiry order. The list is left rooted at
    /// the first record that is still live.
    pub fn take_expired(&mut self, now: Instant) -> Vec<TtlRecord> {
        let mut expired = Vec::new();

        while self
            .order
            .first()
            .is_some_and(|(expiry, _)| *expiry <= now)
        {
            if let Some((expiry, key)) = self.order.pop_first() {
                self.positions.remove(&key);
                expired.push(TtlRecord { key, expiry });
            }
        }

        debug_assert_eq!(self.order.len(), self.positions.len());
        expired
    }

    /// The record that fires next.
    pub fn peek(&self) -> Option<TtlRecord> {
        self.order
            .first()
            .map(|(expiry, key)| TtlRecord::new(key.clone(), *expiry))
    }

    /// Walks the records from the earliest expiry to the latest.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Instant)> + '_ {
        self.order.iter().map(|(expiry, key)| (key.as_str(), *expiry))
    }

    pub fn expiry_of(&self, key: &str) -> Option<Instant> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
