//! Key/value map with shared/exclusive access.
//!
//! The `DataStore` is the source of truth for values. It knows nothing about
//! TTLs; the [`Database`](super::Database) layers expiry on top of it.
//!
//! Reads (`get`, `keys`, `snapshot`) take the shared lock, writes take the
//! exclusive lock. Everything returned is an owned copy, never a live view.

use crate::storage::entry::Entry;
use crate::storage::error::{StorageError, StorageResult};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Thread-safe `String -> Entry` map.
#[derive(Debug, Default)]
pub struct DataStore {
    data: RwLock<HashMap<String, Entry>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, overwriting any previous entry.
    ///
    /// Always succeeds and always assigns a fresh id and write time.
    pub fn put(&self, key: impl Into<String>, value: Bytes) -> Entry {
        let entry = Entry::new(value);
        self.data.write().insert(key.into(), entry.clone());
        entry
    }

    /// Gets the entry for a key.
    pub fn get(&self, key: &str) -> StorageResult<Entry> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
    }

    /// Deletes a key.
    pub fn delete(&self, key: &str) -> StorageResult<()> {
        match self.data.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::KeyNotFound(key.to_string())),
        }
    }

    /// Removes every key in `keys` under one exclusive lock.
    ///
    /// Keys that are already gone are skipped. Returns how many were removed.
    pub fn remove_many<'a, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut data = self.data.write();
        keys.into_iter()
            .filter(|key| data.remove(*key).is_some())
            .count()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Returns a snapshot of all keys.
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Returns a snapshot of every key with its value.
    pub fn snapshot(&self) -> HashMap<String, Bytes> {
        self.data
            .read()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Looks up the values of `keys` under a single shared lock.
    ///
    /// Keys without a value are left out.
    pub fn values_of<'a, I>(&self, keys: I) -> Vec<(String, Bytes)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let data = self.data.read();
        keys.into_iter()
            .filter_map(|key| {
                data.get(key)
                    .map(|entry| (key.to_string(), entry.value.clone()))
            })
            .collect()
    }

    /// Removes every entry.
    pub fn drop_all(&self) {
        self.data.write().clear();
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}
