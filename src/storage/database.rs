//! A single named database: values, TTLs and the reclaimer that expires them.
//!
//! ## Locking
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         Database                           │
//! │                                                            │
//! │   ttl: RwLock<TtlTable>            data: DataStore         │
//! │   ┌──────────┐ ┌────────────┐      ┌──────────────────┐    │
//! │   │ TtlIndex │ │ ExpiryList │      │ RwLock<HashMap>  │    │
//! │   └──────────┘ └────────────┘      └──────────────────┘    │
//! │        (1) taken first                (2) taken second     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The TTL index and the expiry list share one lock, so nobody can see one of
//! them updated without the other. Any operation that needs both locks takes
//! the TTL lock first. The data lock is never held while waiting for the TTL
//! lock.
//!
//! ## Expiry
//!
//! An expired key loses both its TTL record and its value. The
//! [`Reclaimer`] does this every tick through [`Database::purge_expired`]
//! while holding the TTL lock, so a reader never sees a key that has left the
//! expiry list but still has a TTL record.

use crate::storage::data_store::DataStore;
use crate::storage::entry::Entry;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::expiry_list::ExpiryList;
use crate::storage::reclaimer::{Reclaimer, ReclaimerConfig};
use crate::storage::ttl_index::{TtlIndex, TtlRecord, MAX_TTL};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// TTL bookkeeping guarded as one unit.
#[derive(Debug, Default)]
struct TtlTable {
    index: TtlIndex,
    expiries: ExpiryList,
    /// Set once the database is destroyed; sweeps become no-ops
    dropped: bool,
}

impl TtlTable {
    fn set(&mut self, record: TtlRecord) {
        self.expiries.insert(record.clone());
        self.index.set(record);
        self.debug_check();
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.index.remove(key).is_some();
        let unlisted = self.expiries.remove(key);
        debug_assert_eq!(removed, unlisted, "ttl index and expiry list diverged");
        removed
    }

    fn take_expired(&mut self, now: Instant) -> Vec<TtlRecord> {
        let expired = self.expiries.take_expired(now);
        for record in &expired {
            let indexed = self.index.remove(&record.key);
            debug_assert!(indexed.is_some(), "expired key missing from ttl index");
        }
        self.debug_check();
        expired
    }

    fn clear(&mut self) {
        self.index.clear();
        self.expiries.clear();
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert_eq!(self.index.len(), self.expiries.len());
    }
}

/// A named key-value database with per-key TTLs.
///
/// Databases are shared as `Arc<Database>` between the catalog, client
/// sessions and the reclaimer. All methods take `&self`.
///
/// # Example
///
/// ```
/// use tidekv::storage::{Database, ReclaimerConfig};
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let db = Database::open("sessions", ReclaimerConfig::default());
///
/// db.put("token", Bytes::from("abc123"));
/// db.set_ttl("token", Duration::from_secs(60)).unwrap();
///
/// assert_eq!(db.get("token").unwrap(), Bytes::from("abc123"));
/// assert!(db.get_ttl("token").unwrap() <= Duration::from_secs(60));
/// # }
/// ```
#[derive(Debug)]
pub struct Database {
    name: String,
    data: DataStore,
    ttl: RwLock<TtlTable>,
    reclaimer: Mutex<Option<Reclaimer>>,
}

impl Database {
    /// Creates an empty database and starts its reclaimer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(name: impl Into<String>, config: ReclaimerConfig) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|weak| {
            let reclaimer = Reclaimer::start(weak.clone(), &name, config);
            Self {
                name,
                data: DataStore::new(),
                ttl: RwLock::new(TtlTable::default()),
                reclaimer: Mutex::new(Some(reclaimer)),
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Stores a value, overwriting any existing one.
    ///
    /// An existing TTL on the key is kept.
    pub fn put(&self, key: impl Into<String>, value: Bytes) -> Entry {
        self.data.put(key, value)
    }

    pub fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.data.get(key).map(|entry| entry.value)
    }

    /// Gets the full entry for a key (including id and write time).
    pub fn get_entry(&self, key: &str) -> StorageResult<Entry> {
        self.data.get(key)
    }

    /// Deletes a key along with any TTL it carries.
    pub fn delete(&self, key: &str) -> StorageResult<()> {
        let mut ttl = self.ttl.write();
        ttl.remove(key);
        self.data.delete(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.keys()
    }

    pub fn get_all(&self) -> HashMap<String, Bytes> {
        self.data.snapshot()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // ========================================================================
    // TTLs
    // ========================================================================

    /// Attaches a TTL to an existing key, replacing any previous one.
    ///
    /// Fails with `KeyNotFound` and records nothing if the key has no value
    /// or the database has been destroyed, and with `TtlOutOfRange` if `ttl`
    /// exceeds [`MAX_TTL`].
    pub fn set_ttl(&self, key: &str, ttl: Duration) -> StorageResult<()> {
        let mut table = self.ttl.write();
        if table.dropped || !self.data.contains(key) {
            return Err(StorageError::KeyNotFound(key.to_string()));
        }
        table.set(record_for(key, ttl)?);
        Ok(())
    }

    /// Returns the time left before `key` expires.
    pub fn get_ttl(&self, key: &str) -> StorageResult<Duration> {
        self.ttl
            .read()
            .index
            .get(key)
            .map(TtlRecord::remaining)
            .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
    }

    /// Removes the TTL from `key`, leaving its value in place.
    ///
    /// Succeeds whether or not a TTL was set; returns whether one was removed.
    pub fn remove_ttl(&self, key: &str) -> bool {
        self.ttl.write().remove(key)
    }

    /// Moves an existing TTL to a new deadline.
    ///
    /// Fails with `KeyNotFound` if the key has no TTL to update, and with
    /// `TtlOutOfRange` if `ttl` exceeds [`MAX_TTL`].
    pub fn update_ttl(&self, key: &str, ttl: Duration) -> StorageResult<()> {
        let mut table = self.ttl.write();
        if !table.index.contains(key) {
            return Err(StorageError::KeyNotFound(key.to_string()));
        }
        table.set(record_for(key, ttl)?);
        Ok(())
    }

    /// Lists every key that has a TTL with its value, soonest expiry first.
    pub fn list_with_ttl(&self) -> Vec<(String, Bytes)> {
        let table = self.ttl.read();
        self.data.values_of(table.expiries.iter().map(|(key, _)| key))
    }

    /// Number of keys carrying a TTL.
    pub fn ttl_len(&self) -> usize {
        self.ttl.read().index.len()
    }

    /// Removes every key whose TTL has passed, value included.
    ///
    /// This is one reclaimer tick. Returns the number of keys reclaimed.
    pub fn purge_expired(&self) -> usize {
        let mut table = self.ttl.write();
        if table.dropped {
            return 0;
        }

        let expired = table.take_expired(Instant::now());
        if expired.is_empty() {
            return 0;
        }

        // Keys deleted explicitly since their TTL was set are simply skipped.
        self.data
            .remove_many(expired.iter().map(|record| record.key.as_str()));
        expired.len()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stops the reclaimer and clears every structure.
    ///
    /// Safe to call while other tasks are still using the database; their
    /// operations simply find nothing afterwards. A handle that outlives the
    /// drop may still store values, but TTL requests on it fail with
    /// `KeyNotFound`, so it never accumulates TTL records. Calling it twice is
    /// harmless.
    pub fn destroy(&self) {
        if let Some(reclaimer) = self.reclaimer.lock().take() {
            reclaimer.stop();
        }

        let mut table = self.ttl.write();
        table.dropped = true;
        table.clear();
        self.data.drop_all();
        drop(table);

        info!(database = %self.name, "Database dropped");
    }

    /// Destroys the database and waits for its reclaimer task to finish.
    pub async fn shutdown(&self) {
        let reclaimer = self.reclaimer.lock().take();
        self.destroy();
        if let Some(reclaimer) = reclaimer {
            reclaimer.join().await;
        }
    }

    pub fn is_dropped(&self) -> bool {
        self.ttl.read().dropped
    }

    /// Returns true while the reclaimer task is alive.
    pub fn is_reclaiming(&self) -> bool {
        self.reclaimer
            .lock()
            .as_ref()
            .is_some_and(Reclaimer::is_running)
    }
}

fn record_for(key: &str, ttl: Duration) -> StorageResult<TtlRecord> {
    TtlRecord::expiring_in(key, ttl).ok_or_else(|| StorageError::TtlOutOfRange {
        key: key.to_string(),
        max_secs: MAX_TTL.as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// A reclaimer that never fires during a test, so sweeps are explicit.
    fn idle() -> ReclaimerConfig {
        ReclaimerConfig {
            interval: Duration::from_secs(3600),
        }
    }

    fn fast() -> ReclaimerConfig {
        ReclaimerConfig {
            interval: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let db = Database::open("test", idle());

        for (k, v) in [("a", "1"), ("b", ""), ("key with spaces", "value")] {
            db.put(k, Bytes::from(v));
            assert_eq!(db.get(k).unwrap(), Bytes::from(v));
        }
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let db = Database::open("test", idle());
        db.put("k", Bytes::from("v"));

        assert!(db.delete("k").is_ok());
        assert_eq!(db.get("k"), Err(StorageError::KeyNotFound("k".into())));
        assert_eq!(db.delete("k"), Err(StorageError::KeyNotFound("k".into())));
    }

    #[tokio::test]
    async fn test_delete_drops_ttl() {
        let db = Database::open("test", idle());
        db.put("k", Bytes::from("v"));
        db.set_ttl("k", Duration::from_secs(10)).unwrap();

        db.delete("k").unwrap();

        assert!(db.get_ttl("k").is_err());
        assert_eq!(db.ttl_len(), 0);
        assert!(db.list_with_ttl().is_empty());
    }

    #[tokio::test]
    async fn test_list_with_ttl_is_ordered_by_expiry() {
        let db = Database::open("test", idle());
        for key in ["a", "b", "c"] {
            db.put(key, Bytes::from(key.to_uppercase()));
        }
        db.put("no_ttl", Bytes::from("x"));

        db.set_ttl("a", Duration::from_secs(5)).unwrap();
        db.set_ttl("b", Duration::from_secs(1)).unwrap();
        db.set_ttl("c", Duration::from_secs(3)).unwrap();

        let listed: Vec<_> = db.list_with_ttl().into_iter().map(|(k, _)| k).collect();
        assert_eq!(listed, vec!["b", "c", "a"]);
        assert_eq!(db.list_with_ttl()[0].1, Bytes::from("B"));
    }

    #[tokio::test]
    async fn test_set_ttl_requires_existing_key() {
        let db = Database::open("test", idle());

        assert_eq!(
            db.set_ttl("missing", Duration::from_secs(5)),
            Err(StorageError::KeyNotFound("missing".into()))
        );
        assert_eq!(db.ttl_len(), 0);
        assert!(db.list_with_ttl().is_empty());
        assert!(db.get_ttl("missing").is_err());
    }

    #[tokio::test]
    async fn test_set_ttl_twice_replaces() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));

        db.set_ttl("a", Duration::from_secs(100)).unwrap();
        db.set_ttl("a", Duration::from_secs(2)).unwrap();

        assert_eq!(db.ttl_len(), 1);
        assert!(db.get_ttl("a").unwrap() <= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_update_ttl_reorders() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));
        db.put("b", Bytes::from("2"));

        db.set_ttl("a", Duration::from_secs(10)).unwrap();
        db.set_ttl("b", Duration::from_secs(1)).unwrap();
        db.update_ttl("a", Duration::from_secs(1)).unwrap();

        assert_eq!(db.ttl_len(), 2);
        assert_eq!(db.list_with_ttl().len(), 2);
        for key in ["a", "b"] {
            let remaining = db.get_ttl(key).unwrap();
            assert!(remaining <= Duration::from_secs(1));
            assert!(remaining > Duration::from_millis(500));
        }
        // Both now expire together; nothing stale is left behind for `a`.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(db.purge_expired(), 2);
        assert_eq!(db.ttl_len(), 0);
        assert!(db.is_empty());
    }

    #[tokio::test]
    async fn test_update_ttl_without_ttl_fails() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));

        assert_eq!(
            db.update_ttl("a", Duration::from_secs(1)),
            Err(StorageError::KeyNotFound("a".into()))
        );
        assert_eq!(db.ttl_len(), 0);
    }

    #[tokio::test]
    async fn test_remove_ttl_is_idempotent() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));

        assert!(!db.remove_ttl("a"));
        assert!(!db.remove_ttl("never_existed"));
        assert_eq!(db.get("a").unwrap(), Bytes::from("1"));

        db.set_ttl("a", Duration::from_secs(5)).unwrap();
        assert!(db.remove_ttl("a"));
        assert!(db.get_ttl("a").is_err());
        assert_eq!(db.get("a").unwrap(), Bytes::from("1"));
    }

    #[tokio::test]
    async fn test_purge_expired_removes_value_and_ttl() {
        let db = Database::open("test", idle());
        db.put("short", Bytes::from("1"));
        db.put("long", Bytes::from("2"));
        db.set_ttl("short", Duration::from_millis(10)).unwrap();
        db.set_ttl("long", Duration::from_secs(60)).unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(db.purge_expired(), 1);
        assert!(db.get("short").is_err());
        assert!(db.get_ttl("short").is_err());
        assert!(db.get("long").is_ok());
        assert_eq!(db.ttl_len(), 1);
    }

    #[tokio::test]
    async fn test_purge_tolerates_deleted_values() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));
        db.set_ttl("a", Duration::from_millis(5)).unwrap();

        // Value vanishes behind the TTL's back.
        db.data.delete("a").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(db.purge_expired(), 1);
        assert_eq!(db.ttl_len(), 0);
    }

    #[tokio::test]
    async fn test_expiry_via_reclaimer() {
        let db = Database::open("test", ReclaimerConfig::default());
        db.put("a", Bytes::from("1"));
        db.set_ttl("a", Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(1600)).await;

        assert_eq!(db.get("a"), Err(StorageError::KeyNotFound("a".into())));
        assert_eq!(db.get_ttl("a"), Err(StorageError::KeyNotFound("a".into())));
    }

    #[tokio::test]
    async fn test_put_keeps_ttl() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));
        db.set_ttl("a", Duration::from_secs(30)).unwrap();

        db.put("a", Bytes::from("2"));

        assert!(db.get_ttl("a").is_ok());
        assert_eq!(db.get("a").unwrap(), Bytes::from("2"));
    }

    #[tokio::test]
    async fn test_get_all_and_keys() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));
        db.put("b", Bytes::from("2"));

        let all = db.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"], Bytes::from("1"));

        let mut keys = db.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_destroy_clears_and_stops_reclaimer() {
        let db = Database::open("test", fast());
        db.put("a", Bytes::from("1"));
        db.set_ttl("a", Duration::from_secs(60)).unwrap();
        assert!(db.is_reclaiming());

        db.destroy();

        assert!(db.is_dropped());
        assert!(!db.is_reclaiming());
        assert!(db.is_empty());
        assert_eq!(db.ttl_len(), 0);

        // Second destroy is harmless.
        db.destroy();
    }

    #[tokio::test]
    async fn test_no_reclaim_after_destroy() {
        let db = Database::open("test", fast());
        db.destroy();

        // A handle that outlives the drop takes no new TTLs and never sweeps.
        db.put("a", Bytes::from("1"));
        assert_eq!(
            db.set_ttl("a", Duration::from_millis(10)),
            Err(StorageError::KeyNotFound("a".into()))
        );
        assert_eq!(
            db.update_ttl("a", Duration::from_millis(10)),
            Err(StorageError::KeyNotFound("a".into()))
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(db.purge_expired(), 0);
        assert_eq!(db.ttl_len(), 0);
        assert!(db.list_with_ttl().is_empty());
    }

    #[tokio::test]
    async fn test_ttl_beyond_maximum_is_rejected() {
        let db = Database::open("test", idle());
        db.put("a", Bytes::from("1"));
        let too_long = Err(StorageError::TtlOutOfRange {
            key: "a".into(),
            max_secs: MAX_TTL.as_secs(),
        });

        assert_eq!(db.set_ttl("a", Duration::from_secs(u64::MAX)), too_long);
        assert_eq!(db.ttl_len(), 0);

        db.set_ttl("a", MAX_TTL).unwrap();
        assert_eq!(db.update_ttl("a", Duration::from_secs(u64::MAX)), too_long);
        assert!(db.get_ttl("a").unwrap() > MAX_TTL - Duration::from_secs(60));
        assert_eq!(db.ttl_len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_joins_reclaimer() {
        let db = Database::open("test", fast());
        db.put("a", Bytes::from("1"));

        db.shutdown().await;

        assert!(db.is_dropped());
        assert!(!db.is_reclaiming());
        assert!(db.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access() {
        let db = Database::open("test", fast());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in 0..1_000 {
                        let key = format!("key:{}:{}", t, i);
                        let value = Bytes::from(format!("value:{}:{}", t, i));
                        db.put(key.as_str(), value.clone());
                        assert_eq!(db.get(&key).unwrap(), value);
                        if i % 2 == 0 {
                            db.delete(&key).unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.len(), 8 * 500);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ttl_churn_keeps_structures_consistent() {
        let db = Database::open("test", fast());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("k:{}:{}", t, i % 50);
                        db.put(key.as_str(), Bytes::from("v"));
                        let _ = db.set_ttl(&key, Duration::from_millis((i % 5) as u64 * 10));
                        if i % 3 == 0 {
                            db.remove_ttl(&key);
                        }
                        if i % 7 == 0 {
                            let _ = db.update_ttl(&key, Duration::from_millis(5));
                        }
                        db.purge_expired();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let table = db.ttl.read();
        assert_eq!(table.index.len(), table.expiries.len());
        for (key, expiry) in table.expiries.iter() {
            assert_eq!(table.index.get(key).map(|r| r.expiry), Some(expiry));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_destroy_during_concurrent_requests() {
        use std::sync::Barrier;

        fn tolerated<T>(result: StorageResult<T>) {
            match result {
                Ok(_) | Err(StorageError::KeyNotFound(_)) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        let db = Database::open("test", fast());
        let start = Arc::new(Barrier::new(5));

        let workers: Vec<_> = (0..4)
            .map(|t| {
                let db = Arc::clone(&db);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    for i in 0..2_000 {
                        let key = format!("k:{}:{}", t, i % 100);
                        db.put(key.as_str(), Bytes::from("v"));
                        tolerated(db.set_ttl(&key, Duration::from_millis((i % 4) as u64 * 5)));
                        tolerated(db.get(&key));
                        tolerated(db.get_ttl(&key));
                        tolerated(db.update_ttl(&key, Duration::from_millis(5)));
                        if i % 5 == 0 {
                            tolerated(db.delete(&key));
                        }
                        db.list_with_ttl();
                        db.purge_expired();
                    }
                })
            })
            .collect();

        let dropper = {
            let db = Arc::clone(&db);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                thread::sleep(Duration::from_millis(2));
                db.destroy();
            })
        };

        dropper.join().unwrap();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(db.is_dropped());
        assert!(!db.is_reclaiming());
        assert_eq!(db.ttl_len(), 0);
        assert_eq!(db.purge_expired(), 0);

        let table = db.ttl.read();
        assert!(table.index.is_empty());
        assert!(table.expiries.is_empty());
    }
}
