//! Directory of named databases.
//!
//! The catalog is shared by every client session. It hands out
//! `Arc<Database>` handles, creating databases the first time a name is used.
//! Its own lock only covers the name map; it is never held while a database
//! does any work of its own.

use crate::storage::database::Database;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::reclaimer::ReclaimerConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct Catalog {
    databases: RwLock<HashMap<String, Arc<Database>>>,
    /// Reclaimer settings for every database this catalog creates
    config: ReclaimerConfig,
}

impl Catalog {
    pub fn new(config: ReclaimerConfig) -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns the database called `name`, creating it if needed.
    ///
    /// The flag is `true` when this call created the database. Creation and
    /// insertion happen under one exclusive lock, so concurrent callers with
    /// the same name all receive the same database.
    ///
    /// Must be called from within a Tokio runtime (new databases spawn their
    /// reclaimer).
    pub fn use_or_create(&self, name: &str) -> (Arc<Database>, bool) {
        if let Some(db) = self.databases.read().get(name) {
            return (Arc::clone(db), false);
        }

        let mut databases = self.databases.write();
        if let Some(db) = databases.get(name) {
            return (Arc::clone(db), false);
        }

        let db = Database::open(name, self.config.clone());
        databases.insert(name.to_string(), Arc::clone(&db));
        info!(database = %name, "Database created");
        (db, true)
    }

    pub fn get(&self, name: &str) -> StorageResult<Arc<Database>> {
        self.databases
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::DatabaseNotFound(name.to_string()))
    }

    /// Lists database names in alphabetical order.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<_> = self.databases.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drops a database and removes it from the directory.
    ///
    /// Sessions still holding the database keep a valid (empty) handle, but
    /// its reclaimer has stopped and it can no longer be looked up by name.
    pub fn drop_database(&self, name: &str) -> StorageResult<()> {
        let mut databases = self.databases.write();
        let db = databases
            .remove(name)
            .ok_or_else(|| StorageError::DatabaseNotFound(name.to_string()))?;
        db.destroy();
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.databases.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.databases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.read().is_empty()
    }

    /// Drops every database. Called once at process shutdown.
    pub fn shutdown(&self) {
        let databases: Vec<_> = self.databases.write().drain().collect();
        for (_, db) in &databases {
            db.destroy();
        }
        info!(count = databases.len(), "Catalog shut down");
    }
}
