//! Storage Engine Module
//!
//! This module provides the core storage functionality for TideKV: named
//! databases holding key-value pairs with per-key TTLs, and a background
//! reclaimer per database.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Catalog                             │
//! │              RwLock<HashMap<name, Arc<Database>>>           │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//! ┌──────────────────────────────┐   ┌──────────────────────────┐
//! │ Database "x"                 │   │ Database "y"             │
//! │  DataStore  (key -> Entry)   │   │  ...                     │
//! │  TtlIndex   (key -> expiry)  │   │                          │
//! │  ExpiryList (expiry order)   │   │                          │
//! └──────────────▲───────────────┘   └────────────▲─────────────┘
//!                │                                │
//!        ┌───────┴────────┐               ┌───────┴────────┐
//!        │   Reclaimer    │               │   Reclaimer    │
//!        │ (Tokio task)   │               │ (Tokio task)   │
//!        └────────────────┘               └────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Per-database locks**: no lock is shared between databases
//! - **Consistent TTLs**: the TTL index and expiry list change together
//! - **Active expiry**: expired keys lose their value and their TTL
//! - **Clean teardown**: dropping a database stops its reclaimer
//!
//! ## Example
//!
//! ```
//! use tidekv::storage::{Catalog, ReclaimerConfig};
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let catalog = Catalog::new(ReclaimerConfig::default());
//!
//! let (db, created) = catalog.use_or_create("app");
//! assert!(created);
//!
//! db.put("name", Bytes::from("Ada"));
//! assert_eq!(db.get("name").unwrap(), Bytes::from("Ada"));
//!
//! db.set_ttl("name", Duration::from_secs(3600)).unwrap();
//! assert_eq!(db.list_with_ttl().len(), 1);
//! # }
//! ```

pub mod catalog;
pub mod data_store;
pub mod database;
pub mod entry;
pub mod error;
pub mod expiry_list;
pub mod reclaimer;
pub mod ttl_index;

// Re-export commonly used types
pub use catalog::Catalog;
pub use data_store::DataStore;
pub use database::Database;
pub use entry::Entry;
pub use error::{StorageError, StorageResult};
pub use expiry_list::ExpiryList;
pub use reclaimer::{Reclaimer, ReclaimerConfig};
pub use ttl_index::{TtlIndex, TtlRecord, MAX_TTL};
