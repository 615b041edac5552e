//! Errors surfaced by the storage core.
//!
//! These are expected, recoverable conditions. Callers get them as values and
//! turn them into replies; nothing in the core panics because a key or a
//! database is missing.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned by [`Database`](super::Database) and [`Catalog`](super::Catalog).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The key has no value (or, for TTL updates, no TTL record)
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// No database with this name exists in the catalog
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// The requested TTL is longer than the core can track
    #[error("TTL for '{key}' exceeds the maximum of {max_secs} seconds")]
    TtlOutOfRange { key: String, max_secs: u64 },
}
