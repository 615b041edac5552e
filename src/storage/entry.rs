//! Stored values and their metadata.

use bytes::Bytes;
use std::time::SystemTime;
use uuid::Uuid;

/// Represents a stored value together with its identity and write time.
///
/// Every `put` produces a fresh `Entry`, even when it overwrites an existing
/// key, so two writes of the same bytes are still distinguishable by `id`.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Unique identity of this write
    pub id: Uuid,
    /// The actual value stored (opaque to the store)
    pub value: Bytes,
    /// When this entry was written
    pub write_time: SystemTime,
}

impl Entry {
    /// Creates a new entry stamped with a random id and the current time.
    pub fn new(value: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            value,
            write_time: SystemTime::now(),
        }
    }
}
