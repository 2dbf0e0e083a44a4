//! Persistence adapter trait.

use crate::error::Result;

/// Fixed key under which the shared state snapshot is stored.
pub const GLOBAL_STATE_KEY: &str = "hostshell.global-state";

/// Durable read/write of one serialized blob under one fixed key.
///
/// Implementations must be callable when the durable medium does not exist:
/// in that case `load` reports `Ok(None)` and `save`/`clear` do nothing.
/// The store treats any `Err` from `load` the same as an absent blob.
pub trait PersistenceAdapter: Send + Sync {
    /// Returns the raw blob, or `None` if nothing is stored.
    fn load(&self) -> Result<Option<String>>;

    /// Replaces the stored blob.
    fn save(&self, blob: &str) -> Result<()>;

    /// Removes the stored blob.
    fn clear(&self) -> Result<()>;

    /// Short label for logs ("file", "memory", "unavailable").
    fn describe(&self) -> String;
}
