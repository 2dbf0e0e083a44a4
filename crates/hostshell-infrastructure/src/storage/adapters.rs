//! `PersistenceAdapter` implementations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hostshell_core::error::{HostError, Result};
use hostshell_core::state::{GLOBAL_STATE_KEY, PersistenceAdapter};

use super::atomic_json::AtomicJsonFile;

/// Stores the snapshot blob as `<dir>/<key>.json`.
pub struct JsonFileStorage {
    file: AtomicJsonFile,
}

impl JsonFileStorage {
    /// Creates a storage rooted at `dir`, using the fixed global state key.
    pub fn new(dir: &Path) -> Self {
        Self::with_key(dir, GLOBAL_STATE_KEY)
    }

    pub fn with_key(dir: &Path, key: &str) -> Self {
        Self {
            file: AtomicJsonFile::new(dir.join(format!("{}.json", key))),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}

impl PersistenceAdapter for JsonFileStorage {
    fn load(&self) -> Result<Option<String>> {
        self.file.load()
    }

    fn save(&self, blob: &str) -> Result<()> {
        self.file.save(blob)
    }

    fn clear(&self) -> Result<()> {
        self.file.remove()
    }

    fn describe(&self) -> String {
        format!("file:{}", self.file.path().display())
    }
}

/// In-process key-value storage.
///
/// Shared between store instances through an `Arc` to simulate a restart
/// with the medium intact.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that already holds `blob` under the global key.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(GLOBAL_STATE_KEY.to_string(), blob.into());
        }
        storage
    }

    /// The raw stored blob, if any.
    pub fn raw(&self) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(GLOBAL_STATE_KEY).cloned())
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| HostError::storage(format!("memory storage poisoned: {}", e)))
    }
}

impl PersistenceAdapter for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.entries()?.get(GLOBAL_STATE_KEY).cloned())
    }

    fn save(&self, blob: &str) -> Result<()> {
        self.entries()?
            .insert(GLOBAL_STATE_KEY.to_string(), blob.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries()?.remove(GLOBAL_STATE_KEY);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Stand-in for a durable medium that does not exist.
///
/// Loads are always absent and writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl PersistenceAdapter for UnavailableStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn save(&self, _blob: &str) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "unavailable".to_string()
    }
}
