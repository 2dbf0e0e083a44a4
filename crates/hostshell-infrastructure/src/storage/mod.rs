//! Storage layer for the persisted shared state blob.

mod adapters;
mod atomic_json;

pub use adapters::{JsonFileStorage, MemoryStorage, UnavailableStorage};
pub use atomic_json::AtomicJsonFile;
