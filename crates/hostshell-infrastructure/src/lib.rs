pub mod config_service;
pub mod fallback;
pub mod paths;
pub mod runtime;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::fallback::{OfflineFallbackPlugin, RemoteOfflineFallback};
pub use crate::paths::HostPaths;
pub use crate::runtime::{HttpRuntime, RemoteRegistry, StaticRuntime};
pub use crate::storage::{JsonFileStorage, MemoryStorage, UnavailableStorage};
