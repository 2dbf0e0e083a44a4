//! Shared state domain module.
//!
//! - `model`: `Theme`, `Notification` and the `PersistedSnapshot` format
//! - `repository`: the `PersistenceAdapter` seam the store writes through

pub mod model;
pub mod repository;

pub use model::{Notification, NotificationKind, PersistedSnapshot, Theme};
pub use repository::{GLOBAL_STATE_KEY, PersistenceAdapter};
