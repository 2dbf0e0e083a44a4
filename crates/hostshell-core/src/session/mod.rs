//! Session domain module.
//!
//! - `model`: `Role` and the demo `Session` derived from it

mod model;

pub use model::{Role, Session};
