pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod state;

// Re-export common error type
pub use error::{HostError, Result};
