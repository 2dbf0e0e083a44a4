//! Error types for the hostshell workspace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire host shell.
///
/// Every failure the core can produce is one of these variants. Most of them
/// are recovered locally (a corrupt blob, an unreachable remote), so callers
/// mostly see them in logs rather than in return values.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum HostError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Persistence medium error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote's entry bundle could not be obtained
    #[error("Remote '{id}' failed to load: {reason}")]
    RemoteLoad { id: String, reason: String },

    /// A mounted remote failed while rendering
    #[error("Render error: {0}")]
    Render(String),

    /// The capability handle given to a remote does not expose this operation
    #[error("Capability not granted: {0}")]
    CapabilityNotGranted(&'static str),

    /// The store was used outside of its lifecycle
    #[error("Lifecycle violation: {0}")]
    Lifecycle(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HostError {
    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a RemoteLoad error
    pub fn remote_load(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteLoad {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Render error
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Creates a Lifecycle error
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a remote loading error
    pub fn is_remote_load(&self) -> bool {
        matches!(self, Self::RemoteLoad { .. })
    }

    /// Check if this is a lifecycle violation
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_))
    }

    /// The reason carried by a remote loading error, if any.
    ///
    /// Used by the offline fallback to surface the underlying failure
    /// without the "Remote 'x' failed to load" prefix.
    pub fn load_reason(&self) -> Option<&str> {
        match self {
            Self::RemoteLoad { reason, .. } if !reason.is_empty() => Some(reason),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for HostError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for HostError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        let id = err
            .url()
            .map(|url| url.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let reason = if err.is_timeout() {
            "network timeout".to_string()
        } else if let Some(status) = err.status() {
            format!("HTTP {}", status)
        } else {
            err.to_string()
        };
        Self::RemoteLoad { id, reason }
    }
}

/// A type alias for `Result<T, HostError>`.
pub type Result<T> = std::result::Result<T, HostError>;
