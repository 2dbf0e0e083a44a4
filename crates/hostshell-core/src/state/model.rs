//! Shared state domain models.
//!
//! Contains the state the host shares with mounted remotes and the snapshot
//! shape that persists across restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::HostError;
use crate::session::Session;

/// Colour scheme of the host and the mounted remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(NotificationKind::Info),
            "success" => Ok(NotificationKind::Success),
            "warning" | "warn" => Ok(NotificationKind::Warning),
            "error" => Ok(NotificationKind::Error),
            other => Err(HostError::config(format!(
                "unknown notification kind '{}'",
                other
            ))),
        }
    }
}

/// One entry of the shared notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique for the lifetime of the store, even within one millisecond.
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

/// The exact subset of shared state written to durable storage.
///
/// Always taken from one state value, so a snapshot never mixes the session
/// of one moment with the theme of another.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub session: Option<Session>,
    pub theme: Theme,
    /// Newest first.
    pub notifications: Vec<Notification>,
}

impl PersistedSnapshot {
    pub fn to_blob(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a stored blob.
    ///
    /// Returns `Err` only when the blob is not JSON at all. A JSON document of
    /// the wrong shape still yields a snapshot: each field is adopted on its
    /// own and falls back to its default when missing or invalid.
    pub fn from_blob(blob: &str) -> crate::error::Result<Self> {
        let value: Value = serde_json::from_str(blob)?;
        Ok(Self::from_value_lenient(&value))
    }

    /// Field-by-field adoption of a JSON value.
    ///
    /// - `session`: adopted if it deserializes into a `Session`, else none
    /// - `theme`: adopted if `"light"` or `"dark"`, else light
    /// - `notifications`: entries that deserialize are kept in order; a
    ///   non-array value yields an empty list
    pub fn from_value_lenient(value: &Value) -> Self {
        let session = value
            .get("session")
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value::<Session>(v.clone()).ok());

        let theme = value
            .get("theme")
            .and_then(|v| serde_json::from_value::<Theme>(v.clone()).ok())
            .unwrap_or_default();

        let notifications = match value.get("notifications") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<Notification>(entry.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };

        Self {
            session,
            theme,
            notifications,
        }
    }
}
