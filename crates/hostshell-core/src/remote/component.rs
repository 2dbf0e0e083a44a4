//! The contract between the host and a mounted remote.

use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::Result;
use crate::remote::model::RemoteId;
use crate::state::{Notification, NotificationKind, Theme};

/// Capability handle passed to a mounted remote.
///
/// Exposes the notification feed and its three mutators, plus the theme when
/// the host is configured to share it. Remotes never see the store itself.
pub trait SharedStateHandle: Send + Sync {
    /// Current notifications, newest first.
    fn notifications(&self) -> Vec<Notification>;

    /// Adds a notification and returns its id.
    fn add_notification(&self, message: &str, kind: NotificationKind) -> String;

    /// Removes the notification with `id`; unknown ids are ignored.
    fn dismiss_notification(&self, id: &str);

    fn clear_notifications(&self);

    /// Current theme, or `CapabilityNotGranted` when theme is not shared.
    fn theme(&self) -> Result<Theme>;

    /// Flips the theme, or `CapabilityNotGranted` when theme is not shared.
    fn toggle_theme(&self) -> Result<()>;
}

/// A renderable entry component exposed by a remote.
pub trait RemoteComponent: Send + Sync {
    fn name(&self) -> &str;

    /// Renders the component against the shared state handle.
    fn render(&self, shared: &dyn SharedStateHandle) -> Result<String>;

    /// Page-level initial data. Defaults to an empty object.
    fn initial_props(&self) -> Value {
        json!({})
    }

    /// Server-side page data in the `{ "props": ... }` envelope.
    fn server_props(&self) -> Value {
        json!({ "props": {} })
    }
}

/// A loaded remote module: the id it was loaded for and its default export.
#[derive(Clone)]
pub struct RemoteModule {
    pub id: RemoteId,
    pub component: Arc<dyn RemoteComponent>,
}

impl RemoteModule {
    pub fn new(id: RemoteId, component: Arc<dyn RemoteComponent>) -> Self {
        Self { id, component }
    }
}

impl std::fmt::Debug for RemoteModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteModule")
            .field("id", &self.id)
            .field("component", &self.component.name())
            .finish()
    }
}
