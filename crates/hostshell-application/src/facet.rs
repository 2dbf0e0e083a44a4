//! Restricted view of the store handed to mounted remotes.

use std::sync::Arc;

use hostshell_core::config::CapabilitySet;
use hostshell_core::error::{HostError, Result};
use hostshell_core::remote::SharedStateHandle;
use hostshell_core::state::{Notification, NotificationKind, Theme};

use crate::store::SharedStateStore;

/// Capability handle over a `SharedStateStore`.
///
/// Remotes only ever see this through `&dyn SharedStateHandle`; session
/// operations are not reachable from it.
#[derive(Clone)]
pub struct StoreFacet {
    store: Arc<SharedStateStore>,
    capabilities: CapabilitySet,
}

impl StoreFacet {
    pub(crate) fn new(store: Arc<SharedStateStore>, capabilities: CapabilitySet) -> Self {
        Self {
            store,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }
}

impl SharedStateHandle for StoreFacet {
    fn notifications(&self) -> Vec<Notification> {
        self.store.notifications()
    }

    fn add_notification(&self, message: &str, kind: NotificationKind) -> String {
        self.store.add_notification(message, kind)
    }

    fn dismiss_notification(&self, id: &str) {
        self.store.dismiss_notification(id);
    }

    fn clear_notifications(&self) {
        self.store.clear_notifications();
    }

    fn theme(&self) -> Result<Theme> {
        if !self.capabilities.shares_theme() {
            return Err(HostError::CapabilityNotGranted("theme"));
        }
        Ok(self.store.theme())
    }

    fn toggle_theme(&self) -> Result<()> {
        if !self.capabilities.shares_theme() {
            return Err(HostError::CapabilityNotGranted("toggle_theme"));
        }
        self.store.toggle_theme();
        Ok(())
    }
}
