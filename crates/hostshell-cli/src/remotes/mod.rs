//! Built-in dashboard remotes.
//!
//! Stand-ins for the separately deployed customer and admin apps. They only
//! talk to the host through `SharedStateHandle`.

mod admin;
mod customer;

use std::sync::Arc;

use hostshell_core::remote::{REMOTES, RemoteComponent, SharedStateHandle};
use hostshell_core::session::Role;
use hostshell_infrastructure::RemoteRegistry;

pub use admin::AdminDashboardShell;
pub use customer::CustomerDashboardShell;

/// Registry exposing both dashboards under their descriptor ids.
pub fn registry() -> RemoteRegistry {
    let mut registry = RemoteRegistry::new();
    for descriptor in REMOTES {
        let component: Arc<dyn RemoteComponent> = match descriptor.role {
            Role::Customer => Arc::new(CustomerDashboardShell),
            Role::Admin => Arc::new(AdminDashboardShell),
        };
        registry.register(descriptor.dashboard_id(), component);
    }
    registry
}

/// Notification list shared by both dashboards.
fn render_feed(shared: &dyn SharedStateHandle) -> String {
    let notifications = shared.notifications();
    if notifications.is_empty() {
        return "  (no notifications)".to_string();
    }
    notifications
        .iter()
        .map(|n| format!("  [{}] {}  ({})", n.kind, n.message, n.id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn theme_label(shared: &dyn SharedStateHandle) -> String {
    shared
        .theme()
        .map(|theme| theme.to_string())
        .unwrap_or_else(|_| "not shared".to_string())
}
