use hostshell_core::error::Result;
use hostshell_core::remote::{RemoteComponent, SharedStateHandle};
use hostshell_core::state::NotificationKind;

use super::{render_feed, theme_label};

pub struct AdminDashboardShell;

impl RemoteComponent for AdminDashboardShell {
    fn name(&self) -> &str {
        "AdminDashboardShell"
    }

    fn render(&self, shared: &dyn SharedStateHandle) -> Result<String> {
        let notifications = shared.notifications();
        Ok(format!(
            "Admin App\n\
             Active users: 128 | Pending reviews: 4 | Open alerts: {}\n\
             Theme: {}\n\
             Notifications:\n{}",
            notifications
                .iter()
                .filter(|n| n.kind == NotificationKind::Error)
                .count(),
            theme_label(shared),
            render_feed(shared)
        ))
    }
}
