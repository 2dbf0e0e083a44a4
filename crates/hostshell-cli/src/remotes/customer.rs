use hostshell_core::error::Result;
use hostshell_core::remote::{RemoteComponent, SharedStateHandle};

use super::{render_feed, theme_label};

pub struct CustomerDashboardShell;

impl RemoteComponent for CustomerDashboardShell {
    fn name(&self) -> &str {
        "CustomerDashboardShell"
    }

    fn render(&self, shared: &dyn SharedStateHandle) -> Result<String> {
        Ok(format!(
            "Customer App\n\
             Your orders: 3 open, 1 awaiting delivery\n\
             Theme: {}\n\
             Notifications:\n{}",
            theme_label(shared),
            render_feed(shared)
        ))
    }
}
