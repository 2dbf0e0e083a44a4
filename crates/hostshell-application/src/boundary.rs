//! Rendering-error containment for mounted remotes.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use hostshell_core::error::{HostError, Result};
use hostshell_core::remote::{RemoteComponent, SharedStateHandle};

pub const CRASH_TITLE: &str = "Something went wrong";
pub const CRASH_DETAIL: &str = "An unexpected error occurred while rendering this page.";
pub const CRASH_ACTION: &str = "Try again";

/// Renders `component`, turning both returned errors and panics into
/// `HostError::Render`.
pub fn render_contained(
    component: &dyn RemoteComponent,
    shared: &dyn SharedStateHandle,
) -> Result<String> {
    match catch_unwind(AssertUnwindSafe(|| component.render(shared))) {
        Ok(Ok(content)) => Ok(content),
        Ok(Err(HostError::Render(message))) => Err(HostError::Render(message)),
        Ok(Err(e)) => Err(HostError::render(e.to_string())),
        Err(payload) => Err(HostError::render(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "remote panicked while rendering".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostshell_core::state::{Notification, NotificationKind, Theme};

    struct NullHandle;

    impl SharedStateHandle for NullHandle {
        fn notifications(&self) -> Vec<Notification> {
            Vec::new()
        }
        fn add_notification(&self, _message: &str, _kind: NotificationKind) -> String {
            String::new()
        }
        fn dismiss_notification(&self, _id: &str) {}
        fn clear_notifications(&self) {}
        fn theme(&self) -> Result<Theme> {
            Ok(Theme::Light)
        }
        fn toggle_theme(&self) -> Result<()> {
            Ok(())
        }
    }

    enum Outcome {
        Fine,
        Errors,
        Panics,
    }

    struct Scripted(Outcome);

    impl RemoteComponent for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }
        fn render(&self, _shared: &dyn SharedStateHandle) -> Result<String> {
            match self.0 {
                Outcome::Fine => Ok("<dashboard>".to_string()),
                Outcome::Errors => Err(HostError::internal("widget missing")),
                Outcome::Panics => panic!("index out of bounds"),
            }
        }
    }

    #[test]
    fn test_success_passes_through() {
        let content = render_contained(&Scripted(Outcome::Fine), &NullHandle).unwrap();
        assert_eq!(content, "<dashboard>");
    }

    #[test]
    fn test_error_becomes_render_error() {
        let err = render_contained(&Scripted(Outcome::Errors), &NullHandle).unwrap_err();
        match err {
            HostError::Render(message) => assert!(message.contains("widget missing")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_panic_is_contained() {
        let err = render_contained(&Scripted(Outcome::Panics), &NullHandle).unwrap_err();
        assert!(matches!(err, HostError::Render(ref m) if m == "index out of bounds"));
    }
}
