//! Composition gateway.
//!
//! Gates the dashboard on the session, keeps the remote slot in line with
//! the session's role, and turns store + slot state into a `Surface`.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use hostshell_core::config::CapabilitySet;
use hostshell_core::error::HostError;
use hostshell_core::remote::{RemoteId, remote_for_role};
use hostshell_core::session::Role;
use hostshell_core::state::Theme;

use crate::boundary::{CRASH_ACTION, CRASH_DETAIL, CRASH_TITLE, render_contained};
use crate::resolver::{LoadingPlaceholder, RemoteResolver};
use crate::slot::{RemoteSlot, SlotState};
use crate::store::{SharedStateStore, StoreState};

/// Where the user is, as far as routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// The store has not hydrated yet.
    Unresolved,
    Unauthenticated,
    Authenticated(Role),
}

impl GatewayState {
    pub fn from_store(state: &StoreState) -> Self {
        if !state.is_hydrated {
            return GatewayState::Unresolved;
        }
        match &state.session {
            Some(session) => GatewayState::Authenticated(session.role),
            None => GatewayState::Unauthenticated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub role: Role,
    pub portal_label: &'static str,
    pub display_name: String,
    pub user_id: String,
    pub theme: Theme,
    pub notification_count: usize,
}

/// Dashboard body, derived from the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotView {
    Loading(LoadingPlaceholder),
    Mounted { remote: RemoteId, content: String },
    Unavailable {
        remote: RemoteId,
        message: String,
        reason: String,
    },
    Crashed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub header: HeaderView,
    pub body: SlotView,
}

/// What the host shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Splash,
    /// Unauthenticated users are sent here.
    Landing,
    Dashboard(DashboardView),
}

impl Surface {
    pub fn is_landing(&self) -> bool {
        matches!(self, Surface::Landing)
    }

    pub fn dashboard(&self) -> Option<&DashboardView> {
        match self {
            Surface::Dashboard(view) => Some(view),
            _ => None,
        }
    }
}

pub struct CompositionGateway {
    store: Arc<SharedStateStore>,
    slot: RemoteSlot,
    capabilities: CapabilitySet,
    /// Render failure of the currently mounted remote.
    crashed: Mutex<Option<String>>,
    /// Serializes read-state then mount/unmount across callers.
    reconciling: Mutex<()>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl CompositionGateway {
    pub fn new(
        store: Arc<SharedStateStore>,
        resolver: RemoteResolver,
        capabilities: CapabilitySet,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            slot: RemoteSlot::new(resolver),
            capabilities,
            crashed: Mutex::new(None),
            reconciling: Mutex::new(()),
            watcher: Mutex::new(None),
        })
    }

    pub fn store(&self) -> &Arc<SharedStateStore> {
        &self.store
    }

    pub fn slot(&self) -> &RemoteSlot {
        &self.slot
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn state(&self) -> GatewayState {
        GatewayState::from_store(&self.store.state())
    }

    /// Brings the slot in line with the store.
    ///
    /// Mounts the role's remote when authenticated and it is not already in
    /// the slot; tears the slot down otherwise.
    pub fn reconcile(&self) -> GatewayState {
        let _guard = self
            .reconciling
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = self.state();
        match state {
            GatewayState::Authenticated(role) => {
                let Some(target) = remote_for_role(role) else {
                    tracing::warn!("[Gateway] No remote mapped for role {}", role);
                    return state;
                };
                if self.slot.mounted_remote().as_ref() != Some(&target) {
                    self.set_crashed(None);
                    self.slot.mount(target);
                }
            }
            GatewayState::Unresolved | GatewayState::Unauthenticated => {
                if self.slot.mounted_remote().is_some() {
                    self.set_crashed(None);
                    self.slot.unmount();
                }
            }
        }
        tracing::debug!("[Gateway] Reconciled: {:?}", state);
        state
    }

    pub fn assume_role(&self, role: Role) -> GatewayState {
        tracing::info!("[Gateway] Assuming role {}", role);
        self.store.assume_role(role);
        self.reconcile()
    }

    /// Ends the session; the next render is the landing surface.
    pub fn logout(&self) -> GatewayState {
        tracing::info!("[Gateway] Logging out");
        self.store.end_session();
        self.reconcile()
    }

    /// Clears a render crash, or re-resolves a remote that failed to load.
    pub fn retry(&self) -> bool {
        if self.take_crashed().is_some() {
            tracing::info!("[Gateway] Retrying render after crash");
            return true;
        }
        if matches!(self.slot.state(), SlotState::Failed { .. }) {
            tracing::info!("[Gateway] Retrying failed remote");
            return self.slot.remount();
        }
        false
    }

    /// Resolves the mounted remote again, whatever its state.
    pub fn reload(&self) -> bool {
        self.set_crashed(None);
        self.slot.remount()
    }

    /// Waits for the slot to leave `Loading`.
    pub async fn wait_settled(&self) -> SlotState {
        self.slot.wait_settled().await
    }

    pub fn render(&self) -> Surface {
        let store_state = self.store.state();
        match GatewayState::from_store(&store_state) {
            GatewayState::Unresolved => Surface::Splash,
            GatewayState::Unauthenticated => Surface::Landing,
            GatewayState::Authenticated(role) => {
                let (display_name, user_id) = store_state
                    .session
                    .as_ref()
                    .map(|s| (s.display_name.clone(), s.id.clone()))
                    .unwrap_or_default();
                let header = HeaderView {
                    role,
                    portal_label: role.portal_label(),
                    display_name,
                    user_id,
                    theme: store_state.theme,
                    notification_count: store_state.notifications.len(),
                };
                Surface::Dashboard(DashboardView {
                    header,
                    body: self.render_body(role),
                })
            }
        }
    }

    fn render_body(&self, role: Role) -> SlotView {
        let Some(target) = remote_for_role(role) else {
            return SlotView::Crashed {
                message: format!("no remote is mapped for role {}", role),
            };
        };

        let slot = self.slot.state();
        if slot.remote() != Some(&target) {
            // Not reconciled to this role yet; the mount is imminent
            return SlotView::Loading(LoadingPlaceholder::new(target));
        }

        match slot {
            SlotState::Idle | SlotState::Loading { .. } => {
                SlotView::Loading(LoadingPlaceholder::new(target))
            }
            SlotState::Failed { remote, reason } => SlotView::Unavailable {
                message: format!(
                    "{} failed to load. Please ensure the remote server is running.",
                    remote.display_name()
                ),
                remote,
                reason,
            },
            SlotState::Ready { remote, module } => {
                if let Some(message) = self.crashed() {
                    return SlotView::Crashed { message };
                }
                let facet = self.store.facet(self.capabilities);
                match render_contained(module.component.as_ref(), &facet) {
                    Ok(content) => SlotView::Mounted { remote, content },
                    Err(e) => {
                        let message = match e {
                            HostError::Render(message) => message,
                            other => other.to_string(),
                        };
                        tracing::warn!("[Gateway] {} crashed while rendering: {}", remote, message);
                        self.set_crashed(Some(message.clone()));
                        SlotView::Crashed { message }
                    }
                }
            }
        }
    }

    /// Reconciles on every store change until shut down or dropped.
    pub fn watch(self: &Arc<Self>) {
        let mut rx = self.store.subscribe();
        let weak = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                rx.borrow_and_update();
                match weak.upgrade() {
                    Some(gateway) => {
                        gateway.reconcile();
                    }
                    None => break,
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!("[Gateway] Watcher stopped");
        });

        let previous = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stops the watcher and unmounts the slot. The store is left as is.
    pub fn shutdown(&self) {
        if let Some(watcher) = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            watcher.abort();
        }
        self.set_crashed(None);
        self.slot.unmount();
        tracing::info!("[Gateway] Shut down");
    }

    fn crashed(&self) -> Option<String> {
        self.crashed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take_crashed(&self) -> Option<String> {
        self.crashed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn set_crashed(&self, message: Option<String>) {
        *self.crashed.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }
}

impl fmt::Display for HeaderView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} ({}) | theme: {} | notifications: {} | Sign out",
            self.portal_label, self.display_name, self.user_id, self.theme, self.notification_count
        )
    }
}

impl fmt::Display for SlotView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotView::Loading(placeholder) => write!(f, "{}", placeholder),
            SlotView::Mounted { content, .. } => write!(f, "{}", content),
            SlotView::Unavailable { message, .. } => {
                write!(f, "Remote Unavailable\n{}", message)
            }
            SlotView::Crashed { message } => write!(
                f,
                "{}\n{}\n{}\n[{}]",
                CRASH_TITLE, CRASH_DETAIL, message, CRASH_ACTION
            ),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Splash => write!(f, "Loading..."),
            Surface::Landing => write!(
                f,
                "Welcome. Sign in as a customer or an admin to open your dashboard."
            ),
            Surface::Dashboard(view) => write!(f, "{}\n\n{}", view.header, view.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hostshell_core::error::Result;
    use hostshell_core::remote::{
        CompositionRuntime, RemoteComponent, RemoteModule, SharedStateHandle,
    };
    use hostshell_core::state::NotificationKind;
    use hostshell_infrastructure::MemoryStorage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Renders the caller's role scope and can be told to fail once.
    struct Probe {
        fail_next: AtomicBool,
    }

    impl RemoteComponent for Probe {
        fn name(&self) -> &str {
            "Probe"
        }
        fn render(&self, shared: &dyn SharedStateHandle) -> Result<String> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(HostError::render("probe failure"));
            }
            Ok(format!("probe sees {} notifications", shared.notifications().len()))
        }
    }

    struct CountingRuntime {
        loads: AtomicUsize,
        probe: Arc<Probe>,
        fail_scope: Option<&'static str>,
    }

    #[async_trait]
    impl CompositionRuntime for CountingRuntime {
        async fn load_remote(&self, id: &RemoteId) -> Result<RemoteModule> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_scope == Some(id.scope()) {
                return Err(HostError::remote_load(id.as_str(), "connection refused"));
            }
            Ok(RemoteModule::new(id.clone(), self.probe.clone()))
        }
    }

    struct Fixture {
        gateway: Arc<CompositionGateway>,
        runtime: Arc<CountingRuntime>,
        probe: Arc<Probe>,
    }

    async fn fixture(fail_scope: Option<&'static str>) -> Fixture {
        let store = SharedStateStore::create(Arc::new(MemoryStorage::new()));
        store.hydrate().await.unwrap();
        let probe = Arc::new(Probe {
            fail_next: AtomicBool::new(false),
        });
        let runtime = Arc::new(CountingRuntime {
            loads: AtomicUsize::new(0),
            probe: probe.clone(),
            fail_scope,
        });
        let gateway = CompositionGateway::new(
            store,
            RemoteResolver::new(runtime.clone()),
            CapabilitySet::NotificationsAndTheme,
        );
        Fixture {
            gateway,
            runtime,
            probe,
        }
    }

    #[tokio::test]
    async fn test_unresolved_renders_splash_and_does_not_resolve() {
        let store = SharedStateStore::create(Arc::new(MemoryStorage::new()));
        let runtime = Arc::new(CountingRuntime {
            loads: AtomicUsize::new(0),
            probe: Arc::new(Probe {
                fail_next: AtomicBool::new(false),
            }),
            fail_scope: None,
        });
        let gateway = CompositionGateway::new(
            store,
            RemoteResolver::new(runtime.clone()),
            CapabilitySet::default(),
        );

        assert_eq!(gateway.reconcile(), GatewayState::Unresolved);
        assert_eq!(gateway.render(), Surface::Splash);
        assert!(gateway.slot().state().is_idle());
        assert_eq!(runtime.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_lands_without_resolving() {
        let f = fixture(None).await;
        assert_eq!(f.gateway.reconcile(), GatewayState::Unauthenticated);
        assert!(f.gateway.render().is_landing());
        assert_eq!(f.runtime.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_customer_dashboard() {
        let f = fixture(None).await;
        f.gateway.assume_role(Role::Customer);
        f.gateway.wait_settled().await;

        let surface = f.gateway.render();
        let view = surface.dashboard().unwrap();
        assert_eq!(view.header.portal_label, "Customer Portal");
        assert_eq!(view.header.user_id, "cust-001");
        assert_eq!(view.header.display_name, "Jane Customer");
        assert_eq!(
            view.body,
            SlotView::Mounted {
                remote: RemoteId::new("remote1/DashboardShell"),
                content: "probe sees 0 notifications".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_reconcile_does_not_remount() {
        let f = fixture(None).await;
        f.gateway.assume_role(Role::Admin);
        f.gateway.wait_settled().await;
        f.gateway.reconcile();
        f.gateway.reconcile();
        assert_eq!(f.runtime.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reconciles_load_once() {
        let f = fixture(None).await;
        f.gateway.store().assume_role(Role::Customer);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let gateway = f.gateway.clone();
                tokio::spawn(async move { gateway.reconcile() })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), GatewayState::Authenticated(Role::Customer));
        }
        f.gateway.wait_settled().await;

        assert_eq!(f.runtime.loads.load(Ordering::SeqCst), 1);
        assert_eq!(
            f.gateway.slot().mounted_remote(),
            Some(RemoteId::new("remote1/DashboardShell"))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_watcher_and_logout_leave_slot_idle() {
        let f = fixture(None).await;
        f.gateway.watch();

        for _ in 0..20 {
            f.gateway.assume_role(Role::Admin);
            f.gateway.logout();
        }
        f.gateway.reconcile();
        f.gateway.wait_settled().await;

        assert!(f.gateway.render().is_landing());
        assert!(f.gateway.slot().state().is_idle());
        f.gateway.shutdown();
    }

    #[tokio::test]
    async fn test_role_switch_swaps_remote() {
        let f = fixture(None).await;
        f.gateway.assume_role(Role::Customer);
        f.gateway.wait_settled().await;
        f.gateway.assume_role(Role::Admin);
        f.gateway.wait_settled().await;

        assert_eq!(
            f.gateway.slot().mounted_remote(),
            Some(RemoteId::new("remote2/DashboardShell"))
        );
        let surface = f.gateway.render();
        assert_eq!(surface.dashboard().unwrap().header.portal_label, "Admin Console");
    }

    #[tokio::test]
    async fn test_logout_lands_and_unmounts() {
        let f = fixture(None).await;
        f.gateway.assume_role(Role::Admin);
        f.gateway.wait_settled().await;

        assert_eq!(f.gateway.logout(), GatewayState::Unauthenticated);
        assert!(f.gateway.render().is_landing());
        assert!(f.gateway.slot().state().is_idle());
    }

    #[tokio::test]
    async fn test_failed_remote_renders_unavailable_and_retries() {
        let f = fixture(Some("remote1")).await;
        f.gateway.assume_role(Role::Customer);
        f.gateway.wait_settled().await;

        match &f.gateway.render().dashboard().unwrap().body {
            SlotView::Unavailable {
                message, reason, ..
            } => {
                assert_eq!(
                    message,
                    "Customer App (remote1) failed to load. Please ensure the remote server is running."
                );
                assert_eq!(reason, "connection refused");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(f.gateway.retry());
        f.gateway.wait_settled().await;
        assert_eq!(f.runtime.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_render_crash_is_contained_until_retry() {
        let f = fixture(None).await;
        f.gateway.assume_role(Role::Customer);
        f.gateway.wait_settled().await;

        f.probe.fail_next.store(true, Ordering::SeqCst);
        let crashed = f.gateway.render();
        assert_eq!(
            crashed.dashboard().unwrap().body,
            SlotView::Crashed {
                message: "probe failure".to_string()
            }
        );
        // Stays crashed without an explicit retry
        assert!(matches!(
            f.gateway.render().dashboard().unwrap().body,
            SlotView::Crashed { .. }
        ));

        assert!(f.gateway.retry());
        assert!(matches!(
            f.gateway.render().dashboard().unwrap().body,
            SlotView::Mounted { .. }
        ));
        assert_eq!(f.runtime.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_header_counts_notifications() {
        let f = fixture(None).await;
        f.gateway.assume_role(Role::Customer);
        f.gateway.wait_settled().await;
        f.gateway
            .store()
            .add_notification("Saved", NotificationKind::Success);

        let surface = f.gateway.render();
        let view = surface.dashboard().unwrap();
        assert_eq!(view.header.notification_count, 1);
        assert_eq!(
            view.body,
            SlotView::Mounted {
                remote: RemoteId::new("remote1/DashboardShell"),
                content: "probe sees 1 notifications".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_watch_follows_store() {
        let f = fixture(None).await;
        f.gateway.watch();

        f.gateway.store().assume_role(Role::Admin);
        let mut slot = f.gateway.slot().subscribe();
        slot.wait_for(|state| state.remote().is_some()).await.unwrap();
        assert_eq!(
            f.gateway.slot().mounted_remote(),
            Some(RemoteId::new("remote2/DashboardShell"))
        );

        f.gateway.store().end_session();
        slot.wait_for(|state| state.is_idle()).await.unwrap();

        f.gateway.shutdown();
    }
}
