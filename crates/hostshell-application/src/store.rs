//! Shared state store.
//!
//! Single source of truth for the session, theme and notification feed. The
//! state lives in a `watch` channel so every consumer reads the same value
//! after a mutation, and each mutation is one `send_if_modified` call.
//!
//! Persistence:
//! - `hydrate()` reads the stored snapshot exactly once
//! - after hydration, every mutation queues the full snapshot for the writer
//!   task, which saves them one at a time in queue order
//! - mutations before hydration are kept in memory only

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::{OnceCell, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use hostshell_core::config::CapabilitySet;
use hostshell_core::error::{HostError, Result};
use hostshell_core::session::{Role, Session};
use hostshell_core::state::{
    Notification, NotificationKind, PersistedSnapshot, PersistenceAdapter, Theme,
};

use crate::facet::StoreFacet;

/// Process-wide sequence mixed into notification ids.
static NOTIFICATION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Everything the store owns, as observed by subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreState {
    pub session: Option<Session>,
    pub theme: Theme,
    /// Newest first.
    pub notifications: Vec<Notification>,
    pub is_hydrated: bool,
}

impl StoreState {
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            session: self.session.clone(),
            theme: self.theme,
            notifications: self.notifications.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

enum WriterMessage {
    Save(PersistedSnapshot),
    Flush(oneshot::Sender<()>),
}

struct Writer {
    tx: mpsc::UnboundedSender<WriterMessage>,
    task: JoinHandle<()>,
}

/// The shared state store.
///
/// Must be created inside a Tokio runtime: `create` spawns the writer task.
pub struct SharedStateStore {
    instance_id: Uuid,
    adapter: Arc<dyn PersistenceAdapter>,
    state: watch::Sender<StoreState>,
    writer: Mutex<Option<Writer>>,
    hydration: OnceCell<()>,
    disposed: AtomicBool,
}

impl SharedStateStore {
    /// Creates a store with default state and starts its writer task.
    pub fn create(adapter: Arc<dyn PersistenceAdapter>) -> Arc<Self> {
        let (state, _) = watch::channel(StoreState::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(adapter.clone(), rx));
        let instance_id = Uuid::new_v4();

        tracing::info!(
            "[Store] Created store {} over {} storage",
            instance_id,
            adapter.describe()
        );

        Arc::new(Self {
            instance_id,
            adapter,
            state,
            writer: Mutex::new(Some(Writer { tx, task })),
            hydration: OnceCell::new(),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Reads the persisted snapshot and marks the store hydrated.
    ///
    /// Runs once per store; concurrent calls wait for the first one. If the
    /// running call is dropped before it finishes, the next caller takes
    /// over, so the store always ends up hydrated. A missing, unreadable or
    /// corrupt blob falls back to defaults; corrupt blobs are also cleared.
    /// Only calling this on a disposed store fails.
    pub async fn hydrate(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(HostError::lifecycle("hydrate called on a disposed store"));
        }

        self.hydration.get_or_init(|| self.load_and_apply()).await;
        Ok(())
    }

    async fn load_and_apply(&self) {
        let adapter = self.adapter.clone();
        let loaded = tokio::task::spawn_blocking(move || read_persisted(adapter.as_ref()))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("[Store] Hydration read did not complete: {}", e);
                PersistedSnapshot::default()
            });

        self.state.send_modify(|state| {
            state.session = loaded.session;
            state.theme = loaded.theme;
            state.notifications = loaded.notifications;
            state.is_hydrated = true;
        });

        let state = self.state.borrow();
        tracing::info!(
            "[Store] Hydrated {}: session={}, theme={}, notifications={}",
            self.instance_id,
            state
                .session
                .as_ref()
                .map(|s| s.role.as_str())
                .unwrap_or("none"),
            state.theme,
            state.notifications.len()
        );
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.borrow().is_hydrated
    }

    /// Resolves once hydration has completed.
    pub async fn wait_hydrated(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| state.is_hydrated).await;
    }

    /// Waits until every write queued so far has reached the adapter.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        let sent = {
            let writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            writer
                .as_ref()
                .is_some_and(|writer| writer.tx.send(WriterMessage::Flush(ack_tx)).is_ok())
        };
        if sent {
            let _ = ack_rx.await;
        }
    }

    /// Stops the writer after it has saved everything already queued.
    ///
    /// Mutations after disposal still update memory but are not persisted.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(Writer { tx, task }) = writer {
            drop(tx);
            if let Err(e) = task.await {
                tracing::warn!("[Store] Writer task ended abnormally: {}", e);
            }
        }

        tracing::info!("[Store] Disposed store {}", self.instance_id);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    // ============================================================================
    // Readers
    // ============================================================================

    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PersistedSnapshot {
        self.state.borrow().snapshot()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn theme(&self) -> Theme {
        self.state.borrow().theme
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.borrow().notifications.clone()
    }

    /// Restricted handle for a mounted remote.
    pub fn facet(self: &Arc<Self>, capabilities: CapabilitySet) -> StoreFacet {
        StoreFacet::new(self.clone(), capabilities)
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Replaces the session with the demo identity for `role`.
    pub fn assume_role(&self, role: Role) {
        let session = Session::for_role(role);
        self.mutate("assume_role", move |state| {
            if state.session.as_ref() == Some(&session) {
                return false;
            }
            state.session = Some(session);
            true
        });
    }

    pub fn end_session(&self) {
        self.mutate("end_session", |state| state.session.take().is_some());
    }

    pub fn toggle_theme(&self) {
        self.mutate("toggle_theme", |state| {
            state.theme = state.theme.toggled();
            true
        });
    }

    /// Prepends a notification and returns its id.
    pub fn add_notification(&self, message: &str, kind: NotificationKind) -> String {
        let mut minted = String::new();
        self.mutate("add_notification", |state| {
            let id = mint_notification_id(&state.notifications);
            state.notifications.insert(
                0,
                Notification {
                    id: id.clone(),
                    message: message.to_string(),
                    kind,
                    created_at: Utc::now(),
                },
            );
            minted = id;
            true
        });
        minted
    }

    /// Removes the notification with `id`; unknown ids are ignored.
    pub fn dismiss_notification(&self, id: &str) {
        self.mutate("dismiss_notification", |state| {
            let before = state.notifications.len();
            state.notifications.retain(|n| n.id != id);
            state.notifications.len() != before
        });
    }

    pub fn clear_notifications(&self) {
        self.mutate("clear_notifications", |state| {
            let had_any = !state.notifications.is_empty();
            state.notifications.clear();
            had_any
        });
    }

    /// Applies `f` and, once hydrated, queues the resulting snapshot.
    ///
    /// The snapshot is queued while the state is still locked, so queue order
    /// always matches mutation order.
    fn mutate<F>(&self, op: &'static str, f: F)
    where
        F: FnOnce(&mut StoreState) -> bool,
    {
        self.state.send_if_modified(|state| {
            if !f(state) {
                return false;
            }

            if state.is_hydrated {
                let writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
                match writer.as_ref() {
                    Some(writer) => {
                        if writer.tx.send(WriterMessage::Save(state.snapshot())).is_err() {
                            tracing::warn!("[Store] Writer gone; {} not persisted", op);
                        }
                    }
                    None => tracing::debug!("[Store] Store disposed; {} not persisted", op),
                }
            } else {
                tracing::debug!("[Store] {} before hydration; write suppressed", op);
            }

            true
        });
    }
}

/// Mints an id that is unique in this process and absent from `existing`.
fn mint_notification_id(existing: &[Notification]) -> String {
    loop {
        let seq = NOTIFICATION_SEQ.fetch_add(1, Ordering::Relaxed);
        let id = format!("ntf-{}-{}", Utc::now().timestamp_millis(), seq);
        if !existing.iter().any(|n| n.id == id) {
            return id;
        }
    }
}

fn read_persisted(adapter: &dyn PersistenceAdapter) -> PersistedSnapshot {
    let blob = match adapter.load() {
        Ok(Some(blob)) => blob,
        Ok(None) => return PersistedSnapshot::default(),
        Err(e) => {
            tracing::warn!("[Store] Persistence medium unreadable, using defaults: {}", e);
            return PersistedSnapshot::default();
        }
    };

    match PersistedSnapshot::from_blob(&blob) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("[Store] Discarding corrupt persisted state: {}", e);
            if let Err(e) = adapter.clear() {
                tracing::warn!("[Store] Failed to clear corrupt state: {}", e);
            }
            PersistedSnapshot::default()
        }
    }
}

async fn run_writer(
    adapter: Arc<dyn PersistenceAdapter>,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) {
    while let Some(message) = rx.recv().await {
        let mut latest = match message {
            WriterMessage::Save(snapshot) => snapshot,
            WriterMessage::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        // Coalesce queued saves up to the next flush barrier
        let mut barrier = None;
        while let Ok(next) = rx.try_recv() {
            match next {
                WriterMessage::Save(snapshot) => latest = snapshot,
                WriterMessage::Flush(ack) => {
                    barrier = Some(ack);
                    break;
                }
            }
        }

        write_snapshot(adapter.clone(), latest).await;

        if let Some(ack) = barrier {
            let _ = ack.send(());
        }
    }
}

async fn write_snapshot(adapter: Arc<dyn PersistenceAdapter>, snapshot: PersistedSnapshot) {
    let result = tokio::task::spawn_blocking(move || {
        let blob = snapshot.to_blob()?;
        adapter.save(&blob)
    })
    .await;

    match result {
        Ok(Ok(())) => tracing::debug!("[Store] Snapshot saved"),
        Ok(Err(e)) => tracing::warn!("[Store] Failed to save snapshot: {}", e),
        Err(e) => tracing::warn!("[Store] Save task did not complete: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostshell_infrastructure::{MemoryStorage, UnavailableStorage};
    use std::collections::HashSet;
    use std::time::Duration;

    async fn hydrated_store(storage: Arc<MemoryStorage>) -> Arc<SharedStateStore> {
        let store = SharedStateStore::create(storage);
        store.hydrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_defaults_before_hydration() {
        let store = SharedStateStore::create(Arc::new(MemoryStorage::new()));
        let state = store.state();
        assert!(!state.is_hydrated);
        assert!(state.session.is_none());
        assert_eq!(state.theme, Theme::Light);
        assert!(state.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_notification_ids_are_distinct() {
        let store = hydrated_store(Arc::new(MemoryStorage::new())).await;
        let ids: HashSet<String> = (0..500)
            .map(|_| store.add_notification("same", NotificationKind::Info))
            .collect();
        assert_eq!(ids.len(), 500);
        assert_eq!(store.notifications().len(), 500);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let store = hydrated_store(Arc::new(MemoryStorage::new())).await;
        store.add_notification("first", NotificationKind::Info);
        let second = store.add_notification("second", NotificationKind::Warning);
        let notifications = store.notifications();
        assert_eq!(notifications[0].id, second);
        assert_eq!(notifications[1].message, "first");
    }

    #[tokio::test]
    async fn test_dismiss_is_idempotent() {
        let store = hydrated_store(Arc::new(MemoryStorage::new())).await;
        let keep = store.add_notification("keep", NotificationKind::Info);
        let drop_id = store.add_notification("drop", NotificationKind::Error);

        store.dismiss_notification(&drop_id);
        let after_first = store.notifications();
        store.dismiss_notification(&drop_id);

        assert_eq!(store.notifications(), after_first);
        assert_eq!(after_first.len(), 1);
        assert_eq!(after_first[0].id, keep);
    }

    #[tokio::test]
    async fn test_clear_notifications() {
        let store = hydrated_store(Arc::new(MemoryStorage::new())).await;
        store.clear_notifications();
        assert!(store.notifications().is_empty());
        for i in 0..10 {
            store.add_notification(&format!("n{}", i), NotificationKind::Info);
        }
        store.clear_notifications();
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = hydrated_store(Arc::new(MemoryStorage::new())).await;
        store.assume_role(Role::Customer);
        assert_eq!(store.session().unwrap().role, Role::Customer);
        store.assume_role(Role::Admin);
        assert_eq!(store.session().unwrap().role, Role::Admin);
        store.end_session();
        assert!(store.session().is_none());
        store.end_session();
        assert!(store.session().is_none());
    }

    #[tokio::test]
    async fn test_writes_suppressed_before_hydration() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SharedStateStore::create(storage.clone());

        store.toggle_theme();
        store.flush().await;
        assert!(storage.raw().is_none());

        store.hydrate().await.unwrap();
        store.toggle_theme();
        store.flush().await;
        let saved = PersistedSnapshot::from_blob(&storage.raw().unwrap()).unwrap();
        assert_eq!(saved.theme, store.theme());
    }

    #[tokio::test]
    async fn test_hydrate_runs_once() {
        let storage = Arc::new(MemoryStorage::new());
        let store = hydrated_store(storage.clone()).await;
        store.assume_role(Role::Admin);
        store.flush().await;

        // A second hydrate must not reload (and so must not drop the session)
        storage.clear().unwrap();
        store.hydrate().await.unwrap();
        assert_eq!(store.session().unwrap().role, Role::Admin);
    }

    /// Memory storage whose reads block for a while.
    struct SlowStorage {
        inner: MemoryStorage,
        delay: Duration,
    }

    impl PersistenceAdapter for SlowStorage {
        fn load(&self) -> Result<Option<String>> {
            std::thread::sleep(self.delay);
            self.inner.load()
        }

        fn save(&self, blob: &str) -> Result<()> {
            self.inner.save(blob)
        }

        fn clear(&self) -> Result<()> {
            self.inner.clear()
        }

        fn describe(&self) -> String {
            "slow-memory".to_string()
        }
    }

    #[tokio::test]
    async fn test_hydrate_completes_after_abandoned_call() {
        let saved = PersistedSnapshot {
            theme: Theme::Dark,
            ..Default::default()
        };
        let store = SharedStateStore::create(Arc::new(SlowStorage {
            inner: MemoryStorage::with_blob(saved.to_blob().unwrap()),
            delay: Duration::from_millis(300),
        }));

        let abandoned = tokio::time::timeout(Duration::from_millis(20), store.hydrate()).await;
        assert!(abandoned.is_err());
        assert!(!store.is_hydrated());

        tokio::time::timeout(Duration::from_secs(3), store.hydrate())
            .await
            .expect("second hydrate should finish")
            .unwrap();
        assert!(store.is_hydrated());
        assert_eq!(store.theme(), Theme::Dark);

        // Waiters are released as well
        tokio::time::timeout(Duration::from_secs(1), store.wait_hydrated())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_hydrate_calls_share_one_load() {
        let store = SharedStateStore::create(Arc::new(SlowStorage {
            inner: MemoryStorage::new(),
            delay: Duration::from_millis(50),
        }));

        let (first, second) = tokio::join!(store.hydrate(), store.hydrate());
        first.unwrap();
        second.unwrap();
        assert!(store.is_hydrated());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_cleared() {
        let storage = Arc::new(MemoryStorage::with_blob("\u{0}garbage{{"));
        let store = hydrated_store(storage.clone()).await;

        let state = store.state();
        assert!(state.is_hydrated);
        assert_eq!(state.snapshot(), PersistedSnapshot::default());
        assert!(storage.raw().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_medium_works_in_memory() {
        let store = SharedStateStore::create(Arc::new(UnavailableStorage));
        store.hydrate().await.unwrap();
        store.assume_role(Role::Customer);
        store.add_notification("hi", NotificationKind::Info);
        store.flush().await;
        assert_eq!(store.notifications().len(), 1);
        assert!(store.session().is_some());
    }

    #[tokio::test]
    async fn test_subscribers_see_mutations() {
        let store = hydrated_store(Arc::new(MemoryStorage::new())).await;
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.toggle_theme();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_noop_mutations_do_not_notify() {
        let store = hydrated_store(Arc::new(MemoryStorage::new())).await;
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.end_session();
        store.dismiss_notification("missing");
        store.clear_notifications();

        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let storage = Arc::new(MemoryStorage::new());
        let store = hydrated_store(storage.clone()).await;

        for _ in 0..25 {
            store.toggle_theme();
            store.add_notification("tick", NotificationKind::Info);
        }
        store.assume_role(Role::Admin);
        store.flush().await;

        let saved = PersistedSnapshot::from_blob(&storage.raw().unwrap()).unwrap();
        assert_eq!(saved, store.snapshot());
    }

    #[tokio::test]
    async fn test_dispose_flushes_and_blocks_hydrate() {
        let storage = Arc::new(MemoryStorage::new());
        let store = hydrated_store(storage.clone()).await;
        store.assume_role(Role::Customer);

        store.dispose().await;

        let saved = PersistedSnapshot::from_blob(&storage.raw().unwrap()).unwrap();
        assert_eq!(saved.session.unwrap().role, Role::Customer);
        assert!(store.is_disposed());

        let fresh_after_dispose = store.hydrate().await;
        assert!(fresh_after_dispose.unwrap_err().is_lifecycle());

        // Memory still updates, persistence does not
        store.toggle_theme();
        store.flush().await;
        let saved = PersistedSnapshot::from_blob(&storage.raw().unwrap()).unwrap();
        assert_eq!(saved.theme, Theme::Light);
        assert_eq!(store.theme(), Theme::Dark);
    }
}
