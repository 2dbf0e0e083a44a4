use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use hostshell_application::SharedStateStore;
use hostshell_core::session::Role;
use hostshell_core::state::{NotificationKind, PersistedSnapshot, PersistenceAdapter, Theme};
use hostshell_infrastructure::{JsonFileStorage, MemoryStorage};
use tempfile::TempDir;

async fn open(dir: &TempDir) -> Arc<SharedStateStore> {
    let store = SharedStateStore::create(Arc::new(JsonFileStorage::new(dir.path())));
    store.hydrate().await.expect("hydrate should succeed");
    store
}

#[tokio::test]
async fn test_fresh_store_has_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(&temp_dir).await;

    let state = store.state();
    assert!(state.is_hydrated);
    assert!(state.session.is_none());
    assert_eq!(state.theme, Theme::Light);
    assert!(state.notifications.is_empty());

    // Nothing was mutated, so nothing was written
    store.dispose().await;
    assert!(!JsonFileStorage::new(temp_dir.path()).path().exists());
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    let first = open(&temp_dir).await;
    first.assume_role(Role::Customer);
    first.toggle_theme();
    first.add_notification("Order shipped", NotificationKind::Success);
    first.add_notification("Card expiring", NotificationKind::Warning);
    let before = first.snapshot();
    first.dispose().await;

    let second = open(&temp_dir).await;
    assert_eq!(second.snapshot(), before);
    assert_eq!(second.session().unwrap().id, "cust-001");
    assert_eq!(second.theme(), Theme::Dark);
    assert_eq!(second.notifications()[0].message, "Card expiring");
}

#[tokio::test]
async fn test_corrupt_file_is_recovered_and_removed() {
    let temp_dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(temp_dir.path());
    fs::write(storage.path(), "{ this is not json").unwrap();

    let store = open(&temp_dir).await;
    assert!(store.is_hydrated());
    assert_eq!(store.snapshot(), PersistedSnapshot::default());
    assert!(storage.load().unwrap().is_none());
}

#[tokio::test]
async fn test_non_utf8_file_is_recovered_and_removed() {
    let temp_dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(temp_dir.path());
    fs::write(storage.path(), [0xff, 0xfe, 0x00, 0x80, 0x41]).unwrap();

    let store = open(&temp_dir).await;
    assert!(store.is_hydrated());
    assert_eq!(store.snapshot(), PersistedSnapshot::default());
    assert!(!storage.path().exists());
}

#[tokio::test]
async fn test_partially_valid_blob_keeps_valid_fields() {
    let blob = r#"{
        "session": {"id": "admin-001", "displayName": "Alex Admin", "role": "admin"},
        "theme": "sepia",
        "notifications": [
            {"id": "ntf-1-1", "message": "kept", "kind": "info", "createdAt": "2024-05-01T10:00:00Z"},
            {"id": "ntf-1-2", "message": "no kind"}
        ]
    }"#;
    let storage = Arc::new(MemoryStorage::with_blob(blob));
    let store = SharedStateStore::create(storage.clone());
    store.hydrate().await.unwrap();

    assert_eq!(store.session().unwrap().role, Role::Admin);
    assert_eq!(store.theme(), Theme::Light);
    let notifications = store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "kept");

    // A JSON blob is never cleared, even when fields were dropped
    assert!(storage.raw().is_some());
}

#[tokio::test]
async fn test_new_ids_avoid_hydrated_ids() {
    let temp_dir = TempDir::new().unwrap();

    let first = open(&temp_dir).await;
    let mut seen: HashSet<String> = (0..20)
        .map(|_| first.add_notification("Saved", NotificationKind::Success))
        .collect();
    first.dispose().await;

    let second = open(&temp_dir).await;
    for _ in 0..20 {
        assert!(seen.insert(second.add_notification("Saved", NotificationKind::Success)));
    }
    assert_eq!(second.notifications().len(), 40);
}

#[tokio::test]
async fn test_persisted_document_shape() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(&temp_dir).await;
    store.assume_role(Role::Admin);
    store.add_notification("hello", NotificationKind::Info);
    store.flush().await;

    let raw = fs::read_to_string(JsonFileStorage::new(temp_dir.path()).path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["session"]["displayName"], "Alex Admin");
    assert_eq!(value["session"]["role"], "admin");
    assert_eq!(value["theme"], "light");
    assert_eq!(value["notifications"][0]["kind"], "info");
    assert!(value["notifications"][0]["createdAt"].is_string());
}
