#![allow(clippy::unwrap_used, clippy::expect_used)]

use docchat_core::{ExportError, Role, Turn};
use docchat_session::{
    MemorySessionStore, PairingMode, Session, SessionStore, Transcript, TranscriptExporter,
};
use std::sync::Arc;

fn session_with_two_exchanges() -> Session {
    let mut session = Session::new("acc_setup");
    session.add_exchange("Q1", "A1");
    session.add_exchange("Q2", "A2");
    session
}

#[tokio::test]
async fn test_get_or_create_is_idempotent() {
    let store = MemorySessionStore::new();
    let a = store.get_or_create("acc_setup").await;
    let b = store.get_or_create("acc_setup").await;
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(store.list().await, vec!["acc_setup".to_string()]);
}

#[tokio::test]
async fn test_get_nonexistent_returns_none() {
    let store = MemorySessionStore::new();
    assert!(store.get("nobody").await.is_none());
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let store = MemorySessionStore::new();
    store
        .get_or_create("alice")
        .await
        .lock()
        .await
        .add_exchange("hi", "hello");

    let bob = store.get_or_create("bob").await;
    assert_eq!(bob.lock().await.turn_count(), 0);

    let alice = store.get("alice").await.unwrap();
    assert_eq!(alice.lock().await.turn_count(), 2);
    assert_eq!(store.list().await, vec!["alice".to_string(), "bob".to_string()]);
}

#[tokio::test]
async fn test_remove_session() {
    let store = MemorySessionStore::new();
    store.get_or_create("temp").await;
    assert!(store.remove("temp").await);
    assert!(!store.remove("temp").await);
    assert!(store.list().await.is_empty());
}

#[test]
fn test_exchange_order_preserved() {
    let session = session_with_two_exchanges();
    let contents: Vec<&str> = session.turns().iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["Q1", "A1", "Q2", "A2"]);
    assert_eq!(session.count_role(Role::Human), 2);
    assert_eq!(session.count_role(Role::Assistant), 2);
}

#[tokio::test]
async fn test_export_literal_writes_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("agent_stup.json");
    let session = session_with_two_exchanges();

    let exported = TranscriptExporter::default()
        .export(&session, &path)
        .await
        .unwrap();

    let on_disk: Transcript =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, exported);
    assert_eq!(on_disk.messages[1].user_query, "Q2");
    assert_eq!(on_disk.messages[1].ai_response, "A1");
    // Export reads the history without changing it.
    assert_eq!(session.turn_count(), 4);
}

#[tokio::test]
async fn test_export_chronological_writes_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("history.json");

    TranscriptExporter::new(PairingMode::Chronological)
        .export(&session_with_two_exchanges(), &path)
        .await
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["messages"][1]["ai_response"], "A2");
}

#[tokio::test]
async fn test_export_overwrites_existing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("history.json");
    let stale = "stale contents that are much longer than the new transcript".repeat(20);
    std::fs::write(&path, stale).unwrap();

    let mut session = Session::new("s");
    session.add_turn(Turn::human("only"));
    TranscriptExporter::default()
        .export(&session, &path)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\n  \"messages\": []\n}");
}

#[tokio::test]
async fn test_export_io_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("missing-dir").join("history.json");

    let err = TranscriptExporter::default()
        .export(&session_with_two_exchanges(), &path)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Io(_)));
}
