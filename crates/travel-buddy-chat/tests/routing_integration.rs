//! End-to-end routing tests against a file-backed store.
//!
//! Each test opens its own store in a temp directory and drives the router
//! with the offline backend.

use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

use travel_buddy_chat::{ConversationManager, HandlerRegistry, SmartRouter, TaskClassifier};
use travel_buddy_core::error::BuddyError;
use travel_buddy_core::types::{Role, TaskType};
use travel_buddy_llm::MockBackend;
use travel_buddy_storage::{JsonFileStore, SessionStore};

// =============================================================================
// Helpers
// =============================================================================

fn open_router(path: &Path, backend: Arc<MockBackend>) -> SmartRouter {
    let store = Arc::new(JsonFileStore::open(path).unwrap());
    SmartRouter::new(ConversationManager::new(store, 10, 5), backend)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn beach_trip_routes_to_packing_handler() {
    let query = "What should I pack for a beach trip?";
    assert_eq!(TaskClassifier::new().classify(query), TaskType::Packing);

    let registry = HandlerRegistry::with_defaults();
    let handler = registry.get(TaskType::Packing);
    assert_eq!(handler.task_type(), TaskType::Packing);

    let dir = tempdir().unwrap();
    let backend = Arc::new(MockBackend::scripted(["Swimsuit, sunscreen, a hat."]));
    let router = open_router(&dir.path().join("memory_store.json"), backend.clone());

    let outcome = router.route("beach", query).await.unwrap();
    assert_eq!(outcome.task_type, TaskType::Packing);
    assert_eq!(outcome.response, "Swimsuit, sunscreen, a hat.");
    assert!(backend.last_prompt().unwrap().contains("Focus on packing"));
}

#[tokio::test]
async fn two_queries_persist_chronologically_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memory_store.json");

    {
        let backend = Arc::new(MockBackend::scripted(["Try Portugal.", "Visit Sintra."]));
        let router = open_router(&path, backend);
        router.route("trip", "Where should I go in Europe?").await.unwrap();
        router.route("trip", "Top attractions near Lisbon?").await.unwrap();
    }

    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    let manager = ConversationManager::new(store, 10, 5);
    let ctx = manager.context("trip").unwrap();

    let roles: Vec<Role> = ctx.turns.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    let texts: Vec<&str> = ctx.turns.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Where should I go in Europe?",
            "Try Portugal.",
            "Top attractions near Lisbon?",
            "Visit Sintra.",
        ]
    );
    assert!(ctx.turns.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn preferences_carry_into_later_prompts() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(MockBackend::echo());
    let router = open_router(&dir.path().join("memory_store.json"), backend.clone());

    router
        .route("s", "I'm traveling with my kids and I prefer warm weather")
        .await
        .unwrap();
    router.route("other", "Where should I go?").await.unwrap();
    router.route("s", "Where should I go in winter?").await.unwrap();

    let prompt = backend.last_prompt().unwrap();
    assert!(prompt.contains("- companions: kids"));
    assert!(prompt.contains("- climate: warm"));

    // Preferences are scoped to their session.
    let other_prompt = &backend.prompts()[1];
    assert!(!other_prompt.contains("Known traveler preferences"));
}

#[tokio::test]
async fn clearing_one_session_keeps_the_rest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memory_store.json");
    let router = open_router(&path, Arc::new(MockBackend::echo()));

    router.route("a", "Where should I go?").await.unwrap();
    router.route("b", "What should I pack?").await.unwrap();

    assert!(router.conversations().clear_session("a").unwrap());

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.list_sessions().unwrap(), vec!["b".to_string()]);
    assert_eq!(reopened.load("b").unwrap().turns.len(), 2);

    assert_eq!(router.conversations().clear_all().unwrap(), 1);
    let reopened = JsonFileStore::open(&path).unwrap();
    assert!(reopened.list_sessions().unwrap().is_empty());
}

#[tokio::test]
async fn backend_failure_leaves_store_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memory_store.json");
    let router = open_router(&path, Arc::new(MockBackend::unavailable("connection refused")));

    let err = router.route("s", "Where should I go?").await.unwrap_err();
    assert!(err.is_backend());
    assert!(!path.exists());
}

#[test]
fn corrupt_store_fails_to_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memory_store.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    match JsonFileStore::open(&path) {
        Err(BuddyError::CorruptStore { path: p, .. }) => assert_eq!(p, path),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("corrupt store opened"),
    }
}
