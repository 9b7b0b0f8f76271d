//! Integration tests for `ActivityLogger` against the in-memory store.

use std::sync::Arc;

use portal_core::activity::ActivityAction;
use portal_core::actor::ActorContext;
use portal_events::activity::entry;
use portal_events::ActivityLogger;
use portal_store::models::activity::ActivityLog;
use portal_store::repositories::ActivityRepo;
use portal_store::{DocumentStore, MemoryStore};
use serde_json::json;

fn staff() -> ActorContext {
    ActorContext::staff("staff-1", "Sam")
}

// ---------------------------------------------------------------------------
// Test: append writes one entry with the actor and details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn append_records_entry() {
    let store = Arc::new(MemoryStore::new());
    let logger = ActivityLogger::new(store.clone());

    let id = logger
        .append(entry(
            ActivityAction::StatusChanged,
            "org-1",
            Some("req-1"),
            &staff(),
            json!({"from": "IN_REVIEW", "to": "NEEDS_INFO"}),
        ))
        .await
        .expect("append should succeed");

    let doc = store
        .read(ActivityRepo::COLLECTION, &id)
        .await
        .unwrap()
        .unwrap();
    let logged: ActivityLog = doc.decode().unwrap();
    assert_eq!(logged.id, id);
    assert_eq!(logged.action, ActivityAction::StatusChanged);
    assert_eq!(logged.user_name, "Sam");
    assert_eq!(logged.request_id.as_deref(), Some("req-1"));
    assert_eq!(logged.details["to"], "NEEDS_INFO");
}

// ---------------------------------------------------------------------------
// Test: a failing append is swallowed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_append_returns_none() {
    let store = Arc::new(MemoryStore::new());
    store.fail_appends_to(ActivityRepo::COLLECTION);
    let logger = ActivityLogger::new(store.clone());

    let result = logger
        .append(entry(
            ActivityAction::AddedComment,
            "org-1",
            Some("req-1"),
            &staff(),
            json!({}),
        ))
        .await;

    assert!(result.is_none());
    assert_eq!(store.count(ActivityRepo::COLLECTION), 0);
}
