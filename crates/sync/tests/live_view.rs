//! Integration tests for `LiveView` subscriptions against the in-memory store.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use portal_core::request_status::RequestStatus;
use portal_store::models::request::Request;
use portal_store::repositories::RequestRepo;
use portal_store::{DocumentStore, MemoryStore};
use portal_sync::{LiveView, SyncConfig, SyncError};
use serde_json::json;

use common::{request_in, staff, Harness, ORG};

async fn org_view(store: &MemoryStore) -> LiveView<Request> {
    LiveView::subscribe(store, RequestRepo::org_query(ORG), &SyncConfig::default()).await
}

fn titles(view: &LiveView<Request>) -> Vec<String> {
    view.items().into_iter().map(|r| r.title).collect()
}

// ---------------------------------------------------------------------------
// Test: each snapshot fully replaces the previous one
// ---------------------------------------------------------------------------

#[tokio::test]
async fn later_snapshot_replaces_earlier() {
    let store = Arc::new(MemoryStore::new());
    let a = request_in(store.clone(), "A", RequestStatus::New).await;
    let view = org_view(&store).await;
    view.wait_until(|items| items.len() == 1).await;

    // Move A to another organization and add B.
    store
        .write(RequestRepo::COLLECTION, &a.id, json!({"orgId": "org-2"}), Default::default())
        .await
        .unwrap();
    request_in(store.clone(), "B", RequestStatus::New).await;

    view.wait_until(|items| items.iter().any(|r| r.title == "B")).await;
    assert_eq!(titles(&view), vec!["B"]);
}

#[tokio::test]
async fn remote_changes_flow_into_view() {
    let h = Harness::new(staff());
    let request = request_in(h.store.clone(), "Logo", RequestStatus::Queued).await;
    let view = h.session.requests(ORG).await;
    view.wait_until(|items| items.len() == 1).await;

    h.session
        .engine()
        .start_work(&staff(), &request.id)
        .await
        .unwrap();

    view.wait_until(|items| items[0].status == RequestStatus::InProgress)
        .await;
}

// ---------------------------------------------------------------------------
// Test: unsubscribe is idempotent and stops updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribe_stops_updates() {
    let store = Arc::new(MemoryStore::new());
    request_in(store.clone(), "A", RequestStatus::New).await;
    let view = org_view(&store).await;
    view.wait_until(|items| items.len() == 1).await;

    view.unsubscribe();
    view.unsubscribe();
    assert!(view.is_closed());

    request_in(store.clone(), "B", RequestStatus::New).await;
    tokio::task::yield_now().await;
    assert_eq!(titles(&view), vec!["A"]);
}

#[tokio::test]
async fn dropped_view_detaches_from_store() {
    let store = Arc::new(MemoryStore::new());
    let view = org_view(&store).await;
    assert_eq!(store.subscriber_count(), 1);

    drop(view);
    // The listener task drops its receiver once it observes cancellation.
    for _ in 0..10 {
        if store.subscriber_count() == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(store.subscriber_count(), 0);
}

// ---------------------------------------------------------------------------
// Test: a broken subscription empties the view without surfacing an error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broken_subscription_resets_to_empty() {
    let store = Arc::new(MemoryStore::new());
    request_in(store.clone(), "A", RequestStatus::New).await;
    let view = org_view(&store).await;
    view.wait_until(|items| items.len() == 1).await;

    store.break_subscriptions(RequestRepo::COLLECTION);
    view.wait_until(|items| items.is_empty()).await;

    assert_matches!(view.last_error(), Some(SyncError::Subscription(_)));
}
