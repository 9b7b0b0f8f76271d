//! Shared fixtures for the portal-sync integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use portal_core::actor::ActorContext;
use portal_core::request_status::RequestStatus;
use portal_events::ToastQueue;
use portal_store::models::request::{CreateRequest, Request};
use portal_store::MemoryStore;
use portal_sync::{PortalSession, SyncConfig};

pub const ORG: &str = "org-1";

pub fn staff() -> ActorContext {
    ActorContext::staff("staff-1", "Sam Staff")
}

pub fn client() -> ActorContext {
    ActorContext::client("client-1", "Cleo Client")
}

/// A session over a fresh in-memory store, reporting into a toast queue.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub toasts: Arc<ToastQueue>,
    pub session: PortalSession,
}

impl Harness {
    pub fn new(actor: ActorContext) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), actor)
    }

    pub fn with_store(store: Arc<MemoryStore>, actor: ActorContext) -> Self {
        let toasts = Arc::new(ToastQueue::default());
        let config = SyncConfig {
            optimistic_grace: Duration::from_secs(10),
            ..SyncConfig::default()
        };
        let session = PortalSession::new(store.clone(), toasts.clone(), actor, config)
            .expect("actor is valid");
        Self {
            store,
            toasts,
            session,
        }
    }
}

pub fn new_request(title: &str) -> CreateRequest {
    CreateRequest {
        org_id: ORG.to_string(),
        title: title.to_string(),
        description: "Details".to_string(),
        request_type: "design".to_string(),
        priority: Default::default(),
    }
}

/// Create a request and walk it along the graph to `target` as staff.
pub async fn request_in(store: Arc<MemoryStore>, title: &str, target: RequestStatus) -> Request {
    let harness = Harness::with_store(store, staff());
    let engine = harness.session.engine();
    let mut request = engine
        .create_request(&staff(), &new_request(title))
        .await
        .expect("create");

    let path: &[RequestStatus] = match target {
        RequestStatus::New => &[],
        RequestStatus::Queued => &[RequestStatus::Queued],
        RequestStatus::Quoted => &[RequestStatus::Quoted],
        RequestStatus::Accepted => &[RequestStatus::Quoted, RequestStatus::Accepted],
        RequestStatus::Declined => &[RequestStatus::Quoted, RequestStatus::Declined],
        RequestStatus::InProgress => &[RequestStatus::Queued, RequestStatus::InProgress],
        RequestStatus::InReview => &[
            RequestStatus::Queued,
            RequestStatus::InProgress,
            RequestStatus::InReview,
        ],
        RequestStatus::NeedsInfo => &[
            RequestStatus::Queued,
            RequestStatus::InProgress,
            RequestStatus::InReview,
            RequestStatus::NeedsInfo,
        ],
        RequestStatus::Delivered => &[
            RequestStatus::Queued,
            RequestStatus::InProgress,
            RequestStatus::InReview,
            RequestStatus::Delivered,
        ],
        RequestStatus::Closed => &[
            RequestStatus::Queued,
            RequestStatus::InProgress,
            RequestStatus::InReview,
            RequestStatus::Delivered,
            RequestStatus::Closed,
        ],
        RequestStatus::Paid => &[
            RequestStatus::Queued,
            RequestStatus::InProgress,
            RequestStatus::InReview,
            RequestStatus::Delivered,
            RequestStatus::Paid,
        ],
    };

    for next in path {
        request = engine
            .update_status(&staff(), &request.id, *next)
            .await
            .expect("legal step");
    }
    request
}
