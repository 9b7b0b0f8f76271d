//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`PortalEvent`]s. The
//! lifecycle engine publishes one event after every confirmed write;
//! notification consumers (email, in-app inbox) subscribe independently.
//! It is designed to be shared via `Arc<EventBus>` within a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

/// Dot-separated event names published by the portal core.
pub mod event_types {
    pub const REQUEST_CREATED: &str = "request.created";
    pub const REQUEST_ASSIGNED: &str = "request.assigned";
    pub const REQUEST_QUOTED: &str = "request.quoted";
    pub const REQUEST_STATUS_CHANGED: &str = "request.status_changed";
    pub const REQUEST_PAID: &str = "request.paid";
    pub const MILESTONE_UPDATED: &str = "milestone.updated";
    pub const PIPELINE_UPDATED: &str = "pipeline.updated";
    pub const COMMENT_ADDED: &str = "comment.added";
}

// ---------------------------------------------------------------------------
// PortalEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the portal.
///
/// Constructed via [`PortalEvent::new`] and enriched with the builder
/// methods [`for_request`](PortalEvent::for_request),
/// [`with_actor`](PortalEvent::with_actor), and
/// [`with_payload`](PortalEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalEvent {
    /// Dot-separated event name, e.g. `"request.status_changed"`.
    pub event_type: String,

    /// Organization the event belongs to.
    pub org_id: Option<String>,

    /// Request the event concerns.
    pub request_id: Option<String>,

    /// Id of the user that triggered the event.
    pub actor_user_id: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PortalEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            org_id: None,
            request_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the organization and request the event concerns.
    pub fn for_request(mut self, org_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id.into());
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PortalEvent`].
pub struct EventBus {
    sender: broadcast::Sender<PortalEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: PortalEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
