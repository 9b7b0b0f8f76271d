//! Append-only activity logging.
//!
//! [`ActivityLogger`] writes one [`ActivityLog`] per confirmed mutation. The
//! append is not atomic with the mutation it records: if it fails, the
//! failure is logged and the mutation still counts as successful.

use std::sync::Arc;

use chrono::Utc;
use portal_core::activity::ActivityAction;
use portal_core::actor::ActorContext;
use portal_store::models::activity::ActivityLog;
use portal_store::repositories::ActivityRepo;
use portal_store::{DocumentStore, StoreError};

/// Build an activity entry for `actor` acting on a request.
pub fn entry(
    action: ActivityAction,
    org_id: &str,
    request_id: Option<&str>,
    actor: &ActorContext,
    details: serde_json::Value,
) -> ActivityLog {
    ActivityLog {
        id: String::new(),
        org_id: org_id.to_string(),
        request_id: request_id.map(str::to_string),
        user_id: actor.user_id.clone(),
        user_name: actor.user_name.clone(),
        action,
        details,
        created_at: Utc::now(),
    }
}

/// Writes audit entries to the `activities` collection.
#[derive(Clone)]
pub struct ActivityLogger {
    store: Arc<dyn DocumentStore>,
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append an entry, returning the store error on failure.
    pub async fn try_append(&self, entry: &ActivityLog) -> Result<String, StoreError> {
        ActivityRepo::append(self.store.as_ref(), entry).await
    }

    /// Append an entry. Failures are logged and swallowed.
    ///
    /// Returns the new entry's id when the append succeeded.
    pub async fn append(&self, entry: ActivityLog) -> Option<String> {
        match self.try_append(&entry).await {
            Ok(id) => {
                tracing::debug!(
                    activity_id = %id,
                    action = %entry.action,
                    request_id = ?entry.request_id,
                    "Activity recorded"
                );
                Some(id)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    action = %entry.action,
                    org_id = %entry.org_id,
                    request_id = ?entry.request_id,
                    "Failed to record activity"
                );
                None
            }
        }
    }
}
