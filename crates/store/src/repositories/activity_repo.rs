//! Repository for the append-only `activities` collection.

use crate::document::{DocumentStore, Query};
use crate::error::StoreError;
use crate::models::activity::ActivityLog;

/// Provides append and query access to activity entries.
///
/// Entries are never updated or deleted.
pub struct ActivityRepo;

impl ActivityRepo {
    pub const COLLECTION: &'static str = "activities";

    /// Append an entry and return its id.
    pub async fn append(store: &dyn DocumentStore, entry: &ActivityLog) -> Result<String, StoreError> {
        let mut doc = serde_json::to_value(entry)?;
        if let Some(map) = doc.as_object_mut() {
            map.remove("id");
        }
        store.append(Self::COLLECTION, doc).await
    }

    /// Activity on one request, oldest first.
    pub fn request_query(request_id: &str) -> Query {
        Query::collection(Self::COLLECTION)
            .where_eq("requestId", request_id)
            .order_by("createdAt")
    }

    /// Activity across an organization, oldest first.
    pub fn org_query(org_id: &str) -> Query {
        Query::collection(Self::COLLECTION)
            .where_eq("orgId", org_id)
            .order_by("createdAt")
    }
}
