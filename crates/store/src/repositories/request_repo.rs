//! Repository for the `requests` collection.

use portal_core::request_status::RequestStatus;
use portal_core::types::Timestamp;

use crate::document::{DocumentStore, Precondition, Query};
use crate::error::StoreError;
use crate::models::request::{CreateRequest, Request, RequestPatch};
use crate::repositories::Versioned;

/// Provides typed access to request documents.
pub struct RequestRepo;

impl RequestRepo {
    pub const COLLECTION: &'static str = "requests";

    /// Insert a freshly submitted request in status NEW.
    pub async fn create(
        store: &dyn DocumentStore,
        input: &CreateRequest,
        created_by_id: &str,
        created_by_name: &str,
        now: Timestamp,
    ) -> Result<Request, StoreError> {
        let mut request = Request {
            id: String::new(),
            org_id: input.org_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            request_type: input.request_type.clone(),
            priority: input.priority,
            status: RequestStatus::New,
            currency: None,
            total_amount: 0,
            line_items: Vec::new(),
            milestones: Vec::new(),
            current_milestone_id: None,
            assigned_to_id: None,
            assigned_to_name: None,
            created_by_id: Some(created_by_id.to_string()),
            created_by_name: Some(created_by_name.to_string()),
            comment_count: 0,
            payment_id: None,
            created_at: now,
            closed_at: None,
            paid_at: None,
        };
        request.id = store
            .append(Self::COLLECTION, serde_json::to_value(&request)?)
            .await?;
        Ok(request)
    }

    /// Read a request together with its current version.
    pub async fn find_by_id(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Option<Versioned<Request>>, StoreError> {
        let Some(doc) = store.read(Self::COLLECTION, id).await? else {
            return Ok(None);
        };
        Ok(Some(Versioned {
            version: doc.version,
            record: doc.decode()?,
        }))
    }

    /// Write a patch, guarded by the version the caller read.
    ///
    /// Returns the new version.
    pub async fn update(
        store: &dyn DocumentStore,
        id: &str,
        patch: &RequestPatch,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        store
            .write(
                Self::COLLECTION,
                id,
                serde_json::to_value(patch)?,
                Precondition::Version(expected_version),
            )
            .await
    }

    /// Bump the denormalized comment counter.
    pub async fn increment_comment_count(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<u32, StoreError> {
        let current = Self::find_by_id(store, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: Self::COLLECTION.to_string(),
                id: id.to_string(),
            })?;
        let count = current.record.comment_count.saturating_add(1);
        let patch = RequestPatch {
            comment_count: Some(count),
            ..Default::default()
        };
        Self::update(store, id, &patch, current.version).await?;
        Ok(count)
    }

    /// All requests of an organization, oldest first.
    pub fn org_query(org_id: &str) -> Query {
        Query::collection(Self::COLLECTION)
            .where_eq("orgId", org_id)
            .order_by("createdAt")
    }
}
