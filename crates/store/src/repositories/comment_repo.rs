//! Repository for the `comments` collection.

use portal_core::comment::Reactions;
use portal_core::types::Timestamp;

use crate::document::{DocumentStore, Precondition, Query};
use crate::error::StoreError;
use crate::models::comment::{Comment, CreateComment};
use crate::repositories::Versioned;

/// Provides typed access to comment documents.
pub struct CommentRepo;

impl CommentRepo {
    pub const COLLECTION: &'static str = "comments";

    /// Append a comment and return it with its store-assigned id.
    pub async fn create(
        store: &dyn DocumentStore,
        org_id: &str,
        user_id: &str,
        user_name: &str,
        input: &CreateComment,
        now: Timestamp,
    ) -> Result<Comment, StoreError> {
        let mut comment = Comment {
            id: String::new(),
            request_id: input.request_id.clone(),
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            content: input.content.clone(),
            parent_id: input.parent_id.clone(),
            reactions: Reactions::new(),
            created_at: now,
        };
        comment.id = store
            .append(Self::COLLECTION, serde_json::to_value(&comment)?)
            .await?;
        Ok(comment)
    }

    pub async fn find_by_id(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Option<Versioned<Comment>>, StoreError> {
        let Some(doc) = store.read(Self::COLLECTION, id).await? else {
            return Ok(None);
        };
        Ok(Some(Versioned {
            version: doc.version,
            record: doc.decode()?,
        }))
    }

    /// Replace the reaction map, guarded by the version the caller read.
    pub async fn update_reactions(
        store: &dyn DocumentStore,
        id: &str,
        reactions: &Reactions,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        store
            .write(
                Self::COLLECTION,
                id,
                serde_json::json!({ "reactions": reactions }),
                Precondition::Version(expected_version),
            )
            .await
    }

    /// Comments on one request, oldest first.
    pub fn request_query(request_id: &str) -> Query {
        Query::collection(Self::COLLECTION)
            .where_eq("requestId", request_id)
            .order_by("createdAt")
    }
}
