//! Comment documents (`comments` collection).

use serde::{Deserialize, Serialize};
use portal_core::comment::Reactions;
use portal_core::types::{DocId, Timestamp};

/// A discussion message on a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: DocId,
    pub request_id: DocId,
    pub org_id: DocId,
    pub user_id: DocId,
    pub user_name: String,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<DocId>,
    #[serde(default)]
    pub reactions: Reactions,
    pub created_at: Timestamp,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// DTO for posting a comment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    pub request_id: DocId,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<DocId>,
}
