//! Activity log documents (`activities` collection).

use serde::{Deserialize, Serialize};
use portal_core::activity::ActivityAction;
use portal_core::types::{DocId, Timestamp};

/// An immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    #[serde(default)]
    pub id: DocId,
    pub org_id: DocId,
    #[serde(default)]
    pub request_id: Option<DocId>,
    pub user_id: DocId,
    pub user_name: String,
    pub action: ActivityAction,
    /// Free-form key-value payload; always a JSON object.
    #[serde(default = "empty_details")]
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

fn empty_details() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}
