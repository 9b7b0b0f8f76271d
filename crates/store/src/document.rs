//! The document store interface.
//!
//! Documents are JSON objects addressed by `(collection, id)`. Every stored
//! document carries a version counter that increases by one on each write,
//! which lets callers detect concurrent edits with [`Precondition::Version`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::StoreError;

/// A complete, current result set for a query.
pub type Snapshot = Vec<Value>;

/// One delivery on a subscription.
pub type SnapshotResult = Result<Snapshot, StoreError>;

/// A document as returned by a point read.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub version: u64,
    pub data: Value,
}

impl StoredDocument {
    /// Deserialize the document body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Guard evaluated atomically with a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precondition {
    /// Create or merge unconditionally (last write wins).
    #[default]
    None,
    /// The document must already exist.
    Exists,
    /// The document must exist at exactly this version.
    Version(u64),
}

/// Equality-filtered, ordered query over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<String>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    /// Add an equality filter on a top-level field.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Order results ascending by a top-level field.
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Whether a document body satisfies every filter.
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

/// A live query. Each item is the full result set after a change.
///
/// Dropping the subscription detaches it; the store prunes it on the next
/// delivery attempt.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SnapshotResult>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<SnapshotResult>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot. `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        self.rx.recv().await
    }
}

/// Remote document store used by the portal core.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `Ok(None)` if the document does not exist.
    async fn read(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Merge the top-level keys of `patch` into the document.
    ///
    /// Returns the new version.
    async fn write(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        precondition: Precondition,
    ) -> Result<u64, StoreError>;

    /// Insert a new document under a store-generated id and return the id.
    async fn append(&self, collection: &str, document: Value) -> Result<String, StoreError>;

    /// Subscribe to a query. The first snapshot is delivered immediately.
    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_matches_all_filters() {
        let q = Query::collection("comments")
            .where_eq("requestId", "r1")
            .where_eq("orgId", "o1");
        assert!(q.matches(&json!({"requestId": "r1", "orgId": "o1", "x": 1})));
        assert!(!q.matches(&json!({"requestId": "r1", "orgId": "o2"})));
        assert!(!q.matches(&json!({"orgId": "o1"})));
    }

    #[test]
    fn query_without_filters_matches_everything() {
        assert!(Query::collection("requests").matches(&json!({})));
    }

    #[test]
    fn decode_reports_serialization_errors() {
        let doc = StoredDocument {
            id: "a".into(),
            version: 1,
            data: json!({"n": "not a number"}),
        };
        #[derive(serde::Deserialize)]
        #[allow(dead_code)]
        struct N {
            n: i64,
        }
        assert!(matches!(doc.decode::<N>(), Err(StoreError::Serialization(_))));
    }
}
