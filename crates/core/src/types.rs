/// Document ids are opaque strings assigned by the document store.
pub type DocId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary amounts in minor currency units (cents).
pub type MinorUnits = i64;
