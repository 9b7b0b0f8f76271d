//! In-process [`DocumentStore`] with subscription fan-out and fault
//! injection.
//!
//! Every committed write or append recomputes the full result set of each
//! subscribed query on that collection and pushes it to the subscriber, the
//! same contract a remote snapshot listener offers. Faults (failed writes,
//! failed appends, broken subscriptions, latency) are injected per store so
//! tests can drive rollback and reconciliation paths deterministically.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::document::{
    DocumentStore, Precondition, Query, Snapshot, SnapshotResult, StoredDocument, Subscription,
};
use crate::error::StoreError;

/// In-memory document store.
///
/// Designed to be wrapped in `Arc` and shared by every controller of a
/// session.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, BTreeMap<String, Entry>>,
    subscribers: Vec<Subscriber>,
    faults: Faults,
    /// Monotonic insertion counter, used as the ordering tie-breaker.
    seq: u64,
    write_calls: usize,
    append_calls: usize,
}

struct Entry {
    version: u64,
    seq: u64,
    data: Value,
}

struct Subscriber {
    query: Query,
    tx: mpsc::UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
struct Faults {
    failing_writes: usize,
    failing_appends: HashSet<String>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Fault injection
    // -----------------------------------------------------------------------

    /// Make the next `count` calls to [`DocumentStore::write`] fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().faults.failing_writes = count;
    }

    /// Make every append to `collection` fail until [`Self::heal`] is called.
    pub fn fail_appends_to(&self, collection: &str) {
        self.lock().faults.failing_appends.insert(collection.to_string());
    }

    /// Delay every write and append by `latency` before it commits.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().faults.latency = Some(latency);
    }

    /// Clear every injected fault.
    pub fn heal(&self) {
        self.lock().faults = Faults::default();
    }

    /// Deliver an error to every subscriber of `collection` and detach them.
    pub fn break_subscriptions(&self, collection: &str) {
        let mut state = self.lock();
        state.subscribers.retain(|sub| {
            if sub.query.collection == collection {
                let _ = sub.tx.send(Err(StoreError::Unavailable(
                    "listener was terminated".to_string(),
                )));
                false
            } else {
                true
            }
        });
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Number of `write` calls received, including failed ones.
    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    /// Number of `append` calls received, including failed ones.
    pub fn append_calls(&self) -> usize {
        self.lock().append_calls
    }

    /// Number of documents currently stored in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Number of live subscriptions (closed receivers are pruned lazily).
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|sub| !sub.tx.is_closed());
        state.subscribers.len()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test thread panicked mid-write; the
        // map itself is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().faults.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl State {
    fn snapshot(&self, query: &Query) -> Snapshot {
        let Some(docs) = self.collections.get(&query.collection) else {
            return Vec::new();
        };

        let mut matching: Vec<&Entry> = docs.values().filter(|e| query.matches(&e.data)).collect();
        matching.sort_by(|a, b| {
            let by_field = query
                .order_by
                .as_deref()
                .map_or(Ordering::Equal, |field| {
                    compare_values(a.data.get(field), b.data.get(field))
                });
            by_field.then(a.seq.cmp(&b.seq))
        });
        matching.into_iter().map(|e| e.data.clone()).collect()
    }

    fn notify(&mut self, collection: &str) {
        let mut subscribers = std::mem::take(&mut self.subscribers);
        subscribers.retain(|sub| {
            if sub.query.collection != collection {
                return !sub.tx.is_closed();
            }
            sub.tx.send(Ok(self.snapshot(&sub.query))).is_ok()
        });
        self.subscribers = subscribers;
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// Order JSON values for `order_by`. RFC 3339 strings compare as instants;
/// missing values sort first.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => Ordering::Equal,
    }
}

fn as_object(collection: &str, value: Value) -> Result<serde_json::Map<String, Value>, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "documents in '{collection}' must be JSON objects, got {other}"
        ))),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let state = self.lock();
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|entry| StoredDocument {
                id: id.to_string(),
                version: entry.version,
                data: entry.data.clone(),
            }))
    }

    async fn write(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        precondition: Precondition,
    ) -> Result<u64, StoreError> {
        {
            let mut state = self.lock();
            state.write_calls += 1;
            if state.faults.failing_writes > 0 {
                state.faults.failing_writes -= 1;
                tracing::debug!(collection, id, "Injected write failure");
                return Err(StoreError::Unavailable("injected write failure".to_string()));
            }
        }

        self.simulate_latency().await;

        let patch = as_object(collection, patch)?;
        let mut state = self.lock();
        let seq = state.next_seq();
        let docs = state.collections.entry(collection.to_string()).or_default();

        let current_version = docs.get(id).map(|e| e.version);
        match (precondition, current_version) {
            (Precondition::None, _) => {}
            (Precondition::Exists | Precondition::Version(_), None) => {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            (Precondition::Version(expected), Some(actual)) if expected != actual => {
                return Err(StoreError::Conflict { expected, actual });
            }
            _ => {}
        }

        let entry = docs.entry(id.to_string()).or_insert_with(|| Entry {
            version: 0,
            seq,
            data: Value::Object(Default::default()),
        });
        if let Value::Object(existing) = &mut entry.data {
            existing.extend(patch);
            existing.insert("id".to_string(), Value::String(id.to_string()));
        }
        entry.version += 1;
        let version = entry.version;

        state.notify(collection);
        Ok(version)
    }

    async fn append(&self, collection: &str, document: Value) -> Result<String, StoreError> {
        {
            let mut state = self.lock();
            state.append_calls += 1;
            if state.faults.failing_appends.contains(collection) {
                tracing::debug!(collection, "Injected append failure");
                return Err(StoreError::Unavailable("injected append failure".to_string()));
            }
        }

        self.simulate_latency().await;

        let mut data = as_object(collection, document)?;
        let id = uuid::Uuid::new_v4().to_string();
        data.insert("id".to_string(), Value::String(id.clone()));

        let mut state = self.lock();
        let seq = state.next_seq();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(
                id.clone(),
                Entry {
                    version: 1,
                    seq,
                    data: Value::Object(data),
                },
            );

        state.notify(collection);
        Ok(id)
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        // Initial snapshot, so subscribers never start from an unknown state.
        let _ = tx.send(Ok(state.snapshot(&query)));
        state.subscribers.push(Subscriber { query, tx });
        Ok(Subscription::new(rx))
    }
}
