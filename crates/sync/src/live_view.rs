//! Live view reconciler.
//!
//! A [`LiveView`] mirrors one store query. Every snapshot the subscription
//! delivers replaces the local collection wholesale. On top of that the view
//! keeps optimistic placeholders (`temp-N` ids) for records that were
//! created locally but not yet seen in a snapshot.
//!
//! A placeholder leaves the view exactly once, on whichever comes first:
//! a snapshot containing an equivalent record, the grace timeout, or
//! [`LiveView::discard_optimistic`] after a failed write. Grace timers are
//! children of the view's [`CancellationToken`], so dropping or
//! unsubscribing the view stops them all.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use portal_store::models::activity::ActivityLog;
use portal_store::models::comment::Comment;
use portal_store::models::request::Request;
use portal_store::{DocumentStore, Query, Snapshot, StoreError};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::error::SyncError;

/// Prefix of placeholder ids handed out by [`LiveView::reserve_placeholder_id`].
pub const PLACEHOLDER_PREFIX: &str = "temp-";

// ---------------------------------------------------------------------------
// LiveRecord
// ---------------------------------------------------------------------------

/// A document type that can be mirrored by a [`LiveView`].
pub trait LiveRecord: DeserializeOwned + Clone + Send + Sync + 'static {
    fn record_id(&self) -> &str;

    fn set_record_id(&mut self, id: String);

    /// Whether `self`, an authoritative record, confirms the optimistic
    /// placeholder `placeholder`.
    fn is_equivalent(&self, _placeholder: &Self) -> bool {
        false
    }
}

impl LiveRecord for Request {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn set_record_id(&mut self, id: String) {
        self.id = id;
    }
}

impl LiveRecord for Comment {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn set_record_id(&mut self, id: String) {
        self.id = id;
    }

    /// Same request, same author, same text.
    fn is_equivalent(&self, placeholder: &Self) -> bool {
        self.request_id == placeholder.request_id
            && self.user_id == placeholder.user_id
            && self.content == placeholder.content
    }
}

impl LiveRecord for ActivityLog {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn set_record_id(&mut self, id: String) {
        self.id = id;
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct PendingEntry<T> {
    temp_id: String,
    record: T,
    timer: CancellationToken,
    /// Equivalent authoritative records already present at insertion time.
    baseline: usize,
}

struct ViewState<T> {
    items: Vec<T>,
    pending: Vec<PendingEntry<T>>,
    closed: bool,
    next_temp: u64,
    last_error: Option<SyncError>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending: Vec::new(),
            closed: false,
            next_temp: 0,
            last_error: None,
        }
    }
}

struct Shared<T> {
    state: Mutex<ViewState<T>>,
    cancel: CancellationToken,
    grace: Duration,
    revision: watch::Sender<u64>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, ViewState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T: LiveRecord> Shared<T> {
    fn apply_snapshot(&self, snapshot: Snapshot) {
        let mut items = Vec::with_capacity(snapshot.len());
        for doc in snapshot {
            match serde_json::from_value::<T>(doc) {
                Ok(record) => items.push(record),
                Err(e) => tracing::warn!(error = %e, "Skipping undecodable document in snapshot"),
            }
        }

        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.items = items;
        state.last_error = None;

        let mut confirmed: Vec<T> = Vec::new();
        for entry in std::mem::take(&mut state.pending) {
            let seen = state
                .items
                .iter()
                .filter(|item| item.is_equivalent(&entry.record))
                .count();
            let claimed = confirmed
                .iter()
                .filter(|c| c.is_equivalent(&entry.record))
                .count();
            if seen > entry.baseline + claimed {
                entry.timer.cancel();
                tracing::debug!(temp_id = %entry.temp_id, "Optimistic entry confirmed");
                confirmed.push(entry.record);
            } else {
                state.pending.push(entry);
            }
        }
        drop(state);
        self.bump();
    }

    fn apply_error(&self, error: StoreError) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        tracing::error!(error = %error, "Live subscription failed, clearing view");
        state.items.clear();
        for entry in state.pending.drain(..) {
            entry.timer.cancel();
        }
        state.last_error = Some(SyncError::Subscription(error));
        drop(state);
        self.bump();
    }

    fn expire(&self, temp_id: &str) {
        if self.remove_pending(temp_id) {
            tracing::debug!(temp_id, "Optimistic entry expired unconfirmed");
        }
    }

    fn remove_pending(&self, temp_id: &str) -> bool {
        let mut state = self.lock();
        let Some(pos) = state.pending.iter().position(|p| p.temp_id == temp_id) else {
            return false;
        };
        let entry = state.pending.remove(pos);
        drop(state);
        entry.timer.cancel();
        self.bump();
        true
    }
}

// ---------------------------------------------------------------------------
// LiveView
// ---------------------------------------------------------------------------

/// Local mirror of a store query. Cheap to clone; clones share state.
pub struct LiveView<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for LiveView<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: LiveRecord> LiveView<T> {
    /// A view not attached to any subscription. Snapshots are fed with
    /// [`apply_snapshot`](Self::apply_snapshot).
    pub fn detached(grace: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ViewState::default()),
                cancel: CancellationToken::new(),
                grace,
                revision,
            }),
        }
    }

    /// Subscribe to `query` and keep the view in sync until unsubscribed or
    /// dropped.
    ///
    /// A failing subscription leaves the view empty; the error is logged
    /// and kept in [`last_error`](Self::last_error).
    pub async fn subscribe(store: &dyn DocumentStore, query: Query, config: &SyncConfig) -> Self {
        let view = Self::detached(config.optimistic_grace);
        let collection = query.collection.clone();

        let mut subscription = match store.subscribe(query).await {
            Ok(subscription) => subscription,
            Err(e) => {
                view.shared.apply_error(e);
                return view;
            }
        };

        let weak: Weak<Shared<T>> = Arc::downgrade(&view.shared);
        let cancel = view.shared.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = subscription.next() => {
                        let Some(shared) = weak.upgrade() else { break };
                        match next {
                            Some(Ok(snapshot)) => shared.apply_snapshot(snapshot),
                            Some(Err(e)) => shared.apply_error(e),
                            None => break,
                        }
                    }
                }
            }
            tracing::debug!(collection = %collection, "Live view detached");
        });

        view
    }

    /// Replace the authoritative collection and confirm matching placeholders.
    pub fn apply_snapshot(&self, snapshot: Snapshot) {
        self.shared.apply_snapshot(snapshot);
    }

    /// Reset the view after a subscription error.
    pub fn apply_error(&self, error: StoreError) {
        self.shared.apply_error(error);
    }

    /// Allocate the next `temp-N` id without inserting anything.
    pub fn reserve_placeholder_id(&self) -> String {
        let mut state = self.shared.lock();
        state.next_temp += 1;
        format!("{PLACEHOLDER_PREFIX}{}", state.next_temp)
    }

    /// Show `record` under `temp_id` until it is confirmed, expires, or is
    /// discarded.
    pub fn insert_optimistic_as(&self, temp_id: String, mut record: T) {
        record.set_record_id(temp_id.clone());

        let mut state = self.shared.lock();
        if state.closed {
            return;
        }
        let baseline = state
            .items
            .iter()
            .filter(|item| item.is_equivalent(&record))
            .count();
        let timer = self.shared.cancel.child_token();
        state.pending.push(PendingEntry {
            temp_id: temp_id.clone(),
            record,
            timer: timer.clone(),
            baseline,
        });
        drop(state);
        self.shared.bump();

        let weak = Arc::downgrade(&self.shared);
        let grace = self.shared.grace;
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(grace) => {
                    if let Some(shared) = weak.upgrade() {
                        shared.expire(&temp_id);
                    }
                }
            }
        });
    }

    /// Insert a placeholder under a fresh id and return the id.
    pub fn insert_optimistic(&self, record: T) -> String {
        let temp_id = self.reserve_placeholder_id();
        self.insert_optimistic_as(temp_id.clone(), record);
        temp_id
    }

    /// Remove a placeholder after its write failed. Returns `false` if it
    /// was already confirmed or expired.
    pub fn discard_optimistic(&self, temp_id: &str) -> bool {
        self.shared.remove_pending(temp_id)
    }

    /// Patch a record in place until the next snapshot arrives.
    pub fn update_local(&self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        let mut state = self.shared.lock();
        let ViewState { items, pending, .. } = &mut *state;
        let target = items
            .iter_mut()
            .find(|item| item.record_id() == id)
            .or_else(|| {
                pending
                    .iter_mut()
                    .map(|p| &mut p.record)
                    .find(|r| r.record_id() == id)
            });
        let Some(record) = target else {
            return false;
        };
        f(record);
        self.shared.bump();
        true
    }

    /// Authoritative records followed by pending placeholders, in insertion order.
    pub fn items(&self) -> Vec<T> {
        let state = self.shared.lock();
        state
            .items
            .iter()
            .cloned()
            .chain(state.pending.iter().map(|p| p.record.clone()))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.items().into_iter().find(|r| r.record_id() == id)
    }

    pub fn is_pending(&self, temp_id: &str) -> bool {
        self.shared.lock().pending.iter().any(|p| p.temp_id == temp_id)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// The most recent subscription error, cleared by the next snapshot.
    pub fn last_error(&self) -> Option<SyncError> {
        self.shared.lock().last_error.clone()
    }

    /// Stop applying snapshots and cancel every grace timer. Idempotent.
    pub fn unsubscribe(&self) {
        let mut state = self.shared.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.shared.cancel.cancel();
        tracing::debug!("Live view unsubscribed");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Revision counter bumped on every local change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Wait until `pred` holds for the current items.
    pub async fn wait_until(&self, pred: impl Fn(&[T]) -> bool) {
        let mut rx = self.changes();
        loop {
            if pred(&self.items()) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl LiveRecord for Note {
        fn record_id(&self) -> &str {
            &self.id
        }

        fn set_record_id(&mut self, id: String) {
            self.id = id;
        }

        fn is_equivalent(&self, placeholder: &Self) -> bool {
            self.text == placeholder.text
        }
    }

    fn note(text: &str) -> Note {
        Note {
            id: String::new(),
            text: text.into(),
        }
    }

    fn texts(view: &LiveView<Note>) -> Vec<String> {
        view.items().into_iter().map(|n| n.text).collect()
    }

    #[tokio::test]
    async fn snapshot_replaces_everything() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        view.apply_snapshot(vec![json!({"id": "a", "text": "A"}), json!({"id": "b", "text": "B"})]);
        view.apply_snapshot(vec![json!({"id": "c", "text": "C"})]);
        assert_eq!(texts(&view), vec!["C"]);
    }

    #[tokio::test]
    async fn undecodable_documents_are_skipped() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        view.apply_snapshot(vec![json!({"id": "a"}), json!({"id": "b", "text": "B"})]);
        assert_eq!(texts(&view), vec!["B"]);
    }

    #[tokio::test]
    async fn placeholder_ids_count_up() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        assert_eq!(view.insert_optimistic(note("x")), "temp-1");
        assert_eq!(view.reserve_placeholder_id(), "temp-2");
        assert_eq!(view.insert_optimistic(note("y")), "temp-3");
    }

    #[tokio::test]
    async fn equivalent_snapshot_confirms_placeholder() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        let temp = view.insert_optimistic(note("hello"));
        assert_eq!(texts(&view), vec!["hello"]);

        view.apply_snapshot(vec![json!({"id": "other", "text": "unrelated"})]);
        assert!(view.is_pending(&temp));

        view.apply_snapshot(vec![json!({"id": "real", "text": "hello"})]);
        assert!(!view.is_pending(&temp));
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.items()[0].id, "real");
    }

    #[tokio::test]
    async fn repeated_text_needs_a_new_record() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        view.apply_snapshot(vec![json!({"id": "old", "text": "+1"})]);
        let temp = view.insert_optimistic(note("+1"));

        view.apply_snapshot(vec![json!({"id": "old", "text": "+1"})]);
        assert!(view.is_pending(&temp));

        view.apply_snapshot(vec![
            json!({"id": "old", "text": "+1"}),
            json!({"id": "new", "text": "+1"}),
        ]);
        assert!(!view.is_pending(&temp));
    }

    #[tokio::test]
    async fn update_local_patches_until_next_snapshot() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        view.apply_snapshot(vec![json!({"id": "a", "text": "A"})]);

        assert!(view.update_local("a", |n| n.text = "patched".into()));
        assert!(!view.update_local("missing", |n| n.text = "x".into()));
        assert_eq!(texts(&view), vec!["patched"]);

        view.apply_snapshot(vec![json!({"id": "a", "text": "A"})]);
        assert_eq!(texts(&view), vec!["A"]);
    }

    #[tokio::test]
    async fn error_resets_to_empty() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        view.apply_snapshot(vec![json!({"id": "a", "text": "A"})]);
        view.insert_optimistic(note("draft"));

        view.apply_error(StoreError::Unavailable("lost".into()));
        assert!(view.items().is_empty());
        assert!(matches!(view.last_error(), Some(SyncError::Subscription(_))));
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_freezes_view() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        view.apply_snapshot(vec![json!({"id": "a", "text": "A"})]);
        view.unsubscribe();
        view.unsubscribe();

        view.apply_snapshot(vec![json!({"id": "b", "text": "B"})]);
        assert_eq!(texts(&view), vec!["A"]);
        assert!(view.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_expires_after_grace() {
        let view = LiveView::<Note>::detached(Duration::from_secs(10));
        let temp = view.insert_optimistic(note("lost"));

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(view.is_pending(&temp));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!view.is_pending(&temp));
        assert!(view.items().is_empty());
    }
}
