//! Optimistic mutation controller.
//!
//! [`OptimisticMutation::execute`] applies a change to local state
//! synchronously, hands the remote write to the runtime, and returns
//! immediately. If the write fails the rollback hook runs exactly once with
//! the original input and the user is told through the [`Notifier`].
//!
//! Successful writes change nothing locally: confirmation arrives through
//! the live view that mirrors the store.

use std::sync::Arc;

use futures::future::BoxFuture;
use portal_core::error::CoreError;
use portal_events::Notifier;
use tokio::task::JoinHandle;

use crate::error::{SyncError, SyncResult};

type RemoteFn<V> = Arc<dyn Fn(V) -> BoxFuture<'static, SyncResult<()>> + Send + Sync>;
type ValidateFn<V> = Arc<dyn Fn(&V) -> SyncResult<()> + Send + Sync>;
type MutateFn<V> = Arc<dyn Fn(&V) + Send + Sync>;
type RollbackFn<V> = Arc<dyn Fn(&SyncError, &V) + Send + Sync>;

const DEFAULT_ERROR_TITLE: &str = "Update failed";

/// How a dispatched mutation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The remote write succeeded.
    Confirmed,
    /// The remote write failed and the local change was rolled back.
    RolledBack(SyncError),
}

impl MutationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, MutationOutcome::Confirmed)
    }
}

/// Handle to a mutation whose remote write is in flight.
///
/// Dropping the handle does not cancel the write.
#[derive(Debug)]
pub struct PendingMutation {
    handle: JoinHandle<MutationOutcome>,
}

impl PendingMutation {
    /// Wait until the remote write and any rollback have finished.
    pub async fn settled(self) -> MutationOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Mutation task did not complete");
                MutationOutcome::RolledBack(SyncError::Core(CoreError::Internal(e.to_string())))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// A reusable optimistic mutation over inputs of type `V`.
pub struct OptimisticMutation<V> {
    remote: RemoteFn<V>,
    validate: Option<ValidateFn<V>>,
    on_mutate: Option<MutateFn<V>>,
    on_rollback: Option<RollbackFn<V>>,
    notifier: Arc<dyn Notifier>,
    error_title: String,
    success: Option<(String, String)>,
}

impl<V> Clone for OptimisticMutation<V> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            validate: self.validate.clone(),
            on_mutate: self.on_mutate.clone(),
            on_rollback: self.on_rollback.clone(),
            notifier: Arc::clone(&self.notifier),
            error_title: self.error_title.clone(),
            success: self.success.clone(),
        }
    }
}

impl<V> OptimisticMutation<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a mutation that performs `remote` for each input.
    pub fn new<F>(notifier: Arc<dyn Notifier>, remote: F) -> Self
    where
        F: Fn(V) -> BoxFuture<'static, SyncResult<()>> + Send + Sync + 'static,
    {
        Self {
            remote: Arc::new(remote),
            validate: None,
            on_mutate: None,
            on_rollback: None,
            notifier,
            error_title: DEFAULT_ERROR_TITLE.to_string(),
            success: None,
        }
    }

    /// Checked before anything is applied. An error aborts `execute`.
    pub fn validate_with<F>(mut self, validate: F) -> Self
    where
        F: Fn(&V) -> SyncResult<()> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Applies the change to local state.
    pub fn on_mutate<F>(mut self, on_mutate: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.on_mutate = Some(Arc::new(on_mutate));
        self
    }

    /// Reverts the local change after a failed write.
    pub fn on_rollback<F>(mut self, on_rollback: F) -> Self
    where
        F: Fn(&SyncError, &V) + Send + Sync + 'static,
    {
        self.on_rollback = Some(Arc::new(on_rollback));
        self
    }

    pub fn error_title(mut self, title: impl Into<String>) -> Self {
        self.error_title = title.into();
        self
    }

    /// Show a success toast once the write is confirmed.
    pub fn success_message(mut self, title: impl Into<String>, detail: impl Into<String>) -> Self {
        self.success = Some((title.into(), detail.into()));
        self
    }

    /// Validate, apply locally, then dispatch the remote write.
    ///
    /// Must be called from within a tokio runtime. Returns as soon as the
    /// write is spawned.
    pub fn execute(&self, input: V) -> SyncResult<PendingMutation> {
        if let Some(validate) = &self.validate {
            validate(&input)?;
        }
        if let Some(on_mutate) = &self.on_mutate {
            on_mutate(&input);
        }

        let write = (self.remote)(input.clone());
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let result = write.await;
            this.settle(result, &input)
        });

        Ok(PendingMutation { handle })
    }

    fn settle(&self, result: SyncResult<()>, input: &V) -> MutationOutcome {
        match result {
            Ok(()) => {
                if let Some((title, detail)) = &self.success {
                    self.notifier.notify_success(title, detail);
                }
                MutationOutcome::Confirmed
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "Remote write failed, rolling back");
                if let Some(on_rollback) = &self.on_rollback {
                    on_rollback(&e, input);
                }
                self.notifier.notify_error(&self.error_title, &e.user_message());
                MutationOutcome::RolledBack(e)
            }
        }
    }
}
