use portal_core::error::CoreError;
use portal_store::StoreError;

/// Error type returned by the sync layer.
///
/// Wraps [`CoreError`] for rule violations detected before any remote call
/// and [`StoreError`] for failures of the document store itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// A domain-level error from `portal_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed remote write or read.
    #[error("Remote write failed: {0}")]
    Store(#[from] StoreError),

    /// A live subscription errored.
    #[error("Subscription failed: {0}")]
    Subscription(StoreError),
}

/// Convenience alias for sync-layer results.
pub type SyncResult<T> = Result<T, SyncError>;

/// Coarse failure classes shown to users and used for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested status or milestone change is illegal from the current state.
    InvalidTransition,
    /// Malformed input or missing actor context; nothing was sent.
    Validation,
    /// The store rejected or failed the write.
    RemoteWriteFailure,
    /// A live view stream errored.
    SubscriptionFailure,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Core(CoreError::InvalidTransition { .. }) => ErrorKind::InvalidTransition,
            SyncError::Core(
                CoreError::Validation(_) | CoreError::Forbidden(_) | CoreError::NotFound { .. },
            ) => ErrorKind::Validation,
            SyncError::Core(CoreError::Conflict(_) | CoreError::Internal(_)) => {
                ErrorKind::RemoteWriteFailure
            }
            SyncError::Store(_) => ErrorKind::RemoteWriteFailure,
            SyncError::Subscription(_) => ErrorKind::SubscriptionFailure,
        }
    }

    /// Only remote write failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RemoteWriteFailure
    }

    /// Short human-readable text for a toast.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Core(CoreError::Validation(msg) | CoreError::Forbidden(msg)) => msg.clone(),
            SyncError::Core(core @ (CoreError::InvalidTransition { .. } | CoreError::NotFound { .. })) => {
                core.to_string()
            }
            SyncError::Store(StoreError::PermissionDenied(_)) => {
                "You do not have permission to make this change.".to_string()
            }
            SyncError::Store(StoreError::Conflict { .. }) | SyncError::Core(CoreError::Conflict(_)) => {
                "Someone else changed this request. Please try again.".to_string()
            }
            SyncError::Core(CoreError::Internal(_)) | SyncError::Store(_) => {
                "Could not save your change. Please try again.".to_string()
            }
            SyncError::Subscription(_) => "Live updates were interrupted.".to_string(),
        }
    }
}
