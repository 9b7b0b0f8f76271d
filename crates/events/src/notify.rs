//! Toast notification surface.
//!
//! Controllers report the outcome of a mutation through [`Notifier`]. The UI
//! renders whatever implementation it is handed; [`ToastQueue`] buffers
//! toasts for the UI to drain and [`LogNotifier`] only traces them.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Receives user-visible mutation outcomes.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, title: &str, detail: &str);
    fn notify_error(&self, title: &str, detail: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

/// One rendered notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// Default number of toasts kept before the oldest is dropped.
pub const DEFAULT_TOAST_CAPACITY: usize = 50;

/// Bounded in-memory queue of toasts.
pub struct ToastQueue {
    toasts: Mutex<VecDeque<Toast>>,
    capacity: usize,
}

impl ToastQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            toasts: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Remove and return every queued toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.lock().drain(..).collect()
    }

    /// Copy of the queued toasts without consuming them.
    pub fn peek(&self) -> Vec<Toast> {
        self.lock().iter().cloned().collect()
    }

    /// Number of queued toasts at `level`.
    pub fn count(&self, level: ToastLevel) -> usize {
        self.lock().iter().filter(|t| t.level == level).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, level: ToastLevel, title: &str, detail: &str) {
        let mut toasts = self.lock();
        if toasts.len() == self.capacity {
            toasts.pop_front();
        }
        toasts.push_back(Toast {
            level,
            title: title.to_string(),
            detail: detail.to_string(),
            created_at: Utc::now(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_CAPACITY)
    }
}

impl Notifier for ToastQueue {
    fn notify_success(&self, title: &str, detail: &str) {
        self.push(ToastLevel::Success, title, detail);
    }

    fn notify_error(&self, title: &str, detail: &str) {
        self.push(ToastLevel::Error, title, detail);
    }
}

/// Notifier that only emits tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_success(&self, title: &str, detail: &str) {
        tracing::info!(title, detail, "Mutation succeeded");
    }

    fn notify_error(&self, title: &str, detail: &str) {
        tracing::warn!(title, detail, "Mutation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_keeps_order_and_levels() {
        let queue = ToastQueue::default();
        queue.notify_success("Saved", "Status updated");
        queue.notify_error("Failed", "Try again");

        assert_eq!(queue.count(ToastLevel::Error), 1);
        let toasts = queue.drain();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].level, ToastLevel::Success);
        assert_eq!(toasts[1].title, "Failed");
        assert!(queue.is_empty());
    }

    #[test]
    fn queue_drops_oldest_when_full() {
        let queue = ToastQueue::new(2);
        queue.notify_error("1", "");
        queue.notify_error("2", "");
        queue.notify_error("3", "");

        let titles: Vec<_> = queue.peek().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["2", "3"]);
    }
}
