//! Side-effect channels of the portal core.
//!
//! - [`ActivityLogger`]: append-only audit trail, written after every
//!   confirmed mutation. Failures are logged and never roll back the
//!   mutation itself.
//! - [`EventBus`] / [`PortalEvent`]: in-process publish/subscribe hub backed
//!   by `tokio::sync::broadcast`, feeding notification consumers.
//! - [`Notifier`]: the toast surface the controllers report outcomes to.

pub mod activity;
pub mod bus;
pub mod notify;

pub use activity::ActivityLogger;
pub use bus::{EventBus, PortalEvent};
pub use notify::{LogNotifier, Notifier, Toast, ToastLevel, ToastQueue};
