//! Request lifecycle and optimistic synchronization for the work-request
//! portal.
//!
//! - [`engine::RequestLifecycleEngine`] validates and performs every
//!   request mutation (status graph, pricing, milestones).
//! - [`optimistic::OptimisticMutation`] applies a local change at once and
//!   rolls it back if the remote write fails.
//! - [`live_view::LiveView`] mirrors a store query and reconciles
//!   authoritative snapshots with pending optimistic entries.
//! - [`workboard::Workboard`], [`detail::RequestDetail`] and
//!   [`thread::CommentThread`] are the screen controllers built on top.
//! - [`session::PortalSession`] wires them together for one signed-in actor.

pub mod comments;
pub mod config;
pub mod detail;
pub mod engine;
pub mod error;
pub mod live_view;
pub mod optimistic;
pub mod session;
pub mod telemetry;
pub mod thread;
pub mod workboard;

pub use config::SyncConfig;
pub use engine::RequestLifecycleEngine;
pub use error::{ErrorKind, SyncError, SyncResult};
pub use live_view::{LiveRecord, LiveView};
pub use optimistic::{MutationOutcome, OptimisticMutation, PendingMutation};
pub use session::PortalSession;
