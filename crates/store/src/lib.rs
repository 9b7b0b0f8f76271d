//! Document store seam for the portal.
//!
//! - [`DocumentStore`] is the interface to the remote, eventually-consistent
//!   store: point reads, merge writes, appends, and full-snapshot
//!   subscriptions.
//! - [`MemoryStore`] is an in-process implementation with fault injection,
//!   used by tests and offline sessions.
//! - [`models`] and [`repositories`] give typed access to the `requests`,
//!   `comments`, and `activities` collections.

pub mod document;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;

pub use document::{DocumentStore, Precondition, Query, Snapshot, StoredDocument, Subscription};
pub use error::StoreError;
pub use memory::MemoryStore;
