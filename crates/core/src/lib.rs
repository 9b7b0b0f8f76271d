//! Domain rules for the work-request portal.
//!
//! This crate has zero internal deps so that the store, event, and sync
//! layers can all share the same status graph, pricing arithmetic, and
//! validation helpers. Nothing here performs I/O.

pub mod activity;
pub mod actor;
pub mod board;
pub mod comment;
pub mod error;
pub mod milestone;
pub mod pricing;
pub mod request_status;
pub mod types;
