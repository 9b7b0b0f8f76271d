//! Typed repositories over the [`DocumentStore`](crate::DocumentStore).
//!
//! Each repository is a zero-sized struct with associated functions that
//! take the store as their first argument.

pub mod activity_repo;
pub mod comment_repo;
pub mod request_repo;

pub use activity_repo::ActivityRepo;
pub use comment_repo::CommentRepo;
pub use request_repo::RequestRepo;

/// A decoded document together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}
