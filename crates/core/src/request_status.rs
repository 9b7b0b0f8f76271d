//! Request status state machine and priority levels.
//!
//! The transition graph is the single source of truth for every status
//! change the lifecycle engine and the workboard perform. It is evaluated
//! before any remote write so an illegal move never reaches the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    New,
    Queued,
    Quoted,
    Accepted,
    Declined,
    InProgress,
    NeedsInfo,
    InReview,
    Delivered,
    Closed,
    Paid,
}

impl RequestStatus {
    /// Every status, in graph order.
    pub const ALL: [RequestStatus; 11] = [
        RequestStatus::New,
        RequestStatus::Queued,
        RequestStatus::Quoted,
        RequestStatus::Accepted,
        RequestStatus::Declined,
        RequestStatus::InProgress,
        RequestStatus::NeedsInfo,
        RequestStatus::InReview,
        RequestStatus::Delivered,
        RequestStatus::Closed,
        RequestStatus::Paid,
    ];

    /// Wire name, as stored in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::New => "NEW",
            RequestStatus::Queued => "QUEUED",
            RequestStatus::Quoted => "QUOTED",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Declined => "DECLINED",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::NeedsInfo => "NEEDS_INFO",
            RequestStatus::InReview => "IN_REVIEW",
            RequestStatus::Delivered => "DELIVERED",
            RequestStatus::Closed => "CLOSED",
            RequestStatus::Paid => "PAID",
        }
    }

    /// Returns the set of statuses this status may move to.
    ///
    /// Transition rules:
    /// - `NEW`         -> `QUEUED`, `QUOTED`
    /// - `QUEUED`      -> `IN_PROGRESS`, `QUOTED`
    /// - `QUOTED`      -> `ACCEPTED`, `DECLINED`
    /// - `ACCEPTED`    -> `IN_PROGRESS`
    /// - `IN_PROGRESS` -> `IN_REVIEW`
    /// - `IN_REVIEW`   -> `DELIVERED`, `NEEDS_INFO`
    /// - `NEEDS_INFO`  -> `IN_PROGRESS`
    /// - `DELIVERED`   -> `CLOSED`, `PAID`
    /// - `CLOSED`, `PAID`, `DECLINED` are terminal.
    pub fn valid_transitions(self) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match self {
            New => &[Queued, Quoted],
            Queued => &[InProgress, Quoted],
            Quoted => &[Accepted, Declined],
            Accepted => &[InProgress],
            InProgress => &[InReview],
            InReview => &[Delivered, NeedsInfo],
            NeedsInfo => &[InProgress],
            Delivered => &[Closed, Paid],
            Closed | Paid | Declined => &[],
        }
    }

    /// Check whether moving from `self` to `next` is allowed.
    pub fn can_transition(self, next: RequestStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// A terminal status has no outgoing transition.
    pub fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate that a status transition from `current` to `next` is allowed.
pub fn validate_transition(current: RequestStatus, next: RequestStatus) -> Result<(), CoreError> {
    if current.can_transition(next) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "request",
            from: current.to_string(),
            to: next.to_string(),
        })
    }
}

/// Validate that `current` is one of the statuses an operation may start from.
///
/// Used by operations whose target is fixed but whose legal predecessors are
/// narrower than the full graph (e.g. `start_work` from ACCEPTED or QUEUED).
pub fn validate_predecessor(
    current: RequestStatus,
    allowed: &[RequestStatus],
    target: RequestStatus,
) -> Result<(), CoreError> {
    if allowed.contains(&current) && current.can_transition(target) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "request",
            from: current.to_string(),
            to: target.to_string(),
        })
    }
}

/// Validate that a request is still open for non-status changes such as
/// assignment.
pub fn validate_not_terminal(current: RequestStatus) -> Result<(), CoreError> {
    if current.is_terminal() {
        return Err(CoreError::InvalidTransition {
            entity: "request",
            from: current.to_string(),
            to: current.to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Client-chosen urgency of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
