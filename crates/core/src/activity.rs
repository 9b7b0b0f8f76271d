//! Activity log action types.
//!
//! Every confirmed mutation appends exactly one activity entry tagged with
//! one of these actions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happened to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    CreatedRequest,
    AssignedRequest,
    AddedPricing,
    AcceptedQuote,
    DeclinedQuote,
    StartedWork,
    PaidRequest,
    AddedComment,
    StatusChanged,
    AddedAttachment,
    UpdatedMilestone,
    UpdatedPipeline,
}

impl ActivityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityAction::CreatedRequest => "CREATED_REQUEST",
            ActivityAction::AssignedRequest => "ASSIGNED_REQUEST",
            ActivityAction::AddedPricing => "ADDED_PRICING",
            ActivityAction::AcceptedQuote => "ACCEPTED_QUOTE",
            ActivityAction::DeclinedQuote => "DECLINED_QUOTE",
            ActivityAction::StartedWork => "STARTED_WORK",
            ActivityAction::PaidRequest => "PAID_REQUEST",
            ActivityAction::AddedComment => "ADDED_COMMENT",
            ActivityAction::StatusChanged => "STATUS_CHANGED",
            ActivityAction::AddedAttachment => "ADDED_ATTACHMENT",
            ActivityAction::UpdatedMilestone => "UPDATED_MILESTONE",
            ActivityAction::UpdatedPipeline => "UPDATED_PIPELINE",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known activity categories, used to group the feed in the UI.
pub mod categories {
    pub const LIFECYCLE: &str = "lifecycle";
    pub const BILLING: &str = "billing";
    pub const DISCUSSION: &str = "discussion";
    pub const PLANNING: &str = "planning";
}

/// Map an action to its feed category.
pub fn action_category(action: ActivityAction) -> &'static str {
    match action {
        ActivityAction::AddedPricing
        | ActivityAction::AcceptedQuote
        | ActivityAction::DeclinedQuote
        | ActivityAction::PaidRequest => categories::BILLING,
        ActivityAction::AddedComment | ActivityAction::AddedAttachment => categories::DISCUSSION,
        ActivityAction::UpdatedMilestone | ActivityAction::UpdatedPipeline => categories::PLANNING,
        ActivityAction::CreatedRequest
        | ActivityAction::AssignedRequest
        | ActivityAction::StartedWork
        | ActivityAction::StatusChanged => categories::LIFECYCLE,
    }
}
