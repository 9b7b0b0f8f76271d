//! Milestone status values and delivery-plan validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum number of milestones on one request.
pub const MAX_MILESTONES: usize = 50;

/// Status of one delivery phase. Any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl MilestoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "PENDING",
            MilestoneStatus::InProgress => "IN_PROGRESS",
            MilestoneStatus::Completed => "COMPLETED",
            MilestoneStatus::Blocked => "BLOCKED",
        }
    }
}

/// Compute `completedAt` after a status change.
///
/// Entering COMPLETED stamps `now`, staying COMPLETED keeps the previous
/// stamp, and leaving COMPLETED clears it.
pub fn completed_at_for(
    old: MilestoneStatus,
    new: MilestoneStatus,
    previous: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match (old, new) {
        (MilestoneStatus::Completed, MilestoneStatus::Completed) => previous.or(Some(now)),
        (_, MilestoneStatus::Completed) => Some(now),
        _ => None,
    }
}

/// Validate that `order` values are unique within one request.
pub fn validate_orders(orders: &[i32]) -> Result<(), CoreError> {
    if orders.len() > MAX_MILESTONES {
        return Err(CoreError::Validation(format!(
            "A request may have at most {MAX_MILESTONES} milestones, got {}",
            orders.len()
        )));
    }

    let mut seen = HashSet::with_capacity(orders.len());
    for order in orders {
        if !seen.insert(order) {
            return Err(CoreError::Validation(format!(
                "Milestone order {order} is used more than once"
            )));
        }
    }
    Ok(())
}

/// Validate that milestone ids are non-empty and unique.
pub fn validate_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(CoreError::Validation(
                "Milestone id must not be empty".to_string(),
            ));
        }
        if !seen.insert(id) {
            return Err(CoreError::Validation(format!(
                "Milestone id '{id}' is used more than once"
            )));
        }
    }
    Ok(())
}

/// Validate that the current-milestone weak reference points into the list.
pub fn validate_current<'a>(
    current: Option<&str>,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), CoreError> {
    let Some(current) = current else {
        return Ok(());
    };
    if ids.into_iter().any(|id| id == current) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Current milestone '{current}' is not part of this request"
        )))
    }
}
