//! Request and milestone documents (`requests` collection).

use serde::{Deserialize, Serialize};
use portal_core::milestone::MilestoneStatus;
use portal_core::pricing::LineItem;
use portal_core::request_status::{Priority, RequestStatus};
use portal_core::types::{DocId, MinorUnits, Timestamp};

/// A unit of client work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: DocId,
    pub org_id: DocId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub request_type: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: RequestStatus,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub total_amount: MinorUnits,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub current_milestone_id: Option<DocId>,
    #[serde(default)]
    pub assigned_to_id: Option<DocId>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub created_by_id: Option<DocId>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub payment_id: Option<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub closed_at: Option<Timestamp>,
    #[serde(default)]
    pub paid_at: Option<Timestamp>,
}

impl Request {
    pub fn milestone(&self, id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }

    /// The milestone referenced by `current_milestone_id`, if it still exists.
    pub fn current_milestone(&self) -> Option<&Milestone> {
        self.current_milestone_id
            .as_deref()
            .and_then(|id| self.milestone(id))
    }
}

/// One phase of a request's delivery plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: DocId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: MilestoneStatus,
    pub order: i32,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

/// DTO for a client submitting a new request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub org_id: DocId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub request_type: String,
    #[serde(default)]
    pub priority: Priority,
}

/// Partial update of a request. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<MinorUnits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<Milestone>>,
    /// `Some(None)` clears the reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_milestone_id: Option<Option<DocId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<DocId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<Timestamp>,
}

impl RequestPatch {
    /// Apply the patch to a local copy, mirroring the store's merge.
    pub fn apply_to(&self, request: &mut Request) {
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(currency) = &self.currency {
            request.currency = Some(currency.clone());
        }
        if let Some(total) = self.total_amount {
            request.total_amount = total;
        }
        if let Some(items) = &self.line_items {
            request.line_items = items.clone();
        }
        if let Some(milestones) = &self.milestones {
            request.milestones = milestones.clone();
        }
        if let Some(current) = &self.current_milestone_id {
            request.current_milestone_id = current.clone();
        }
        if let Some(id) = &self.assigned_to_id {
            request.assigned_to_id = Some(id.clone());
        }
        if let Some(name) = &self.assigned_to_name {
            request.assigned_to_name = Some(name.clone());
        }
        if let Some(count) = self.comment_count {
            request.comment_count = count;
        }
        if let Some(payment_id) = &self.payment_id {
            request.payment_id = Some(payment_id.clone());
        }
        if let Some(at) = self.closed_at {
            request.closed_at = Some(at);
        }
        if let Some(at) = self.paid_at {
            request.paid_at = Some(at);
        }
    }
}
