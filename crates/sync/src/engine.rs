//! Request lifecycle engine.
//!
//! Every operation runs in three steps:
//!
//! 1. Validate the actor and the input without touching the store.
//! 2. Read the freshest request and plan the change against it. Planning is
//!    pure and fails with `InvalidTransition` when the current status is
//!    not a legal predecessor.
//! 3. Commit: one versioned write of the request, then one activity
//!    append, then one bus event. A failed write stops here, so nothing is
//!    logged for a change that never happened. A failed append is logged
//!    and the operation still succeeds.

use std::sync::Arc;

use chrono::Utc;
use portal_core::activity::ActivityAction;
use portal_core::actor::ActorContext;
use portal_core::error::CoreError;
use portal_core::milestone::{self, MilestoneStatus};
use portal_core::pricing::{self, LineItem};
use portal_core::request_status::{self, RequestStatus};
use portal_core::types::Timestamp;
use portal_events::activity;
use portal_events::bus::{event_types, EventBus, PortalEvent};
use portal_events::ActivityLogger;
use portal_store::models::request::{CreateRequest, Milestone, Request, RequestPatch};
use portal_store::repositories::{RequestRepo, Versioned};
use portal_store::DocumentStore;
use serde_json::json;

use crate::error::SyncResult;

/// Maximum length of a request title.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of revision notes.
pub const MAX_REVISION_NOTES_LENGTH: usize = 5_000;

/// A planned change to one request: the patch plus what to record about it.
#[derive(Debug, Clone)]
pub struct Change {
    pub patch: RequestPatch,
    pub action: ActivityAction,
    pub event_type: &'static str,
    pub details: serde_json::Value,
}

/// Owns the request state machine and its side effects.
pub struct RequestLifecycleEngine {
    store: Arc<dyn DocumentStore>,
    activity: ActivityLogger,
    bus: Arc<EventBus>,
}

impl RequestLifecycleEngine {
    pub fn new(store: Arc<dyn DocumentStore>, activity: ActivityLogger, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            activity,
            bus,
        }
    }

    /// Submit a new request in status NEW.
    pub async fn create_request(
        &self,
        actor: &ActorContext,
        input: &CreateRequest,
    ) -> SyncResult<Request> {
        actor.validate()?;
        validate_new_request(input)?;

        let request = RequestRepo::create(
            self.store.as_ref(),
            input,
            &actor.user_id,
            &actor.user_name,
            Utc::now(),
        )
        .await?;

        let details = json!({ "title": request.title, "priority": request.priority });
        self.record(
            actor,
            &request,
            ActivityAction::CreatedRequest,
            event_types::REQUEST_CREATED,
            details,
        )
        .await;

        tracing::info!(request_id = %request.id, org_id = %request.org_id, "Request created");
        Ok(request)
    }

    /// Assign a staff member. Legal from any non-terminal status.
    pub async fn assign_request(
        &self,
        actor: &ActorContext,
        request_id: &str,
        staff_id: &str,
        staff_name: &str,
    ) -> SyncResult<Request> {
        actor.require_agency("assign requests")?;
        if staff_id.trim().is_empty() || staff_name.trim().is_empty() {
            return Err(CoreError::Validation("Assignee id and name are required".to_string()).into());
        }

        let current = self.load(request_id).await?;
        let change = plan_assign(&current.record, staff_id, staff_name)?;
        self.commit(actor, current, change).await
    }

    /// Price the request and move it to QUOTED.
    pub async fn add_pricing(
        &self,
        actor: &ActorContext,
        request_id: &str,
        line_items: Vec<LineItem>,
        currency: &str,
    ) -> SyncResult<Request> {
        actor.require_agency("set pricing")?;
        pricing::validate_line_items(&line_items)?;
        pricing::validate_currency(currency)?;

        let current = self.load(request_id).await?;
        let change = plan_add_pricing(&current.record, line_items, currency)?;
        self.commit(actor, current, change).await
    }

    /// Client accepts the quote: QUOTED -> ACCEPTED.
    pub async fn accept_quote(&self, actor: &ActorContext, request_id: &str) -> SyncResult<Request> {
        actor.validate()?;
        let current = self.load(request_id).await?;
        let change = plan_quote_response(&current.record, true)?;
        self.commit(actor, current, change).await
    }

    /// Client declines the quote: QUOTED -> DECLINED.
    pub async fn decline_quote(&self, actor: &ActorContext, request_id: &str) -> SyncResult<Request> {
        actor.validate()?;
        let current = self.load(request_id).await?;
        let change = plan_quote_response(&current.record, false)?;
        self.commit(actor, current, change).await
    }

    /// Begin work from ACCEPTED or QUEUED.
    pub async fn start_work(&self, actor: &ActorContext, request_id: &str) -> SyncResult<Request> {
        actor.require_agency("start work")?;
        let current = self.load(request_id).await?;
        let change = plan_start_work(&current.record)?;
        self.commit(actor, current, change).await
    }

    /// Record payment of a delivered request.
    pub async fn mark_paid(
        &self,
        actor: &ActorContext,
        request_id: &str,
        payment_id: &str,
    ) -> SyncResult<Request> {
        actor.validate()?;
        if payment_id.trim().is_empty() {
            return Err(CoreError::Validation("Payment id is required".to_string()).into());
        }
        let current = self.load(request_id).await?;
        let change = plan_mark_paid(&current.record, payment_id, Utc::now())?;
        self.commit(actor, current, change).await
    }

    /// Staff escape hatch: move along any edge of the status graph.
    pub async fn update_status(
        &self,
        actor: &ActorContext,
        request_id: &str,
        new_status: RequestStatus,
    ) -> SyncResult<Request> {
        actor.require_agency("change request status")?;
        let current = self.load(request_id).await?;
        let change = plan_update_status(&current.record, new_status, Utc::now())?;
        self.commit(actor, current, change).await
    }

    /// Set one milestone's status. Any status may follow any other.
    pub async fn update_milestone_status(
        &self,
        actor: &ActorContext,
        request_id: &str,
        milestone_id: &str,
        status: MilestoneStatus,
    ) -> SyncResult<Request> {
        actor.require_agency("update milestones")?;
        let current = self.load(request_id).await?;
        let change = plan_milestone_status(&current.record, milestone_id, status, Utc::now())?;
        self.commit(actor, current, change).await
    }

    /// Send a request in review back for more information.
    pub async fn request_revision(
        &self,
        actor: &ActorContext,
        request_id: &str,
        notes: &str,
    ) -> SyncResult<Request> {
        actor.validate()?;
        if notes.len() > MAX_REVISION_NOTES_LENGTH {
            return Err(CoreError::Validation(format!(
                "Revision notes exceed {MAX_REVISION_NOTES_LENGTH} characters"
            ))
            .into());
        }
        let current = self.load(request_id).await?;
        let change = plan_request_revision(&current.record, notes)?;
        self.commit(actor, current, change).await
    }

    /// Replace the whole delivery plan.
    pub async fn update_pipeline(
        &self,
        actor: &ActorContext,
        request_id: &str,
        milestones: Vec<Milestone>,
        current_milestone_id: Option<String>,
    ) -> SyncResult<Request> {
        actor.require_agency("edit the delivery plan")?;
        validate_pipeline(&milestones, current_milestone_id.as_deref())?;
        let current = self.load(request_id).await?;
        let change = plan_pipeline(&current.record, milestones, current_milestone_id);
        self.commit(actor, current, change).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn load(&self, request_id: &str) -> SyncResult<Versioned<Request>> {
        RequestRepo::find_by_id(self.store.as_ref(), request_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "request",
                    id: request_id.to_string(),
                }
                .into()
            })
    }

    async fn commit(
        &self,
        actor: &ActorContext,
        current: Versioned<Request>,
        change: Change,
    ) -> SyncResult<Request> {
        let Versioned {
            version,
            record: mut request,
        } = current;

        if let Err(e) = RequestRepo::update(self.store.as_ref(), &request.id, &change.patch, version).await {
            tracing::warn!(
                request_id = %request.id,
                action = %change.action,
                error = %e,
                "Request write failed",
            );
            return Err(e.into());
        }

        change.patch.apply_to(&mut request);
        self.record(actor, &request, change.action, change.event_type, change.details)
            .await;

        tracing::info!(
            request_id = %request.id,
            action = %change.action,
            status = %request.status,
            "Request updated",
        );
        Ok(request)
    }

    /// Append the activity entry and publish the bus event for a confirmed write.
    async fn record(
        &self,
        actor: &ActorContext,
        request: &Request,
        action: ActivityAction,
        event_type: &'static str,
        details: serde_json::Value,
    ) {
        self.activity
            .append(activity::entry(
                action,
                &request.org_id,
                Some(request.id.as_str()),
                actor,
                details.clone(),
            ))
            .await;

        self.bus.publish(
            PortalEvent::new(event_type)
                .for_request(&request.org_id, &request.id)
                .with_actor(&actor.user_id)
                .with_payload(details),
        );
    }
}

// ---------------------------------------------------------------------------
// Planning (pure)
// ---------------------------------------------------------------------------

fn validate_new_request(input: &CreateRequest) -> Result<(), CoreError> {
    if input.org_id.trim().is_empty() {
        return Err(CoreError::Validation("Organization id is required".to_string()));
    }
    if input.title.trim().is_empty() {
        return Err(CoreError::Validation("Request title is required".to_string()));
    }
    if input.title.len() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Request title exceeds {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_pipeline(milestones: &[Milestone], current: Option<&str>) -> Result<(), CoreError> {
    let orders: Vec<i32> = milestones.iter().map(|m| m.order).collect();
    milestone::validate_orders(&orders)?;
    milestone::validate_ids(milestones.iter().map(|m| m.id.as_str()))?;
    if milestones.iter().any(|m| m.title.trim().is_empty()) {
        return Err(CoreError::Validation("Every milestone needs a title".to_string()));
    }
    milestone::validate_current(current, milestones.iter().map(|m| m.id.as_str()))
}

fn status_change(from: RequestStatus, to: RequestStatus) -> serde_json::Value {
    json!({ "from": from, "to": to })
}

pub fn plan_assign(request: &Request, staff_id: &str, staff_name: &str) -> Result<Change, CoreError> {
    request_status::validate_not_terminal(request.status)?;
    Ok(Change {
        patch: RequestPatch {
            assigned_to_id: Some(staff_id.to_string()),
            assigned_to_name: Some(staff_name.to_string()),
            ..Default::default()
        },
        action: ActivityAction::AssignedRequest,
        event_type: event_types::REQUEST_ASSIGNED,
        details: json!({
            "assignedToId": staff_id,
            "assignedToName": staff_name,
            "previousAssigneeId": request.assigned_to_id,
        }),
    })
}

pub fn plan_add_pricing(
    request: &Request,
    line_items: Vec<LineItem>,
    currency: &str,
) -> Result<Change, CoreError> {
    request_status::validate_predecessor(
        request.status,
        &[RequestStatus::New, RequestStatus::Queued],
        RequestStatus::Quoted,
    )?;
    let total = pricing::compute_total(&line_items)?;
    Ok(Change {
        details: json!({
            "totalAmount": total,
            "currency": currency,
            "lineItemCount": line_items.len(),
        }),
        patch: RequestPatch {
            status: Some(RequestStatus::Quoted),
            currency: Some(currency.to_string()),
            total_amount: Some(total),
            line_items: Some(line_items),
            ..Default::default()
        },
        action: ActivityAction::AddedPricing,
        event_type: event_types::REQUEST_QUOTED,
    })
}

pub fn plan_quote_response(request: &Request, accepted: bool) -> Result<Change, CoreError> {
    let (target, action) = if accepted {
        (RequestStatus::Accepted, ActivityAction::AcceptedQuote)
    } else {
        (RequestStatus::Declined, ActivityAction::DeclinedQuote)
    };
    request_status::validate_predecessor(request.status, &[RequestStatus::Quoted], target)?;
    Ok(Change {
        patch: RequestPatch {
            status: Some(target),
            ..Default::default()
        },
        action,
        event_type: event_types::REQUEST_STATUS_CHANGED,
        details: json!({
            "from": request.status,
            "to": target,
            "totalAmount": request.total_amount,
            "currency": request.currency,
        }),
    })
}

pub fn plan_start_work(request: &Request) -> Result<Change, CoreError> {
    request_status::validate_predecessor(
        request.status,
        &[RequestStatus::Accepted, RequestStatus::Queued],
        RequestStatus::InProgress,
    )?;
    Ok(Change {
        patch: RequestPatch {
            status: Some(RequestStatus::InProgress),
            ..Default::default()
        },
        action: ActivityAction::StartedWork,
        event_type: event_types::REQUEST_STATUS_CHANGED,
        details: status_change(request.status, RequestStatus::InProgress),
    })
}

pub fn plan_mark_paid(request: &Request, payment_id: &str, now: Timestamp) -> Result<Change, CoreError> {
    request_status::validate_predecessor(request.status, &[RequestStatus::Delivered], RequestStatus::Paid)?;
    Ok(Change {
        patch: RequestPatch {
            status: Some(RequestStatus::Paid),
            payment_id: Some(payment_id.to_string()),
            paid_at: Some(now),
            ..Default::default()
        },
        action: ActivityAction::PaidRequest,
        event_type: event_types::REQUEST_PAID,
        details: json!({
            "paymentId": payment_id,
            "totalAmount": request.total_amount,
            "currency": request.currency,
        }),
    })
}

pub fn plan_update_status(
    request: &Request,
    new_status: RequestStatus,
    now: Timestamp,
) -> Result<Change, CoreError> {
    request_status::validate_transition(request.status, new_status)?;
    Ok(Change {
        patch: RequestPatch {
            status: Some(new_status),
            closed_at: (new_status == RequestStatus::Closed).then_some(now),
            paid_at: (new_status == RequestStatus::Paid).then_some(now),
            ..Default::default()
        },
        action: ActivityAction::StatusChanged,
        event_type: event_types::REQUEST_STATUS_CHANGED,
        details: status_change(request.status, new_status),
    })
}

pub fn plan_request_revision(request: &Request, notes: &str) -> Result<Change, CoreError> {
    request_status::validate_predecessor(request.status, &[RequestStatus::InReview], RequestStatus::NeedsInfo)?;
    Ok(Change {
        patch: RequestPatch {
            status: Some(RequestStatus::NeedsInfo),
            ..Default::default()
        },
        action: ActivityAction::StatusChanged,
        event_type: event_types::REQUEST_STATUS_CHANGED,
        details: json!({
            "from": request.status,
            "to": RequestStatus::NeedsInfo,
            "notes": notes,
        }),
    })
}

pub fn plan_milestone_status(
    request: &Request,
    milestone_id: &str,
    status: MilestoneStatus,
    now: Timestamp,
) -> Result<Change, CoreError> {
    let Some(existing) = request.milestone(milestone_id) else {
        return Err(CoreError::NotFound {
            entity: "milestone",
            id: milestone_id.to_string(),
        });
    };
    let from = existing.status;

    let milestones: Vec<Milestone> = request
        .milestones
        .iter()
        .map(|m| {
            if m.id != milestone_id {
                return m.clone();
            }
            Milestone {
                status,
                completed_at: milestone::completed_at_for(m.status, status, m.completed_at, now),
                ..m.clone()
            }
        })
        .collect();

    Ok(Change {
        patch: RequestPatch {
            milestones: Some(milestones),
            ..Default::default()
        },
        action: ActivityAction::UpdatedMilestone,
        event_type: event_types::MILESTONE_UPDATED,
        details: json!({
            "milestoneId": milestone_id,
            "milestoneTitle": existing.title,
            "from": from,
            "to": status,
        }),
    })
}

pub fn plan_pipeline(
    request: &Request,
    mut milestones: Vec<Milestone>,
    current_milestone_id: Option<String>,
) -> Change {
    milestones.sort_by_key(|m| m.order);
    Change {
        details: json!({
            "milestoneCount": milestones.len(),
            "previousCount": request.milestones.len(),
            "currentMilestoneId": current_milestone_id,
        }),
        patch: RequestPatch {
            milestones: Some(milestones),
            current_milestone_id: Some(current_milestone_id),
            ..Default::default()
        },
        action: ActivityAction::UpdatedPipeline,
        event_type: event_types::PIPELINE_UPDATED,
    }
}
