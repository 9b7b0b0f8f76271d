//! Request detail screen: one live request with its quote and delivery plan.

use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use portal_core::actor::ActorContext;
use portal_core::error::CoreError;
use portal_core::milestone::{self, MilestoneStatus};
use portal_core::types::Timestamp;
use portal_events::Notifier;
use portal_store::models::request::Request;
use portal_store::Query;
use portal_store::repositories::RequestRepo;

use crate::engine::RequestLifecycleEngine;
use crate::error::SyncResult;
use crate::live_view::LiveView;
use crate::optimistic::{OptimisticMutation, PendingMutation};

/// A milestone status flip, with what to restore if the write fails.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneChange {
    pub request_id: String,
    pub milestone_id: String,
    pub new_status: MilestoneStatus,
    pub old_status: MilestoneStatus,
    pub old_completed_at: Option<Timestamp>,
}

/// Query matching a single request document.
pub fn request_query(request_id: &str) -> Query {
    Query::collection(RequestRepo::COLLECTION).where_eq("id", request_id)
}

pub struct RequestDetail {
    request_id: String,
    view: LiveView<Request>,
    engine: Arc<RequestLifecycleEngine>,
    actor: ActorContext,
    notifier: Arc<dyn Notifier>,
    milestones: OptimisticMutation<MilestoneChange>,
}

impl RequestDetail {
    pub fn new(
        request_id: &str,
        view: LiveView<Request>,
        engine: Arc<RequestLifecycleEngine>,
        actor: ActorContext,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let applied = view.clone();
        let restored = view.clone();
        let remote_engine = Arc::clone(&engine);
        let remote_actor = actor.clone();

        let milestones = OptimisticMutation::new(notifier.clone(), move |change: MilestoneChange| {
            let engine = Arc::clone(&remote_engine);
            let actor = remote_actor.clone();
            async move {
                engine
                    .update_milestone_status(&actor, &change.request_id, &change.milestone_id, change.new_status)
                    .await
                    .map(|_| ())
            }
            .boxed()
        })
        .on_mutate(move |change| {
            let now = Utc::now();
            applied.update_local(&change.request_id, |r| {
                if let Some(m) = r.milestones.iter_mut().find(|m| m.id == change.milestone_id) {
                    m.completed_at =
                        milestone::completed_at_for(m.status, change.new_status, m.completed_at, now);
                    m.status = change.new_status;
                }
            });
        })
        .on_rollback(move |_, change| {
            restored.update_local(&change.request_id, |r| {
                if let Some(m) = r.milestones.iter_mut().find(|m| m.id == change.milestone_id) {
                    m.status = change.old_status;
                    m.completed_at = change.old_completed_at;
                }
            });
        })
        .error_title("Milestone not updated");

        Self {
            request_id: request_id.to_string(),
            view,
            engine,
            actor,
            notifier,
            milestones,
        }
    }

    /// The request as currently known, including unconfirmed local edits.
    pub fn request(&self) -> Option<Request> {
        self.view.get(&self.request_id)
    }

    pub fn view(&self) -> &LiveView<Request> {
        &self.view
    }

    /// Flip a milestone between COMPLETED and PENDING.
    pub fn toggle_milestone(&self, milestone_id: &str) -> SyncResult<PendingMutation> {
        self.actor.require_agency("update milestones")?;
        let request = self.request().ok_or_else(|| CoreError::NotFound {
            entity: "request",
            id: self.request_id.clone(),
        })?;
        let current = request.milestone(milestone_id).ok_or_else(|| CoreError::NotFound {
            entity: "milestone",
            id: milestone_id.to_string(),
        })?;

        let new_status = if current.status == MilestoneStatus::Completed {
            MilestoneStatus::Pending
        } else {
            MilestoneStatus::Completed
        };
        self.milestones.execute(MilestoneChange {
            request_id: self.request_id.clone(),
            milestone_id: milestone_id.to_string(),
            new_status,
            old_status: current.status,
            old_completed_at: current.completed_at,
        })
    }

    pub async fn accept_quote(&self) -> SyncResult<Request> {
        let result = self.engine.accept_quote(&self.actor, &self.request_id).await;
        self.report(result, "Quote accepted", "Work will be scheduled shortly.")
    }

    pub async fn decline_quote(&self) -> SyncResult<Request> {
        let result = self.engine.decline_quote(&self.actor, &self.request_id).await;
        self.report(result, "Quote declined", "The agency has been notified.")
    }

    pub async fn request_revision(&self, notes: &str) -> SyncResult<Request> {
        let result = self
            .engine
            .request_revision(&self.actor, &self.request_id, notes)
            .await;
        self.report(result, "Revision requested", "The agency will follow up.")
    }

    pub async fn mark_paid(&self, payment_id: &str) -> SyncResult<Request> {
        let result = self
            .engine
            .mark_paid(&self.actor, &self.request_id, payment_id)
            .await;
        self.report(result, "Payment recorded", "Thank you!")
    }

    fn report(&self, result: SyncResult<Request>, title: &str, detail: &str) -> SyncResult<Request> {
        match &result {
            Ok(_) => self.notifier.notify_success(title, detail),
            Err(e) => self.notifier.notify_error("Action failed", &e.user_message()),
        }
        result
    }
}
