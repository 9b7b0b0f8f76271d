//! Kanban board over an organization's requests.
//!
//! Cards are grouped into the fixed [`DEFAULT_COLUMNS`]. Dropping a card on
//! another column moves it locally at once and sends the status change
//! through the lifecycle engine; a failed write puts the card back.

use std::sync::Arc;

use futures::FutureExt;
use portal_core::actor::ActorContext;
use portal_core::board::{self, BoardColumn, DEFAULT_COLUMNS};
use portal_core::request_status::{self, RequestStatus};
use portal_events::Notifier;
use portal_store::models::request::Request;

use crate::engine::RequestLifecycleEngine;
use crate::error::SyncError;
use crate::live_view::LiveView;
use crate::optimistic::{OptimisticMutation, PendingMutation};

const REJECTED_TITLE: &str = "Cannot move request";

/// A card move, as applied locally and sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub request_id: String,
    pub new_status: RequestStatus,
    pub old_status: RequestStatus,
}

/// Result of [`Workboard::on_drop`].
#[derive(Debug)]
pub enum DropOutcome {
    /// Dropped on its own column.
    Unchanged,
    /// The dragged id is not a card on the board.
    UnknownCard,
    UnknownColumn,
    /// The move is illegal from the card's status. Nothing was applied.
    Rejected(SyncError),
    /// Applied locally; the remote write is in flight.
    Dispatched(PendingMutation),
}

/// One column with its cards, in snapshot order.
#[derive(Debug, Clone)]
pub struct ColumnCards {
    pub column: &'static BoardColumn,
    pub cards: Vec<Request>,
}

pub struct Workboard {
    requests: LiveView<Request>,
    columns: &'static [BoardColumn],
    move_card: OptimisticMutation<StatusChange>,
    notifier: Arc<dyn Notifier>,
}

impl Workboard {
    pub fn new(
        requests: LiveView<Request>,
        engine: Arc<RequestLifecycleEngine>,
        actor: ActorContext,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let applied = requests.clone();
        let restored = requests.clone();

        let move_card = OptimisticMutation::new(notifier.clone(), move |change: StatusChange| {
            let engine = Arc::clone(&engine);
            let actor = actor.clone();
            async move {
                engine
                    .update_status(&actor, &change.request_id, change.new_status)
                    .await
                    .map(|_| ())
            }
            .boxed()
        })
        .validate_with(|change| {
            request_status::validate_transition(change.old_status, change.new_status)
                .map_err(SyncError::from)
        })
        .on_mutate(move |change| {
            applied.update_local(&change.request_id, |r| r.status = change.new_status);
        })
        .on_rollback(move |_, change| {
            restored.update_local(&change.request_id, |r| r.status = change.old_status);
        })
        .error_title("Could not move request");

        Self {
            requests,
            columns: DEFAULT_COLUMNS,
            move_card,
            notifier,
        }
    }

    pub fn columns(&self) -> &'static [BoardColumn] {
        self.columns
    }

    /// The column a request is shown in. `None` for DECLINED.
    pub fn get_column_for_request(&self, request: &Request) -> Option<&'static BoardColumn> {
        board::column_for_status(self.columns, request.status)
    }

    /// Every column with the requests currently in it.
    pub fn columns_with_cards(&self) -> Vec<ColumnCards> {
        let requests = self.requests.items();
        self.columns
            .iter()
            .map(|column| ColumnCards {
                column,
                cards: requests
                    .iter()
                    .filter(|r| column.contains(r.status))
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    pub fn requests(&self) -> &LiveView<Request> {
        &self.requests
    }

    /// Handle a card dropped on `target_column_id`.
    pub fn on_drop(&self, dragged_id: &str, target_column_id: &str) -> DropOutcome {
        let Some(card) = self.requests.get(dragged_id) else {
            tracing::debug!(request_id = dragged_id, "Drop of unknown card ignored");
            return DropOutcome::UnknownCard;
        };
        let Some(current) = self.get_column_for_request(&card) else {
            return DropOutcome::UnknownCard;
        };
        let Some(target) = board::find_column(self.columns, target_column_id) else {
            tracing::debug!(column = target_column_id, "Drop on unknown column ignored");
            return DropOutcome::UnknownColumn;
        };
        if current.id == target.id {
            return DropOutcome::Unchanged;
        }

        let change = StatusChange {
            request_id: card.id.clone(),
            new_status: target.target_status,
            old_status: card.status,
        };
        match self.move_card.execute(change) {
            Ok(pending) => {
                tracing::info!(
                    request_id = %card.id,
                    from = %current.id,
                    to = %target.id,
                    "Card moved",
                );
                DropOutcome::Dispatched(pending)
            }
            Err(e) => {
                self.notifier.notify_error(REJECTED_TITLE, &e.user_message());
                DropOutcome::Rejected(e)
            }
        }
    }
}
