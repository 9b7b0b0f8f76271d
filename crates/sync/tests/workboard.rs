//! Integration tests for the workboard controller.

mod common;

use assert_matches::assert_matches;
use portal_core::board::column_ids;
use portal_core::request_status::RequestStatus;
use portal_events::ToastLevel;
use portal_store::models::request::Request;
use portal_store::repositories::RequestRepo;
use portal_sync::workboard::{DropOutcome, Workboard};
use portal_sync::{ErrorKind, MutationOutcome, SyncError};

use common::{request_in, staff, Harness, ORG};

fn status_of(board: &Workboard, id: &str) -> Option<RequestStatus> {
    board.requests().get(id).map(|r: Request| r.status)
}

async fn board_with(h: &Harness, count: usize) -> Workboard {
    let board = h.session.workboard(ORG).await;
    board.requests().wait_until(|items| items.len() == count).await;
    board
}

// ---------------------------------------------------------------------------
// Test: a failed move flips back and notifies once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_move_reverts_and_notifies_once() {
    let h = Harness::new(staff());
    let card = request_in(h.store.clone(), "Landing page", RequestStatus::InProgress).await;
    let board = board_with(&h, 1).await;

    h.store.fail_next_writes(1);
    let outcome = board.on_drop(&card.id, column_ids::REVIEW);
    let pending = assert_matches!(outcome, DropOutcome::Dispatched(p) => p);

    // Applied before the write has had a chance to run.
    assert_eq!(status_of(&board, &card.id), Some(RequestStatus::InReview));

    let settled = pending.settled().await;
    assert_matches!(settled, MutationOutcome::RolledBack(SyncError::Store(_)));
    assert_eq!(status_of(&board, &card.id), Some(RequestStatus::InProgress));

    assert_eq!(h.toasts.count(ToastLevel::Error), 1);
    assert_eq!(h.toasts.len(), 1);

    let saved = RequestRepo::find_by_id(&*h.store, &card.id).await.unwrap().unwrap();
    assert_eq!(saved.record.status, RequestStatus::InProgress);
}

// ---------------------------------------------------------------------------
// Test: a confirmed move is reflected by the next snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confirmed_move_matches_store() {
    let h = Harness::new(staff());
    let card = request_in(h.store.clone(), "Logo", RequestStatus::Delivered).await;
    let board = board_with(&h, 1).await;

    let outcome = board.on_drop(&card.id, column_ids::DONE);
    let pending = assert_matches!(outcome, DropOutcome::Dispatched(p) => p);
    assert!(pending.settled().await.is_confirmed());

    let id = card.id.clone();
    board
        .requests()
        .wait_until(|items| {
            items
                .iter()
                .any(|r| r.id == id && r.status == RequestStatus::Closed && r.closed_at.is_some())
        })
        .await;
    assert!(h.toasts.is_empty());
}

// ---------------------------------------------------------------------------
// Test: dropping on the same column makes no remote call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_column_drop_is_a_no_op() {
    let h = Harness::new(staff());
    let needs_info = request_in(h.store.clone(), "Brochure", RequestStatus::NeedsInfo).await;
    let board = board_with(&h, 1).await;
    let writes = h.store.write_calls();

    let outcome = board.on_drop(&needs_info.id, column_ids::IN_PROGRESS);
    assert_matches!(outcome, DropOutcome::Unchanged);
    tokio::task::yield_now().await;

    assert_eq!(h.store.write_calls(), writes);
    assert_eq!(status_of(&board, &needs_info.id), Some(RequestStatus::NeedsInfo));
    assert!(h.toasts.is_empty());
}

#[tokio::test]
async fn unknown_card_or_column_is_ignored() {
    let h = Harness::new(staff());
    let card = request_in(h.store.clone(), "Poster", RequestStatus::Queued).await;
    let board = board_with(&h, 1).await;
    let writes = h.store.write_calls();

    assert_matches!(board.on_drop("missing", column_ids::REVIEW), DropOutcome::UnknownCard);
    assert_matches!(board.on_drop(&card.id, "archive"), DropOutcome::UnknownColumn);
    assert_eq!(h.store.write_calls(), writes);
    assert!(h.toasts.is_empty());
}

// ---------------------------------------------------------------------------
// Test: illegal moves are rejected before anything changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn illegal_move_rejected_before_apply() {
    let h = Harness::new(staff());
    let card = request_in(h.store.clone(), "Banner", RequestStatus::New).await;
    let board = board_with(&h, 1).await;
    let writes = h.store.write_calls();

    let outcome = board.on_drop(&card.id, column_ids::DELIVERED);
    let err = assert_matches!(outcome, DropOutcome::Rejected(e) => e);
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(err.user_message(), "Cannot move request from NEW to DELIVERED");

    assert_eq!(status_of(&board, &card.id), Some(RequestStatus::New));
    assert_eq!(h.store.write_calls(), writes);
    assert_eq!(h.toasts.count(ToastLevel::Error), 1);
}

// ---------------------------------------------------------------------------
// Test: cards are grouped per column and DECLINED is hidden
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cards_grouped_by_column() {
    let h = Harness::new(staff());
    let quoted = request_in(h.store.clone(), "A", RequestStatus::Quoted).await;
    let review = request_in(h.store.clone(), "B", RequestStatus::InReview).await;
    let paid = request_in(h.store.clone(), "C", RequestStatus::Paid).await;
    let declined = request_in(h.store.clone(), "D", RequestStatus::Declined).await;
    let board = board_with(&h, 4).await;

    let columns = board.columns_with_cards();
    let ids: Vec<_> = columns.iter().map(|c| c.column.id).collect();
    assert_eq!(
        ids,
        vec![
            column_ids::BACKLOG,
            column_ids::IN_PROGRESS,
            column_ids::REVIEW,
            column_ids::DELIVERED,
            column_ids::DONE,
        ]
    );

    let cards_in = |column: &str| -> Vec<String> {
        columns
            .iter()
            .find(|c| c.column.id == column)
            .map(|c| c.cards.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default()
    };
    assert_eq!(cards_in(column_ids::BACKLOG), vec![quoted.id.clone()]);
    assert_eq!(cards_in(column_ids::REVIEW), vec![review.id.clone()]);
    assert_eq!(cards_in(column_ids::DONE), vec![paid.id.clone()]);

    let shown: usize = columns.iter().map(|c| c.cards.len()).sum();
    assert_eq!(shown, 3);

    assert!(board.get_column_for_request(&declined).is_none());
    assert_matches!(board.on_drop(&declined.id, column_ids::BACKLOG), DropOutcome::UnknownCard);
}
