//! Integration tests for the request detail controller.

mod common;

use assert_matches::assert_matches;
use portal_core::milestone::MilestoneStatus;
use portal_core::pricing::LineItem;
use portal_core::request_status::RequestStatus;
use portal_events::ToastLevel;
use portal_store::models::request::Milestone;
use portal_sync::{ErrorKind, MutationOutcome};

use common::{client, request_in, staff, Harness};

fn milestone(id: &str, order: i32) -> Milestone {
    Milestone {
        id: id.into(),
        title: format!("Phase {id}"),
        description: None,
        status: MilestoneStatus::Pending,
        order,
        due_date: None,
        completed_at: None,
    }
}

#[tokio::test]
async fn milestone_toggle_applies_then_confirms() {
    let h = Harness::new(staff());
    let request = request_in(h.store.clone(), "Rebrand", RequestStatus::InProgress).await;
    h.session
        .engine()
        .update_pipeline(&staff(), &request.id, vec![milestone("draft", 1), milestone("final", 2)], None)
        .await
        .unwrap();

    let detail = h.session.detail(&request.id).await;
    detail
        .view()
        .wait_until(|items| items.len() == 1 && items[0].milestones.len() == 2)
        .await;

    let pending = detail.toggle_milestone("draft").unwrap();
    let local = detail.request().unwrap();
    assert_eq!(local.milestone("draft").unwrap().status, MilestoneStatus::Completed);
    assert!(local.milestone("draft").unwrap().completed_at.is_some());

    assert!(pending.settled().await.is_confirmed());
    detail
        .view()
        .wait_until(|items| {
            items[0]
                .milestone("draft")
                .is_some_and(|m| m.status == MilestoneStatus::Completed && m.completed_at.is_some())
        })
        .await;
}

#[tokio::test]
async fn milestone_toggle_rolls_back_exactly() {
    let h = Harness::new(staff());
    let request = request_in(h.store.clone(), "Rebrand", RequestStatus::InProgress).await;
    h.session
        .engine()
        .update_pipeline(&staff(), &request.id, vec![milestone("draft", 1)], Some("draft".into()))
        .await
        .unwrap();
    let detail = h.session.detail(&request.id).await;
    detail.view().wait_until(|items| items.len() == 1).await;
    let before = detail.view().items();

    h.store.fail_next_writes(1);
    let pending = detail.toggle_milestone("draft").unwrap();
    assert_matches!(pending.settled().await, MutationOutcome::RolledBack(_));

    assert_eq!(detail.view().items(), before);
    assert_eq!(h.toasts.count(ToastLevel::Error), 1);
}

#[tokio::test]
async fn unknown_milestone_is_rejected_locally() {
    let h = Harness::new(staff());
    let request = request_in(h.store.clone(), "Rebrand", RequestStatus::InProgress).await;
    let detail = h.session.detail(&request.id).await;
    detail.view().wait_until(|items| items.len() == 1).await;
    let writes = h.store.write_calls();

    let err = detail.toggle_milestone("nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.store.write_calls(), writes);
}

#[tokio::test]
async fn client_accepts_quote_from_detail() {
    let staff_h = Harness::new(staff());
    let request = request_in(staff_h.store.clone(), "Campaign", RequestStatus::New).await;
    staff_h
        .session
        .engine()
        .add_pricing(&staff(), &request.id, vec![LineItem::new("Design", 1, 50_000)], "USD")
        .await
        .unwrap();

    let client_h = Harness::with_store(staff_h.store.clone(), client());
    let detail = client_h.session.detail(&request.id).await;

    let accepted = detail.accept_quote().await.unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);
    assert_eq!(client_h.toasts.count(ToastLevel::Success), 1);

    detail
        .view()
        .wait_until(|items| items.first().is_some_and(|r| r.status == RequestStatus::Accepted))
        .await;

    let err = detail.decline_quote().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(client_h.toasts.count(ToastLevel::Error), 1);
}

#[tokio::test]
async fn clients_cannot_toggle_milestones() {
    let h = Harness::new(client());
    let request = request_in(h.store.clone(), "Rebrand", RequestStatus::InProgress).await;
    let detail = h.session.detail(&request.id).await;
    detail.view().wait_until(|items| items.len() == 1).await;

    let err = detail.toggle_milestone("draft").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
