//! Comment posting and reactions.

use std::sync::Arc;

use chrono::Utc;
use portal_core::activity::ActivityAction;
use portal_core::actor::ActorContext;
use portal_core::comment;
use portal_core::error::CoreError;
use portal_events::activity;
use portal_events::bus::{event_types, EventBus, PortalEvent};
use portal_events::ActivityLogger;
use portal_store::models::comment::{Comment, CreateComment};
use portal_store::repositories::{CommentRepo, RequestRepo};
use portal_store::DocumentStore;
use serde_json::json;

use crate::error::SyncResult;

pub struct CommentService {
    store: Arc<dyn DocumentStore>,
    activity: ActivityLogger,
    bus: Arc<EventBus>,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>, activity: ActivityLogger, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            activity,
            bus,
        }
    }

    /// Post a comment or a reply to a top-level comment.
    ///
    /// The comment write is authoritative. The activity entry and the
    /// request's comment counter follow it and only log on failure.
    pub async fn add_comment(&self, actor: &ActorContext, input: &CreateComment) -> SyncResult<Comment> {
        actor.validate()?;
        comment::validate_content(&input.content)?;

        let request = RequestRepo::find_by_id(self.store.as_ref(), &input.request_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "request",
                id: input.request_id.clone(),
            })?
            .record;

        if let Some(parent_id) = &input.parent_id {
            let parent = CommentRepo::find_by_id(self.store.as_ref(), parent_id)
                .await?
                .ok_or_else(|| CoreError::NotFound {
                    entity: "comment",
                    id: parent_id.clone(),
                })?
                .record;
            comment::validate_reply_target(
                &input.request_id,
                &parent.request_id,
                parent.parent_id.as_deref(),
            )?;
        }

        let created = CommentRepo::create(
            self.store.as_ref(),
            &request.org_id,
            &actor.user_id,
            &actor.user_name,
            input,
            Utc::now(),
        )
        .await
        .map_err(|e| {
            tracing::warn!(request_id = %input.request_id, error = %e, "Comment write failed");
            e
        })?;

        let details = json!({
            "commentId": created.id,
            "parentId": created.parent_id,
        });
        self.activity
            .append(activity::entry(
                ActivityAction::AddedComment,
                &request.org_id,
                Some(request.id.as_str()),
                actor,
                details.clone(),
            ))
            .await;

        if let Err(e) = RequestRepo::increment_comment_count(self.store.as_ref(), &request.id).await {
            tracing::warn!(request_id = %request.id, error = %e, "Failed to bump comment count");
        }

        self.bus.publish(
            PortalEvent::new(event_types::COMMENT_ADDED)
                .for_request(&request.org_id, &request.id)
                .with_actor(&actor.user_id)
                .with_payload(details),
        );

        tracing::info!(comment_id = %created.id, request_id = %request.id, "Comment added");
        Ok(created)
    }

    /// Toggle the actor's reaction. Returns `true` if it is now present.
    ///
    /// Reactions are not recorded in the activity log.
    pub async fn toggle_reaction(
        &self,
        actor: &ActorContext,
        comment_id: &str,
        emoji: &str,
    ) -> SyncResult<bool> {
        actor.validate()?;
        comment::validate_emoji(emoji)?;

        let current = CommentRepo::find_by_id(self.store.as_ref(), comment_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "comment",
                id: comment_id.to_string(),
            })?;

        let mut reactions = current.record.reactions;
        let added = comment::toggle_reaction(&mut reactions, emoji, &actor.user_id);
        CommentRepo::update_reactions(self.store.as_ref(), comment_id, &reactions, current.version).await?;

        tracing::debug!(comment_id, emoji, added, "Reaction toggled");
        Ok(added)
    }
}
