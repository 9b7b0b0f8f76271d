//! Comment thread controller for one request.

use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use portal_core::actor::ActorContext;
use portal_core::comment::{self, Reactions};
use portal_core::error::CoreError;
use portal_events::Notifier;
use portal_store::models::comment::{Comment, CreateComment};

use crate::comments::CommentService;
use crate::error::{SyncError, SyncResult};
use crate::live_view::{LiveView, PLACEHOLDER_PREFIX};
use crate::optimistic::{OptimisticMutation, PendingMutation};

/// A comment being posted, keyed by the placeholder shown meanwhile.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub temp_id: String,
    pub input: CreateComment,
}

#[derive(Debug, Clone)]
pub struct ReactionToggle {
    pub comment_id: String,
    pub emoji: String,
    /// Whether the actor's reaction was present before the toggle.
    pub was_present: bool,
}

/// A top-level comment with its replies, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadEntry {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

pub struct CommentThread {
    request_id: String,
    user_id: String,
    comments: LiveView<Comment>,
    post: OptimisticMutation<CommentDraft>,
    react: OptimisticMutation<ReactionToggle>,
}

impl CommentThread {
    pub fn new(
        comments: LiveView<Comment>,
        service: Arc<CommentService>,
        org_id: &str,
        request_id: &str,
        actor: ActorContext,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let post = {
            let service = Arc::clone(&service);
            let remote_actor = actor.clone();
            let view = comments.clone();
            let placeholders = comments.clone();
            let discard = comments.clone();
            let actor = actor.clone();
            let org_id = org_id.to_string();

            OptimisticMutation::new(notifier.clone(), move |draft: CommentDraft| {
                let service = Arc::clone(&service);
                let actor = remote_actor.clone();
                async move { service.add_comment(&actor, &draft.input).await.map(|_| ()) }.boxed()
            })
            .validate_with(move |draft| validate_draft(&view, draft))
            .on_mutate(move |draft| {
                placeholders.insert_optimistic_as(
                    draft.temp_id.clone(),
                    Comment {
                        id: draft.temp_id.clone(),
                        request_id: draft.input.request_id.clone(),
                        org_id: org_id.clone(),
                        user_id: actor.user_id.clone(),
                        user_name: actor.user_name.clone(),
                        content: draft.input.content.clone(),
                        parent_id: draft.input.parent_id.clone(),
                        reactions: Reactions::new(),
                        created_at: Utc::now(),
                    },
                );
            })
            .on_rollback(move |_, draft| {
                discard.discard_optimistic(&draft.temp_id);
            })
            .error_title("Comment not posted")
        };

        let react = {
            let remote_actor = actor.clone();
            let applied = comments.clone();
            let reverted = comments.clone();
            let user_id = actor.user_id.clone();
            let revert_user_id = actor.user_id.clone();

            OptimisticMutation::new(notifier, move |toggle: ReactionToggle| {
                let service = Arc::clone(&service);
                let actor = remote_actor.clone();
                async move {
                    service
                        .toggle_reaction(&actor, &toggle.comment_id, &toggle.emoji)
                        .await
                        .map(|_| ())
                }
                .boxed()
            })
            .validate_with(|toggle| {
                comment::validate_emoji(&toggle.emoji)?;
                if toggle.comment_id.starts_with(PLACEHOLDER_PREFIX) {
                    return Err(CoreError::Validation(
                        "Wait for the comment to be posted before reacting".to_string(),
                    )
                    .into());
                }
                Ok(())
            })
            .on_mutate(move |toggle| {
                applied.update_local(&toggle.comment_id, |c| {
                    if has_reaction(c, &toggle.emoji, &user_id) == toggle.was_present {
                        comment::toggle_reaction(&mut c.reactions, &toggle.emoji, &user_id);
                    }
                });
            })
            .on_rollback(move |_, toggle| {
                reverted.update_local(&toggle.comment_id, |c| {
                    if has_reaction(c, &toggle.emoji, &revert_user_id) != toggle.was_present {
                        comment::toggle_reaction(&mut c.reactions, &toggle.emoji, &revert_user_id);
                    }
                });
            })
            .error_title("Reaction not saved")
        };

        Self {
            request_id: request_id.to_string(),
            user_id: actor.user_id.clone(),
            comments,
            post,
            react,
        }
    }

    /// Post a comment, or a reply when `parent_id` is set.
    ///
    /// Returns the placeholder id shown until the comment is confirmed.
    pub fn post(&self, content: &str, parent_id: Option<&str>) -> SyncResult<(String, PendingMutation)> {
        comment::validate_content(content)?;
        let temp_id = self.comments.reserve_placeholder_id();
        let draft = CommentDraft {
            temp_id: temp_id.clone(),
            input: CreateComment {
                request_id: self.request_id.clone(),
                content: content.to_string(),
                parent_id: parent_id.map(str::to_string),
            },
        };
        let pending = self.post.execute(draft)?;
        Ok((temp_id, pending))
    }

    pub fn toggle_reaction(&self, comment_id: &str, emoji: &str) -> SyncResult<PendingMutation> {
        let was_present = self
            .comments
            .get(comment_id)
            .is_some_and(|c| has_reaction(&c, emoji, &self.user_id));
        self.react.execute(ReactionToggle {
            comment_id: comment_id.to_string(),
            emoji: emoji.to_string(),
            was_present,
        })
    }

    pub fn comments(&self) -> &LiveView<Comment> {
        &self.comments
    }

    /// Group comments into top-level entries with their replies.
    ///
    /// Replies whose parent is not in the view are listed at the top level.
    pub fn threaded(&self) -> Vec<ThreadEntry> {
        let all = self.comments.items();
        let is_known_root = |id: &str| all.iter().any(|c| c.id == id && c.is_root());

        let mut entries: Vec<ThreadEntry> = Vec::new();
        for c in &all {
            match c.parent_id.as_deref() {
                Some(parent) if is_known_root(parent) => {}
                _ => entries.push(ThreadEntry {
                    comment: c.clone(),
                    replies: Vec::new(),
                }),
            }
        }
        for c in &all {
            let Some(parent) = c.parent_id.as_deref().filter(|p| is_known_root(p)) else {
                continue;
            };
            if let Some(entry) = entries.iter_mut().find(|e| e.comment.id == parent) {
                entry.replies.push(c.clone());
            }
        }
        entries
    }
}

fn has_reaction(comment: &Comment, emoji: &str, user_id: &str) -> bool {
    comment
        .reactions
        .get(emoji)
        .is_some_and(|users| users.contains(user_id))
}

/// Replies may only target top-level comments of the same request.
fn validate_draft(view: &LiveView<Comment>, draft: &CommentDraft) -> SyncResult<()> {
    let Some(parent_id) = draft.input.parent_id.as_deref() else {
        return Ok(());
    };
    if parent_id.starts_with(PLACEHOLDER_PREFIX) {
        return Err(SyncError::from(CoreError::Validation(
            "Wait for the comment to be posted before replying".to_string(),
        )));
    }
    if let Some(parent) = view.get(parent_id) {
        comment::validate_reply_target(
            &draft.input.request_id,
            &parent.request_id,
            parent.parent_id.as_deref(),
        )?;
    }
    Ok(())
}
