//! Per-actor wiring of the portal controllers.
//!
//! A [`PortalSession`] owns the shared services for one signed-in user: the
//! store handle, the activity logger, the event bus, and the lifecycle
//! engine. Screen controllers are created from it on demand, each with its
//! own live view.

use std::sync::Arc;

use portal_core::actor::ActorContext;
use portal_events::{ActivityLogger, EventBus, Notifier, PortalEvent};
use portal_store::models::activity::ActivityLog;
use portal_store::models::comment::Comment;
use portal_store::models::request::Request;
use portal_store::repositories::{ActivityRepo, CommentRepo, RequestRepo};
use portal_store::DocumentStore;
use tokio::sync::broadcast;

use crate::comments::CommentService;
use crate::config::SyncConfig;
use crate::detail::{self, RequestDetail};
use crate::engine::RequestLifecycleEngine;
use crate::error::SyncResult;
use crate::live_view::LiveView;
use crate::thread::CommentThread;
use crate::workboard::Workboard;

pub struct PortalSession {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    actor: ActorContext,
    config: SyncConfig,
    bus: Arc<EventBus>,
    engine: Arc<RequestLifecycleEngine>,
    comments: Arc<CommentService>,
}

impl PortalSession {
    /// Build a session. Fails if the actor context is incomplete.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        actor: ActorContext,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        actor.validate()?;

        let bus = Arc::new(EventBus::new(config.event_bus_capacity));
        let activity = ActivityLogger::new(Arc::clone(&store));
        let engine = Arc::new(RequestLifecycleEngine::new(
            Arc::clone(&store),
            activity.clone(),
            Arc::clone(&bus),
        ));
        let comments = Arc::new(CommentService::new(Arc::clone(&store), activity, Arc::clone(&bus)));

        tracing::info!(
            user_id = %actor.user_id,
            is_agency = actor.is_agency,
            grace_ms = config.optimistic_grace.as_millis() as u64,
            "Portal session started",
        );

        Ok(Self {
            store,
            notifier,
            actor,
            config,
            bus,
            engine,
            comments,
        })
    }

    pub fn actor(&self) -> &ActorContext {
        &self.actor
    }

    pub fn engine(&self) -> &Arc<RequestLifecycleEngine> {
        &self.engine
    }

    pub fn comments(&self) -> &Arc<CommentService> {
        &self.comments
    }

    /// Receive every domain event published in this session.
    pub fn events(&self) -> broadcast::Receiver<PortalEvent> {
        self.bus.subscribe()
    }

    /// Live list of an organization's requests, oldest first.
    pub async fn requests(&self, org_id: &str) -> LiveView<Request> {
        LiveView::subscribe(self.store.as_ref(), RequestRepo::org_query(org_id), &self.config).await
    }

    pub async fn workboard(&self, org_id: &str) -> Workboard {
        Workboard::new(
            self.requests(org_id).await,
            Arc::clone(&self.engine),
            self.actor.clone(),
            Arc::clone(&self.notifier),
        )
    }

    pub async fn comment_thread(&self, org_id: &str, request_id: &str) -> CommentThread {
        let view: LiveView<Comment> =
            LiveView::subscribe(self.store.as_ref(), CommentRepo::request_query(request_id), &self.config)
                .await;
        CommentThread::new(
            view,
            Arc::clone(&self.comments),
            org_id,
            request_id,
            self.actor.clone(),
            Arc::clone(&self.notifier),
        )
    }

    /// Live activity log of one request, oldest first.
    pub async fn activity_feed(&self, request_id: &str) -> LiveView<ActivityLog> {
        LiveView::subscribe(self.store.as_ref(), ActivityRepo::request_query(request_id), &self.config).await
    }

    pub async fn detail(&self, request_id: &str) -> RequestDetail {
        let view: LiveView<Request> =
            LiveView::subscribe(self.store.as_ref(), detail::request_query(request_id), &self.config).await;
        RequestDetail::new(
            request_id,
            view,
            Arc::clone(&self.engine),
            self.actor.clone(),
            Arc::clone(&self.notifier),
        )
    }
}
