//! Event router - thin dispatcher that delegates to specialized handlers.
//!
//! - Source chat posts (delegated to `event_handler`)
//! - Button presses (delegated to `interactive_handler`)
//! - Private messages (delegated to `private_handler`)

use std::sync::Arc;

use super::event_handler;
use super::interactive_handler::InteractionHandler;
use super::private_handler::PrivateHandler;
use crate::bot::{BotSettings, Services};
use crate::core::models::InboundEvent;
use crate::core::{AccessFilter, NoteSessions, WorkUnitStore};
use crate::errors::DigestError;
use crate::worker::Pipeline;

pub struct EventRouter {
    pipeline: Arc<Pipeline>,
    interactions: InteractionHandler,
    private: PrivateHandler,
    store: Arc<WorkUnitStore>,
    sessions: Arc<NoteSessions>,
}

impl EventRouter {
    #[must_use]
    pub fn new(services: Services, settings: &BotSettings) -> Self {
        let store = Arc::new(WorkUnitStore::new());
        let sessions = Arc::new(NoteSessions::new());
        let pipeline = Arc::new(Pipeline::new(
            services.clone(),
            store.clone(),
            AccessFilter::new(settings.allowed_user_id),
            settings.dest_chat_id,
            settings.max_concurrent_jobs,
        ));
        let interactions = InteractionHandler::new(
            services.clone(),
            store.clone(),
            pipeline.clone(),
            settings.bot_username.clone(),
        );
        let private = PrivateHandler::new(services, store.clone(), sessions.clone());

        Self {
            pipeline,
            interactions,
            private,
            store,
            sessions,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<WorkUnitStore> {
        &self.store
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<NoteSessions> {
        &self.sessions
    }

    #[must_use]
    pub fn interactions(&self) -> &InteractionHandler {
        &self.interactions
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Route one inbound event to its handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error; the caller logs it and moves on.
    pub async fn dispatch(&self, event: InboundEvent) -> Result<(), DigestError> {
        match event {
            InboundEvent::Post(post) => {
                event_handler::handle_post(&self.pipeline, &post).await?;
            }
            InboundEvent::Press(press) => {
                self.interactions.handle_press(&press).await?;
            }
            InboundEvent::Private(msg) => {
                self.private.handle_private(&msg).await?;
            }
        }
        Ok(())
    }
}
