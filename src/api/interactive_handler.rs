//! Handler for inline button presses.
//!
//! A press is first turned into an [`Interaction`] (the store is mutated
//! under the entry lock while deciding), then the interaction is applied
//! against the messenger and the observability sink.

use futures::future::join;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use super::parsing::note_deep_link;
use crate::bot::Services;
use crate::core::models::{ButtonPress, ControlAction, MessageId, TraceRef, WorkStatus};
use crate::core::WorkUnitStore;
use crate::errors::DigestError;
use crate::telegram::PressAnswer;
use crate::telegram::markup::rated_keyboard;
use crate::worker::{Pipeline, STALE_ACTION_MESSAGE};

pub const RETRY_STARTED: &str = "Retrying…";
pub const RETRY_NOT_APPLICABLE: &str = "Nothing to retry right now.";
pub const RATING_NOT_APPLICABLE: &str = "Rating is available once the summary is ready.";
pub const NOTE_NOT_APPLICABLE: &str = "Notes are available once the summary is ready.";
pub const RATING_THANKS: &str = "Thanks for the feedback!";

/// Render instruction produced for one press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Answer with a notice and change nothing.
    Notice(&'static str),
    /// The unit was flipped back to pending; run it again.
    Rerun(MessageId),
    /// The rating was recorded; swap in the rated controls and score the trace.
    Rated {
        id: MessageId,
        positive: bool,
        seq: u64,
        trace_ref: Option<TraceRef>,
    },
    /// Answer with a URL for the client to open.
    OpenUrl(String),
}

pub struct InteractionHandler {
    services: Services,
    store: Arc<WorkUnitStore>,
    pipeline: Arc<Pipeline>,
    bot_username: String,
    rating_gates: Mutex<HashMap<MessageId, Arc<tokio::sync::Mutex<()>>>>,
}

impl InteractionHandler {
    #[must_use]
    pub fn new(
        services: Services,
        store: Arc<WorkUnitStore>,
        pipeline: Arc<Pipeline>,
        bot_username: String,
    ) -> Self {
        Self {
            services,
            store,
            pipeline,
            bot_username,
            rating_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Decide what a press means for its work unit.
    #[must_use]
    pub fn decide(&self, press: &ButtonPress) -> Interaction {
        let Some(action) = ControlAction::from_token(&press.data) else {
            warn!("Unknown control token {:?}", press.data);
            return Interaction::Notice(STALE_ACTION_MESSAGE);
        };
        let Some(id) = press
            .message_id
            .filter(|_| press.chat_id == Some(self.pipeline.dest_chat_id()))
        else {
            return Interaction::Notice(STALE_ACTION_MESSAGE);
        };

        let decided = match action {
            ControlAction::Retry => self.store.update(id, |unit| {
                if unit.restart() {
                    Interaction::Rerun(id)
                } else {
                    Interaction::Notice(RETRY_NOT_APPLICABLE)
                }
            }),
            ControlAction::Rate(positive) => self.store.update(id, |unit| {
                if unit.rate(positive) {
                    Interaction::Rated {
                        id,
                        positive,
                        seq: unit.rating_seq,
                        trace_ref: unit.trace_ref.clone(),
                    }
                } else {
                    Interaction::Notice(RATING_NOT_APPLICABLE)
                }
            }),
            ControlAction::AddNote => self.store.update(id, |unit| {
                if unit.status == WorkStatus::Succeeded {
                    Interaction::OpenUrl(note_deep_link(&self.bot_username, id))
                } else {
                    Interaction::Notice(NOTE_NOT_APPLICABLE)
                }
            }),
        };

        decided.unwrap_or_else(|e| {
            info!("Press on untracked message: {}", e);
            Interaction::Notice(STALE_ACTION_MESSAGE)
        })
    }

    fn rating_gate(&self, id: MessageId) -> Arc<tokio::sync::Mutex<()>> {
        self.rating_gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone()
    }

    /// Show the rated controls and score the trace, unless a later rating of
    /// the same unit has already been recorded. Applies for one unit run one
    /// at a time, so the last recorded rating is also the last one rendered
    /// and scored.
    async fn apply_rating(
        &self,
        id: MessageId,
        positive: bool,
        seq: u64,
        trace_ref: Option<&TraceRef>,
    ) -> Result<(), DigestError> {
        let gate = self.rating_gate(id);
        let _applying = gate.lock().await;

        let current = self.store.snapshot(id).map(|unit| unit.rating_seq);
        if current != Some(seq) {
            debug!("Skipping superseded rating {} of {}", seq, id);
            return Ok(());
        }

        let keyboard = rated_keyboard(positive);
        let edited = self
            .services
            .messenger
            .edit_keyboard(self.pipeline.dest_chat_id(), id, Some(&keyboard))
            .await;
        if let Some(trace_ref) = trace_ref {
            if let Err(e) = self.services.sink.score_rating(trace_ref, positive).await {
                warn!("Failed to score rating for {}: {}", id, e);
            }
        }
        edited
    }

    async fn answer(&self, press_id: &str, answer: &PressAnswer) {
        if let Err(e) = self.services.messenger.answer_press(press_id, answer).await {
            warn!("Failed to answer press {}: {}", press_id, e);
        }
    }

    /// Handle one press end to end.
    ///
    /// # Errors
    ///
    /// Returns an error when re-rendering the pressed message fails.
    #[tracing::instrument(level = "info", skip(self, press), fields(data = %press.data, user = press.user_id))]
    pub async fn handle_press(&self, press: &ButtonPress) -> Result<Interaction, DigestError> {
        let interaction = self.decide(press);
        self.apply(&press.press_id, &interaction).await?;
        Ok(interaction)
    }

    /// Answer the press and carry out a decided interaction.
    ///
    /// # Errors
    ///
    /// Returns an error when re-rendering the pressed message fails.
    pub async fn apply(&self, press_id: &str, interaction: &Interaction) -> Result<(), DigestError> {
        match interaction {
            Interaction::Notice(text) => {
                self.answer(press_id, &PressAnswer::notice(*text)).await;
            }
            Interaction::OpenUrl(url) => {
                self.answer(press_id, &PressAnswer::open_url(url.clone()))
                    .await;
            }
            Interaction::Rerun(id) => {
                self.answer(press_id, &PressAnswer::notice(RETRY_STARTED))
                    .await;
                let status = self.pipeline.retry(*id).await?;
                info!("Retry of {} finished as {:?}", id, status);
            }
            Interaction::Rated {
                id,
                positive,
                seq,
                trace_ref,
            } => {
                let ack = PressAnswer::notice(RATING_THANKS);
                let ((), applied) = join(
                    self.answer(press_id, &ack),
                    self.apply_rating(*id, *positive, *seq, trace_ref.as_ref()),
                )
                .await;
                applied?;
            }
        }

        Ok(())
    }
}
