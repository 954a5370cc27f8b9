//! Private-chat handling: note deep-links, note bodies and commands.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::parsing::{PrivateCommand, parse_private_command};
use crate::bot::Services;
use crate::core::models::{MessageId, PrivateText, UserId, WorkStatus};
use crate::core::{NoteSessions, WorkUnitStore};
use crate::errors::DigestError;
use crate::worker::STALE_ACTION_MESSAGE;
use crate::worker::deliver::send_private;

pub const HELP_TEXT: &str = "I summarize links posted in the source channel. \
Use the 📝 button under a rated summary to leave a note about it.";
pub const NOTE_PROMPT: &str = "Send your note about this summary as a message. /cancel to abort.";
pub const NOTE_SAVED: &str = "📝 Thanks, your note was saved.";
pub const NOTE_UNTRACED: &str = "📝 Thanks. Tracing is unavailable for this summary, so the note was not stored.";
pub const NOTE_FAILED: &str = "Sorry, your note could not be stored right now.";
pub const NOTE_CANCELLED: &str = "Note cancelled.";
pub const NOTHING_TO_CANCEL: &str = "There is no pending note.";

/// What a private message led to; returned for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteOutcome {
    Opened(MessageId),
    Saved(MessageId),
    Cancelled(MessageId),
    Help,
    Rejected,
    Ignored,
}

pub struct PrivateHandler {
    services: Services,
    store: Arc<WorkUnitStore>,
    sessions: Arc<NoteSessions>,
}

impl PrivateHandler {
    #[must_use]
    pub fn new(services: Services, store: Arc<WorkUnitStore>, sessions: Arc<NoteSessions>) -> Self {
        Self {
            services,
            store,
            sessions,
        }
    }

    /// Drop the pending flag on `unit` unless another user is still annotating it.
    fn release(&self, unit: MessageId) {
        if self.sessions.is_awaiting(unit) {
            return;
        }
        if let Err(e) = self.store.update(unit, |u| u.note_pending = false) {
            debug!("Could not clear note flag: {}", e);
        }
    }

    async fn reply(&self, user: UserId, text: &str) {
        if let Err(e) = send_private(self.services.messenger.as_ref(), user, text).await {
            warn!("Failed to reply to user {}: {}", user, e);
        }
    }

    /// # Errors
    ///
    /// Currently infallible; replies that fail to send are logged.
    #[tracing::instrument(level = "info", skip(self, msg), fields(user = msg.user_id))]
    pub async fn handle_private(&self, msg: &PrivateText) -> Result<NoteOutcome, DigestError> {
        let outcome = match parse_private_command(&msg.text) {
            PrivateCommand::StartNote(unit) => self.open_note(msg.user_id, unit).await,
            PrivateCommand::Start => {
                self.reply(msg.user_id, HELP_TEXT).await;
                NoteOutcome::Help
            }
            PrivateCommand::Cancel => match self.sessions.take(msg.user_id) {
                Some(unit) => {
                    self.release(unit);
                    self.reply(msg.user_id, NOTE_CANCELLED).await;
                    NoteOutcome::Cancelled(unit)
                }
                None => {
                    self.reply(msg.user_id, NOTHING_TO_CANCEL).await;
                    NoteOutcome::Ignored
                }
            },
            PrivateCommand::Text(text) => match self.sessions.take(msg.user_id) {
                Some(unit) => self.save_note(msg.user_id, unit, &text).await,
                None => {
                    debug!("No pending note for user {}, ignoring text", msg.user_id);
                    NoteOutcome::Ignored
                }
            },
        };
        Ok(outcome)
    }

    async fn open_note(&self, user: UserId, unit: MessageId) -> NoteOutcome {
        let ready = self
            .store
            .snapshot(unit)
            .is_some_and(|u| u.status == WorkStatus::Succeeded);
        if !ready {
            self.reply(user, STALE_ACTION_MESSAGE).await;
            return NoteOutcome::Rejected;
        }

        if let Some(previous) = self.sessions.open(user, unit) {
            info!("User {} switched note from {} to {}", user, previous, unit);
            self.release(previous);
        }
        if let Err(e) = self.store.update(unit, |u| u.note_pending = true) {
            debug!("Could not set note flag: {}", e);
        }
        self.reply(user, NOTE_PROMPT).await;
        NoteOutcome::Opened(unit)
    }

    async fn save_note(&self, user: UserId, unit: MessageId, note: &str) -> NoteOutcome {
        let still_awaited = self.sessions.is_awaiting(unit);
        let trace_ref = match self.store.update(unit, |u| {
            if !still_awaited {
                u.note_pending = false;
            }
            u.trace_ref.clone()
        }) {
            Ok(trace_ref) => trace_ref,
            Err(e) => {
                info!("Note for untracked unit: {}", e);
                self.reply(user, STALE_ACTION_MESSAGE).await;
                return NoteOutcome::Rejected;
            }
        };

        let ack = match trace_ref {
            Some(trace_ref) => match self.services.sink.score_comment(&trace_ref, note).await {
                Ok(()) => NOTE_SAVED,
                Err(e) => {
                    warn!("Failed to store note for {}: {}", unit, e);
                    NOTE_FAILED
                }
            },
            None => NOTE_UNTRACED,
        };
        self.reply(user, ack).await;
        info!("Note from user {} handled for unit {}", user, unit);
        NoteOutcome::Saved(unit)
    }
}
