use serde::{Deserialize, Serialize};

/// Telegram message identifier inside a chat.
pub type MessageId = i64;
/// Telegram chat identifier (channels and supergroups are negative).
pub type ChatId = i64;
/// Telegram user identifier.
pub type UserId = i64;

/// Opaque handle into the observability sink for one summarization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceRef(pub String);

impl TraceRef {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Tracked record for one accepted post, keyed by the id of the message
/// rendered in the destination chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub id: MessageId,
    pub source_url: String,
    pub scraped_text: Option<String>,
    pub status: WorkStatus,
    pub last_error: Option<String>,
    pub trace_ref: Option<TraceRef>,
    pub rating: Option<bool>,
    /// Bumped on every accepted rating press; orders the renders and scores.
    pub rating_seq: u64,
    pub note_pending: bool,
}

impl WorkUnit {
    #[must_use]
    pub fn pending(id: MessageId, source_url: impl Into<String>) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            scraped_text: None,
            status: WorkStatus::Pending,
            last_error: None,
            trace_ref: None,
            rating: None,
            rating_seq: 0,
            note_pending: false,
        }
    }

    /// Put the unit back into `pending` for a fresh attempt. Only a failed
    /// unit can be restarted; returns whether the transition happened.
    pub fn restart(&mut self) -> bool {
        if self.status != WorkStatus::Failed {
            return false;
        }
        self.status = WorkStatus::Pending;
        self.scraped_text = None;
        self.last_error = None;
        self.trace_ref = None;
        true
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = WorkStatus::Failed;
        self.scraped_text = None;
        self.trace_ref = None;
        self.last_error = Some(reason.into());
    }

    pub fn succeed(&mut self, trace_ref: Option<TraceRef>) {
        self.status = WorkStatus::Succeeded;
        self.last_error = None;
        self.trace_ref = trace_ref;
    }

    /// Record a rating press. Rejected unless the unit succeeded.
    pub fn rate(&mut self, positive: bool) -> bool {
        if self.status != WorkStatus::Succeeded {
            return false;
        }
        self.rating = Some(positive);
        self.rating_seq += 1;
        true
    }
}

/// Interactive control attached to a rendered message, encoded as the
/// button's callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Retry,
    Rate(bool),
    AddNote,
}

impl ControlAction {
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            ControlAction::Retry => "retry",
            ControlAction::Rate(true) => "rate_up",
            ControlAction::Rate(false) => "rate_down",
            ControlAction::AddNote => "note",
        }
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "retry" => Some(ControlAction::Retry),
            "rate_up" => Some(ControlAction::Rate(true)),
            "rate_down" => Some(ControlAction::Rate(false)),
            "note" => Some(ControlAction::AddNote),
            _ => None,
        }
    }
}

/// A post observed in the source chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPost {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub author_id: Option<UserId>,
    pub text: String,
}

/// A button press on a message in the destination chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    pub press_id: String,
    pub chat_id: Option<ChatId>,
    pub message_id: Option<MessageId>,
    pub user_id: UserId,
    pub data: String,
}

/// A text message sent to the bot in a private chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateText {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub text: String,
}

/// Every inbound event the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Post(InboundPost),
    Press(ButtonPress),
    Private(PrivateText),
}
