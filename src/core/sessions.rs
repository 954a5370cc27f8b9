use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::models::{MessageId, UserId};

/// Private-chat users waiting to send a note, mapped to the work unit the
/// note belongs to. One pending note per user; a new request replaces the
/// old one.
#[derive(Debug, Default)]
pub struct NoteSessions {
    pending: Mutex<HashMap<UserId, MessageId>>,
}

impl NoteSessions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for a note from `user`. Returns the unit the user was
    /// previously annotating, if the new request replaced one.
    pub fn open(&self, user: UserId, unit: MessageId) -> Option<MessageId> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, unit)
            .filter(|previous| *previous != unit)
    }

    /// Consume the pending mapping for `user`.
    pub fn take(&self, user: UserId) -> Option<MessageId> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user)
    }

    #[must_use]
    pub fn pending_for(&self, user: UserId) -> Option<MessageId> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .copied()
    }

    /// Whether any user is still annotating `unit`.
    #[must_use]
    pub fn is_awaiting(&self, unit: MessageId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .any(|id| *id == unit)
    }
}
