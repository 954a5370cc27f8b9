//! In-memory work unit store.
//!
//! The key set sits behind a `RwLock`; each entry has its own `Mutex` so a
//! read-modify-write on one unit never blocks another. Closures passed to
//! [`WorkUnitStore::update`] run synchronously under the entry lock, so no
//! lock is ever held across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::models::{ChatId, MessageId, WorkUnit};
use crate::errors::DigestError;

type Entry = Arc<Mutex<WorkUnit>>;

#[derive(Debug, Default)]
pub struct WorkUnitStore {
    units: RwLock<HashMap<MessageId, Entry>>,
    seen_posts: Mutex<HashSet<(ChatId, MessageId)>>,
}

impl WorkUnitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new unit. Ids are never reused, so inserting an id that is
    /// already present is an error and leaves the existing entry untouched.
    ///
    /// # Errors
    ///
    /// Returns `DigestError::GeneralError` when the id is already tracked.
    pub fn insert(&self, unit: WorkUnit) -> Result<(), DigestError> {
        let mut units = self.units.write().unwrap_or_else(PoisonError::into_inner);
        if units.contains_key(&unit.id) {
            return Err(DigestError::GeneralError(format!(
                "work unit {} already exists",
                unit.id
            )));
        }
        units.insert(unit.id, Arc::new(Mutex::new(unit)));
        Ok(())
    }

    fn entry(&self, id: MessageId) -> Option<Entry> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Clone of the unit as it is right now.
    #[must_use]
    pub fn snapshot(&self, id: MessageId) -> Option<WorkUnit> {
        let entry = self.entry(id)?;
        let unit = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Some(unit.clone())
    }

    /// Run `f` against the unit under its entry lock.
    ///
    /// # Errors
    ///
    /// Returns `DigestError::UnknownWorkUnit` when the id is not tracked
    /// (never created, or lost with a restart).
    pub fn update<R>(
        &self,
        id: MessageId,
        f: impl FnOnce(&mut WorkUnit) -> R,
    ) -> Result<R, DigestError> {
        let entry = self.entry(id).ok_or(DigestError::UnknownWorkUnit(id))?;
        let mut unit = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut unit))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark a source post as seen. Returns `false` when the same post was
    /// already claimed, which happens when the platform redelivers an update.
    pub fn claim_source(&self, chat_id: ChatId, message_id: MessageId) -> bool {
        self.seen_posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((chat_id, message_id))
    }
}
