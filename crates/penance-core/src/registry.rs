//! The durable set of participants awaiting their death penalty.
//!
//! A participant enters the registry when they die (unless exempt) and
//! leaves it when their respawn has been processed. The registry lives in
//! memory behind one mutex; every change is flushed to the
//! [`PersistentStore`] before the call returns, while the lock is still
//! held, so the stored list always matches some state the registry was
//! actually in.
//!
//! # Durability
//!
//! - Crash after `mark_pending` returns: the death is recovered at start.
//! - Crash after `clear_pending` returns: the penalty is not applied again.
//! - A failed flush is logged and the in-memory change is kept. Until the
//!   next successful flush the stored list lags behind; a crash in that
//!   window loses or repeats one transition.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use penance_types::ParticipantId;
use tracing::{debug, warn};

use crate::capability::PersistentStore;
use crate::error::StoreError;

/// Participants who died and have not yet respawned.
pub struct PendingDeathRegistry {
    pending: Mutex<BTreeSet<ParticipantId>>,
    store: Arc<dyn PersistentStore>,
}

impl PendingDeathRegistry {
    /// Create a registry seeded with `initial` ids. Nothing is flushed.
    pub fn new(store: Arc<dyn PersistentStore>, initial: impl IntoIterator<Item = ParticipantId>) -> Self {
        Self {
            pending: Mutex::new(initial.into_iter().collect()),
            store,
        }
    }

    /// Rebuild the registry from the stored document.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the document cannot be read.
    pub fn restore(store: Arc<dyn PersistentStore>) -> Result<Self, StoreError> {
        let document = store.load()?;
        Ok(Self::new(store, document.recently_died_players))
    }

    /// Mark a participant as pending. Returns `true` if they were not
    /// pending before; marking twice is a no-op and flushes nothing.
    pub fn mark_pending(&self, participant: ParticipantId) -> bool {
        let mut pending = self.lock();
        if !pending.insert(participant) {
            debug!(%participant, "participant already pending");
            return false;
        }
        self.flush(&pending);
        true
    }

    /// Whether a participant is pending.
    pub fn is_pending(&self, participant: ParticipantId) -> bool {
        self.lock().contains(&participant)
    }

    /// Remove a participant. Returns `true` if they were pending; clearing
    /// an absent id is a no-op and flushes nothing.
    pub fn clear_pending(&self, participant: ParticipantId) -> bool {
        let mut pending = self.lock();
        if !pending.remove(&participant) {
            debug!(%participant, "participant was not pending");
            return false;
        }
        self.flush(&pending);
        true
    }

    /// All pending ids, sorted.
    pub fn snapshot(&self) -> Vec<ParticipantId> {
        self.lock().iter().copied().collect()
    }

    /// Number of pending participants.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nobody is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Lock the set. Poisoning is recovered from: the set is valid after
    /// every individual insert or remove.
    fn lock(&self) -> MutexGuard<'_, BTreeSet<ParticipantId>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the current set to the store. Called with the lock held.
    fn flush(&self, pending: &BTreeSet<ParticipantId>) {
        let ids: Vec<ParticipantId> = pending.iter().copied().collect();
        if let Err(e) = self.store.save_pending(&ids) {
            warn!(
                error = %e,
                pending = ids.len(),
                "failed to persist pending deaths, in-memory state kept"
            );
        }
    }
}

impl core::fmt::Debug for PendingDeathRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingDeathRegistry")
            .field("pending", &self.len())
            .finish_non_exhaustive()
    }
}
