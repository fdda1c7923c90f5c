//! An in-process penalty document.

use std::sync::{Mutex, PoisonError};

use penance_core::{PenaltyDocument, PersistentStore, StoreError};
use penance_types::ParticipantId;

/// A store that keeps the document in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<PenaltyDocument>,
}

impl MemoryStore {
    /// A store holding `document`.
    pub const fn new(document: PenaltyDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    /// A copy of the stored document.
    pub fn document(&self) -> PenaltyDocument {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PersistentStore for MemoryStore {
    fn load(&self) -> Result<PenaltyDocument, StoreError> {
        Ok(self.document())
    }

    fn save(&self, document: &PenaltyDocument) -> Result<(), StoreError> {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = document.clone();
        Ok(())
    }

    fn save_pending(&self, pending: &[ParticipantId]) -> Result<(), StoreError> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recently_died_players = pending.to_vec();
        Ok(())
    }
}
