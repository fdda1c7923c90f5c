//! Host capabilities the engine calls but does not implement.
//!
//! A host (a game server plugin layer, the admin sandbox, a test) supplies
//! these as trait objects. Every call is synchronous and fallible; the
//! engine never retries and never times out a call. A failed call skips
//! the affected penalty and is logged.

use std::sync::Arc;

use penance_types::{EffectHandle, ParticipantId, WorldId};
use rust_decimal::Decimal;

use crate::document::PenaltyDocument;
use crate::error::{CapabilityError, StoreError};
use crate::message::{MessageParams, MessageTemplate};

/// Currency balances. Optional: a server may run without an economy.
pub trait EconomyCapability: Send + Sync {
    /// The participant's current balance in the default currency.
    fn balance(&self, participant: ParticipantId) -> Result<Decimal, CapabilityError>;

    /// Overwrite the participant's balance. Providers that forbid negative
    /// balances reject the write.
    fn set_balance(&self, participant: ParticipantId, balance: Decimal)
    -> Result<(), CapabilityError>;
}

/// The participant's total experience counter.
pub trait ExperienceCapability: Send + Sync {
    /// Current total experience.
    fn experience(&self, participant: ParticipantId) -> Result<u32, CapabilityError>;

    /// Overwrite total experience.
    fn set_experience(&self, participant: ParticipantId, experience: u32)
    -> Result<(), CapabilityError>;
}

/// The host's status effect registry.
pub trait StatusEffectCapability: Send + Sync {
    /// Look up an effect type by configured id. `None` if unknown.
    fn resolve(&self, id: &str) -> Option<EffectHandle>;

    /// Apply an effect to the participant.
    fn apply(
        &self,
        participant: ParticipantId,
        effect: &EffectHandle,
        duration_ticks: u32,
        amplifier: u32,
        show_particles: bool,
    ) -> Result<(), CapabilityError>;
}

/// Per-world game rules.
pub trait GameRuleCapability: Send + Sync {
    /// Whether dying keeps the inventory and experience in `world`.
    fn keep_inventory_enabled(&self, world: WorldId) -> bool;
}

/// Text rendering and delivery to a participant's client.
pub trait MessagingCapability: Send + Sync {
    /// Render the death message. The default renders the minijinja template
    /// as-is; hosts override this to add formatting or localisation.
    fn render(
        &self,
        template: &MessageTemplate,
        params: &MessageParams,
    ) -> Result<String, CapabilityError> {
        template
            .render(params)
            .map_err(|e| CapabilityError::Rejected(format!("render failed: {e}")))
    }

    /// Send text to the participant.
    fn deliver(&self, participant: ParticipantId, text: &str) -> Result<(), CapabilityError>;
}

/// Durable storage for the penalty document.
pub trait PersistentStore: Send + Sync {
    /// Read the whole document.
    fn load(&self) -> Result<PenaltyDocument, StoreError>;

    /// Replace the whole document.
    fn save(&self, document: &PenaltyDocument) -> Result<(), StoreError>;

    /// Rewrite only the pending-death list, leaving every other key of the
    /// stored document as it is. Must be durable when it returns.
    fn save_pending(&self, pending: &[ParticipantId]) -> Result<(), StoreError>;
}

/// The non-optional capabilities a host must provide.
#[derive(Clone)]
pub struct HostCapabilities {
    /// Experience counter access.
    pub experience: Arc<dyn ExperienceCapability>,
    /// Status effect registry.
    pub effects: Arc<dyn StatusEffectCapability>,
    /// Game rule lookup.
    pub game_rules: Arc<dyn GameRuleCapability>,
    /// Message rendering and delivery.
    pub messaging: Arc<dyn MessagingCapability>,
}

impl core::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HostCapabilities").finish_non_exhaustive()
    }
}
