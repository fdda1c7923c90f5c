//! The validated penalty catalog and its atomically swappable holder.
//!
//! A [`PenaltyCatalog`] is built from a [`PenaltyDocument`] and never
//! changes afterwards. Reloading builds a complete new catalog and swaps
//! the [`SharedCatalog`] pointer in one step, so a respawn in progress keeps
//! working on the snapshot it started with.

use std::sync::{Arc, PoisonError, RwLock};

use penance_types::StatusEffectSpec;

use crate::document::PenaltyDocument;
use crate::error::ConfigError;
use crate::message::MessageTemplate;
use crate::reduction::ReductionSpec;

/// Document key of the currency reduction.
pub const MONEY_REDUCTION_KEY: &str = "moneyReduction";

/// Document key of the experience reduction.
pub const XP_REDUCTION_KEY: &str = "xpReduction";

/// An immutable, validated snapshot of the configured penalties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyCatalog {
    /// Reduction applied to the participant's currency balance.
    pub currency_policy: ReductionSpec,
    /// Reduction applied to the participant's experience.
    pub experience_policy: ReductionSpec,
    /// Status effects applied on respawn, in order. Ids are unresolved.
    pub status_effects: Vec<StatusEffectSpec>,
    /// Whether the death message is delivered.
    pub messaging_enabled: bool,
    /// The death message template.
    pub message_template: MessageTemplate,
    /// Whether deaths caused by another participant are exempt.
    pub exempt_pvp: bool,
}

impl PenaltyCatalog {
    /// Validate a document and build a catalog from it.
    ///
    /// Both reductions are parsed and the message template is compiled here,
    /// so a bad document is rejected at load time. Status effect ids are
    /// copied verbatim; they are resolved when applied.
    pub fn load(document: &PenaltyDocument) -> Result<Self, ConfigError> {
        let currency_policy = ReductionSpec::parse(&document.money_reduction, MONEY_REDUCTION_KEY)?;
        let experience_policy = ReductionSpec::parse(&document.xp_reduction, XP_REDUCTION_KEY)?;
        let message_template = MessageTemplate::compile(document.death_message.as_str())?;

        Ok(Self {
            currency_policy,
            experience_policy,
            status_effects: document.potion_effects.clone(),
            messaging_enabled: document.send_death_message,
            message_template,
            exempt_pvp: document.death_types.pvp,
        })
    }

    /// Whether a respawn under this catalog takes nothing from the
    /// participant. The death message may still be sent.
    pub fn is_inert(&self) -> bool {
        self.currency_policy.is_no_op()
            && self.experience_policy.is_no_op()
            && self.status_effects.is_empty()
    }
}

impl core::fmt::Display for PenaltyCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "money -{} | xp -{} | {} effect(s) | message {} | pvp {}",
            self.currency_policy,
            self.experience_policy,
            self.status_effects.len(),
            if self.messaging_enabled { "on" } else { "off" },
            if self.exempt_pvp { "exempt" } else { "punished" },
        )
    }
}

/// Holder for the active catalog, swapped atomically on reload.
///
/// Readers take a short read lock to clone the inner [`Arc`] and then work
/// lock-free on their snapshot. A poisoned lock is recovered from, since the
/// guarded value is only ever replaced whole.
#[derive(Debug)]
pub struct SharedCatalog {
    current: RwLock<Arc<PenaltyCatalog>>,
}

impl SharedCatalog {
    /// Wrap an initial catalog.
    pub fn new(catalog: PenaltyCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The catalog in effect right now.
    pub fn current(&self) -> Arc<PenaltyCatalog> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the active catalog, returning the new snapshot.
    pub fn replace(&self, catalog: PenaltyCatalog) -> Arc<PenaltyCatalog> {
        let next = Arc::new(catalog);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&next);
        next
    }
}
