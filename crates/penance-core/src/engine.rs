//! The punishment engine: death and respawn handling.
//!
//! A death marks the victim pending (unless the death is exempt). The next
//! respawn of a pending participant applies the penalties of one catalog
//! snapshot in a fixed order:
//!
//! 1. currency
//! 2. experience (only where the world keeps inventory on death)
//! 3. status effects, in configuration order
//! 4. the death message
//!
//! and then clears the pending mark. A step that cannot be carried out is
//! recorded on the [`PenaltyResult`] and the remaining steps still run.

use std::sync::{Arc, PoisonError, RwLock};

use penance_types::{
    DeathCause, ParticipantId, PenaltyResult, RespawnContext, SkippedPenalty,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, warn};

use crate::capability::{EconomyCapability, HostCapabilities, PersistentStore};
use crate::catalog::{PenaltyCatalog, SharedCatalog};
use crate::error::EngineError;
use crate::message::params_for;
use crate::registry::PendingDeathRegistry;

/// Applies configured penalties to participants who died.
pub struct PunishmentEngine {
    catalog: SharedCatalog,
    registry: PendingDeathRegistry,
    store: Arc<dyn PersistentStore>,
    host: HostCapabilities,
    economy: RwLock<Option<Arc<dyn EconomyCapability>>>,
}

impl PunishmentEngine {
    /// Load the document, validate the catalog and restore pending deaths.
    ///
    /// The engine starts without an economy; register one with
    /// [`set_economy`](Self::set_economy).
    ///
    /// # Errors
    ///
    /// Refuses to start if the document cannot be read or the catalog is
    /// invalid.
    pub fn start(
        store: Arc<dyn PersistentStore>,
        host: HostCapabilities,
    ) -> Result<Self, EngineError> {
        let document = store.load()?;
        let catalog = PenaltyCatalog::load(&document)?;
        let registry =
            PendingDeathRegistry::new(Arc::clone(&store), document.recently_died_players);

        info!(
            catalog = %catalog,
            pending = registry.len(),
            "punishment engine started"
        );

        Ok(Self {
            catalog: SharedCatalog::new(catalog),
            registry,
            store,
            host,
            economy: RwLock::new(None),
        })
    }

    /// Re-read the document and swap in the new catalog.
    ///
    /// Pending deaths are not touched. A respawn already in progress
    /// finishes with the catalog it started with.
    ///
    /// # Errors
    ///
    /// On a store or validation error the previous catalog stays active and
    /// the error is returned.
    pub fn reload(&self) -> Result<Arc<PenaltyCatalog>, EngineError> {
        let loaded = self
            .store
            .load()
            .map_err(EngineError::from)
            .and_then(|document| PenaltyCatalog::load(&document).map_err(EngineError::from));

        match loaded {
            Ok(catalog) => {
                let current = self.catalog.replace(catalog);
                info!(catalog = %current, "penalty catalog reloaded");
                Ok(current)
            }
            Err(e) => {
                warn!(error = %e, "reload failed, keeping previous catalog");
                Err(e)
            }
        }
    }

    /// Register, replace or remove the economy provider.
    pub fn set_economy(&self, economy: Option<Arc<dyn EconomyCapability>>) {
        let present = economy.is_some();
        *self.economy.write().unwrap_or_else(PoisonError::into_inner) = economy;
        info!(present, "economy provider changed");
    }

    /// The catalog in effect right now.
    pub fn catalog(&self) -> Arc<PenaltyCatalog> {
        self.catalog.current()
    }

    /// The pending-death registry.
    pub const fn registry(&self) -> &PendingDeathRegistry {
        &self.registry
    }

    /// Handle a participant's death. Returns whether they are now pending.
    pub fn on_death(&self, victim: ParticipantId, cause: &DeathCause) -> bool {
        let catalog = self.catalog.current();
        if catalog.exempt_pvp && cause.is_pvp(victim) {
            debug!(%victim, %cause, "pvp death exempt from penalties");
            return false;
        }
        if self.registry.mark_pending(victim) {
            info!(%victim, %cause, "participant marked for penalty");
        }
        true
    }

    /// Handle a participant's respawn.
    ///
    /// Participants who are not pending get an empty result and nothing is
    /// mutated.
    pub fn on_respawn(&self, participant: ParticipantId, context: RespawnContext) -> PenaltyResult {
        if !self.registry.is_pending(participant) {
            return PenaltyResult::empty();
        }

        let catalog = self.catalog.current();
        let mut result = PenaltyResult::empty();

        self.apply_currency(participant, &catalog, &mut result);
        self.apply_experience(participant, context, &catalog, &mut result);
        self.apply_effects(participant, &catalog, &mut result);
        self.send_message(participant, &catalog, &mut result);

        self.registry.clear_pending(participant);

        info!(
            %participant,
            money_lost = ?result.money_lost,
            experience_lost = ?result.experience_lost,
            effects = result.applied_effects.len(),
            skipped = result.skipped.len(),
            "death penalty applied"
        );
        result
    }

    fn economy(&self) -> Option<Arc<dyn EconomyCapability>> {
        self.economy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn apply_currency(
        &self,
        participant: ParticipantId,
        catalog: &PenaltyCatalog,
        result: &mut PenaltyResult,
    ) {
        let policy = catalog.currency_policy;
        if policy.is_no_op() {
            return;
        }
        let Some(economy) = self.economy() else {
            warn!(%participant, "no economy provider, currency penalty skipped");
            result.skipped.push(SkippedPenalty::EconomyUnavailable);
            return;
        };

        let outcome = economy.balance(participant).and_then(|old| {
            let new = policy.apply(old);
            economy.set_balance(participant, new)?;
            Ok(old.checked_sub(new).unwrap_or(Decimal::ZERO))
        });
        match outcome {
            Ok(lost) => result.money_lost = Some(lost),
            Err(e) => {
                warn!(%participant, error = %e, "currency penalty failed");
                result.skipped.push(SkippedPenalty::EconomyFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn apply_experience(
        &self,
        participant: ParticipantId,
        context: RespawnContext,
        catalog: &PenaltyCatalog,
        result: &mut PenaltyResult,
    ) {
        let policy = catalog.experience_policy;
        if policy.is_no_op() {
            return;
        }
        if !self.host.game_rules.keep_inventory_enabled(context.world) {
            debug!(%participant, world = %context.world, "experience already dropped on death");
            return;
        }

        let experience = &self.host.experience;
        let outcome = experience.experience(participant).and_then(|old| {
            // Clamped at zero, then truncated toward zero.
            let new = policy
                .apply(Decimal::from(old))
                .max(Decimal::ZERO)
                .trunc()
                .to_u32()
                .unwrap_or(old);
            experience.set_experience(participant, new)?;
            Ok(old.saturating_sub(new))
        });
        match outcome {
            Ok(lost) => result.experience_lost = Some(lost),
            Err(e) => {
                warn!(%participant, error = %e, "experience penalty failed");
                result.skipped.push(SkippedPenalty::ExperienceFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn apply_effects(
        &self,
        participant: ParticipantId,
        catalog: &PenaltyCatalog,
        result: &mut PenaltyResult,
    ) {
        let effects = &self.host.effects;
        for spec in &catalog.status_effects {
            let Some(handle) = effects.resolve(&spec.id) else {
                warn!(%participant, effect = %spec.id, "unknown status effect skipped");
                result.skipped.push(SkippedPenalty::UnresolvedEffect {
                    id: spec.id.clone(),
                });
                continue;
            };
            match effects.apply(
                participant,
                &handle,
                spec.duration_ticks(),
                spec.amplifier,
                spec.show_particles,
            ) {
                Ok(()) => result.applied_effects.push(handle.display_name().to_owned()),
                Err(e) => {
                    warn!(%participant, effect = %spec.id, error = %e, "status effect failed");
                    result.skipped.push(SkippedPenalty::EffectFailed {
                        id: spec.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn send_message(
        &self,
        participant: ParticipantId,
        catalog: &PenaltyCatalog,
        result: &mut PenaltyResult,
    ) {
        if !catalog.messaging_enabled {
            return;
        }
        let messaging = &self.host.messaging;
        let params = params_for(result);
        let outcome = messaging
            .render(&catalog.message_template, &params)
            .and_then(|text| messaging.deliver(participant, &text).map(|()| text));
        match outcome {
            Ok(text) => result.message = Some(text),
            Err(e) => {
                warn!(%participant, error = %e, "death message not delivered");
                result.skipped.push(SkippedPenalty::MessageFailed {
                    reason: e.to_string(),
                });
            }
        }
    }
}

impl core::fmt::Debug for PunishmentEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PunishmentEngine")
            .field("catalog", &self.catalog.current())
            .field("registry", &self.registry)
            .field("economy", &self.economy().is_some())
            .finish_non_exhaustive()
    }
}
