//! An in-memory host for dry-running a penalty document.
//!
//! The sandbox models exactly one participant in one world. It resolves
//! vanilla status effect ids (with or without the `minecraft:` namespace)
//! and records everything the engine does to it.

use std::sync::{Mutex, PoisonError};

use penance_core::{
    CapabilityError, EconomyCapability, ExperienceCapability, GameRuleCapability,
    MessagingCapability, StatusEffectCapability,
};
use penance_types::{EffectHandle, ParticipantId, WorldId};
use rust_decimal::Decimal;
use serde::Serialize;

/// Namespace of the built-in effects.
const VANILLA_NAMESPACE: &str = "minecraft";

/// Built-in status effects the sandbox knows about.
const VANILLA_EFFECTS: &[&str] = &[
    "absorption",
    "bad_omen",
    "blindness",
    "conduit_power",
    "darkness",
    "dolphins_grace",
    "fire_resistance",
    "glowing",
    "haste",
    "health_boost",
    "hero_of_the_village",
    "hunger",
    "instant_damage",
    "instant_health",
    "invisibility",
    "jump_boost",
    "levitation",
    "luck",
    "mining_fatigue",
    "nausea",
    "night_vision",
    "poison",
    "regeneration",
    "resistance",
    "saturation",
    "slow_falling",
    "slowness",
    "speed",
    "strength",
    "unluck",
    "water_breathing",
    "weakness",
    "wither",
];

/// An effect the engine applied in the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedEffect {
    /// Registry key of the effect.
    pub key: String,
    /// Duration in ticks.
    pub duration_ticks: u32,
    /// Amplifier.
    pub amplifier: u32,
    /// Whether particles are shown.
    pub show_particles: bool,
}

/// State of the sandbox participant after a simulated respawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxState {
    /// Balance after the respawn.
    pub balance: Decimal,
    /// Experience after the respawn.
    pub experience: u32,
    /// Effects applied, in order.
    pub effects: Vec<AppliedEffect>,
    /// Messages delivered, in order.
    pub messages: Vec<String>,
}

/// A one-participant host.
#[derive(Debug)]
pub struct Sandbox {
    keep_inventory: bool,
    state: Mutex<SandboxState>,
}

impl Sandbox {
    /// A participant with `balance` and `experience` in a world whose
    /// keep-inventory rule is `keep_inventory`.
    pub const fn new(balance: Decimal, experience: u32, keep_inventory: bool) -> Self {
        Self {
            keep_inventory,
            state: Mutex::new(SandboxState {
                balance,
                experience,
                effects: Vec::new(),
                messages: Vec::new(),
            }),
        }
    }

    /// A copy of the current state.
    pub fn state(&self) -> SandboxState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SandboxState) -> T) -> T {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EconomyCapability for Sandbox {
    fn balance(&self, _participant: ParticipantId) -> Result<Decimal, CapabilityError> {
        Ok(self.with_state(|s| s.balance))
    }

    fn set_balance(&self, _participant: ParticipantId, balance: Decimal) -> Result<(), CapabilityError> {
        self.with_state(|s| s.balance = balance);
        Ok(())
    }
}

impl ExperienceCapability for Sandbox {
    fn experience(&self, _participant: ParticipantId) -> Result<u32, CapabilityError> {
        Ok(self.with_state(|s| s.experience))
    }

    fn set_experience(&self, _participant: ParticipantId, experience: u32) -> Result<(), CapabilityError> {
        self.with_state(|s| s.experience = experience);
        Ok(())
    }
}

impl StatusEffectCapability for Sandbox {
    fn resolve(&self, id: &str) -> Option<EffectHandle> {
        let name = match id.split_once(':') {
            Some((VANILLA_NAMESPACE, name)) => name,
            Some(_) => return None,
            None => id,
        };
        VANILLA_EFFECTS
            .contains(&name)
            .then(|| EffectHandle::new(format!("{VANILLA_NAMESPACE}:{name}")))
    }

    fn apply(
        &self,
        _participant: ParticipantId,
        effect: &EffectHandle,
        duration_ticks: u32,
        amplifier: u32,
        show_particles: bool,
    ) -> Result<(), CapabilityError> {
        self.with_state(|s| {
            s.effects.push(AppliedEffect {
                key: effect.key.clone(),
                duration_ticks,
                amplifier,
                show_particles,
            });
        });
        Ok(())
    }
}

impl GameRuleCapability for Sandbox {
    fn keep_inventory_enabled(&self, _world: WorldId) -> bool {
        self.keep_inventory
    }
}

impl MessagingCapability for Sandbox {
    fn deliver(&self, _participant: ParticipantId, text: &str) -> Result<(), CapabilityError> {
        self.with_state(|s| s.messages.push(text.to_owned()));
        Ok(())
    }
}
