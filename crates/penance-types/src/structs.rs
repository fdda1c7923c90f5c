//! Value structs shared between the engine, its stores and its hosts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::SkippedPenalty;
use crate::ids::WorldId;

/// Host ticks per real-time second.
pub const TICKS_PER_SECOND: u32 = 20;

// ---------------------------------------------------------------------------
// Status effects
// ---------------------------------------------------------------------------

/// A configured status effect to apply on respawn.
///
/// The `id` is kept as written in the document. It is resolved against the
/// host's effect registry only when a penalty is applied, because the
/// registry may still be filling up when configuration loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEffectSpec {
    /// Effect identifier, with or without namespace (`slowness`,
    /// `minecraft:slowness`).
    #[serde(default = "default_effect_id")]
    pub id: String,

    /// Duration in seconds.
    #[serde(default = "default_effect_duration", rename = "duration")]
    pub duration_seconds: u32,

    /// Effect amplifier (0 is level I).
    #[serde(default = "default_effect_amplifier")]
    pub amplifier: u32,

    /// Whether the effect shows particles around the participant.
    #[serde(default)]
    pub show_particles: bool,
}

impl StatusEffectSpec {
    /// Duration converted to host ticks, saturating at `u32::MAX`.
    pub const fn duration_ticks(&self) -> u32 {
        self.duration_seconds.saturating_mul(TICKS_PER_SECOND)
    }
}

impl Default for StatusEffectSpec {
    fn default() -> Self {
        Self {
            id: default_effect_id(),
            duration_seconds: default_effect_duration(),
            amplifier: default_effect_amplifier(),
            show_particles: false,
        }
    }
}

fn default_effect_id() -> String {
    "slowness".to_owned()
}

const fn default_effect_duration() -> u32 {
    180
}

const fn default_effect_amplifier() -> u32 {
    1
}

/// A status effect type resolved by the host's effect registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle {
    /// Fully qualified registry key, e.g. `minecraft:slowness`.
    pub key: String,
}

impl EffectHandle {
    /// Wrap a registry key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The key without its namespace, as shown to participants.
    pub fn display_name(&self) -> &str {
        self.key
            .split_once(':')
            .map_or(self.key.as_str(), |(_, name)| name)
    }
}

// ---------------------------------------------------------------------------
// Respawn context
// ---------------------------------------------------------------------------

/// Host-side facts about a respawn that the engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnContext {
    /// The world the participant respawns in. Game rules are per world.
    pub world: WorldId,
}

impl RespawnContext {
    /// Context for a respawn in `world`.
    pub const fn new(world: WorldId) -> Self {
        Self { world }
    }
}

// ---------------------------------------------------------------------------
// Penalty result
// ---------------------------------------------------------------------------

/// What a single respawn actually cost the participant.
///
/// Built fresh for every respawn and never persisted. A `None` field means
/// that penalty was not applied, either because it is configured as a
/// no-op or because it was skipped (see [`skipped`](Self::skipped)).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyResult {
    /// Currency removed from the participant's balance.
    pub money_lost: Option<Decimal>,

    /// Experience points removed.
    pub experience_lost: Option<u32>,

    /// Display names of the applied status effects, in configuration order.
    pub applied_effects: Vec<String>,

    /// Penalty steps that were attempted but could not be carried out.
    pub skipped: Vec<SkippedPenalty>,

    /// The death message delivered to the participant, if any.
    pub message: Option<String>,
}

impl PenaltyResult {
    /// An empty result: nothing applied, nothing skipped.
    pub const fn empty() -> Self {
        Self {
            money_lost: None,
            experience_lost: None,
            applied_effects: Vec::new(),
            skipped: Vec::new(),
            message: None,
        }
    }

    /// Whether no penalty of any kind was applied.
    pub fn is_empty(&self) -> bool {
        self.money_lost.is_none()
            && self.experience_lost.is_none()
            && self.applied_effects.is_empty()
    }
}
