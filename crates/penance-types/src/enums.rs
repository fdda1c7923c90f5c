//! Enumeration types for the Penance engine.

use serde::{Deserialize, Serialize};

use crate::ids::ParticipantId;

// ---------------------------------------------------------------------------
// Death causes
// ---------------------------------------------------------------------------

/// What killed a participant, as reported by the host's death event.
///
/// The engine only cares about one distinction: whether another participant
/// was responsible (player-vs-player), because PvP deaths can be exempted
/// from punishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DeathCause {
    /// Anything that is not a participant: falling, drowning, mobs, lava.
    Environment,
    /// A participant is named in the death cause chain.
    Participant {
        /// The participant credited with the kill.
        killer: ParticipantId,
    },
}

impl DeathCause {
    /// Whether this death counts as player-vs-player for `victim`.
    ///
    /// A participant credited with their own death (e.g. their own
    /// explosive) is not PvP.
    pub fn is_pvp(&self, victim: ParticipantId) -> bool {
        match self {
            Self::Environment => false,
            Self::Participant { killer } => *killer != victim,
        }
    }
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::Participant { killer } => write!(f, "participant:{killer}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Skipped penalties
// ---------------------------------------------------------------------------

/// A penalty step that could not be carried out during a respawn.
///
/// None of these abort the remaining steps. They are collected on the
/// [`PenaltyResult`](crate::PenaltyResult) so hosts and operators can see
/// exactly what was skipped and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SkippedPenalty {
    /// No economy provider is registered.
    EconomyUnavailable,
    /// The economy provider failed to read or write the balance.
    EconomyFailed {
        /// Description reported by the provider.
        reason: String,
    },
    /// The host failed to read or write the experience counter.
    ExperienceFailed {
        /// Description reported by the host.
        reason: String,
    },
    /// A configured status effect id is not known to the effect registry.
    UnresolvedEffect {
        /// The configured id.
        id: String,
    },
    /// The host refused to apply a resolved status effect.
    EffectFailed {
        /// The configured id.
        id: String,
        /// Description reported by the host.
        reason: String,
    },
    /// The death message could not be rendered or delivered.
    MessageFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl core::fmt::Display for SkippedPenalty {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EconomyUnavailable => write!(f, "economy unavailable"),
            Self::EconomyFailed { reason } => write!(f, "economy failed: {reason}"),
            Self::ExperienceFailed { reason } => write!(f, "experience failed: {reason}"),
            Self::UnresolvedEffect { id } => write!(f, "unresolved effect: {id}"),
            Self::EffectFailed { id, reason } => write!(f, "effect {id} failed: {reason}"),
            Self::MessageFailed { reason } => write!(f, "message failed: {reason}"),
        }
    }
}
