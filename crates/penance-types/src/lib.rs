//! Shared type definitions for the Penance death penalty engine.
//!
//! These types cross every crate boundary in the workspace: the engine
//! produces them, stores persist some of them, and host adapters consume
//! them.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for participants and worlds
//! - [`enums`] -- Death causes and skipped-penalty reasons
//! - [`structs`] -- Status effect specs, respawn context, penalty results

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DeathCause, SkippedPenalty};
pub use ids::{ParticipantId, WorldId};
pub use structs::{EffectHandle, PenaltyResult, RespawnContext, StatusEffectSpec, TICKS_PER_SECOND};
