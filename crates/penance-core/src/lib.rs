//! Core of the Penance death penalty engine.
//!
//! When a participant dies they are marked pending; when they respawn the
//! configured penalties are applied exactly once and the mark is cleared.
//! Everything the engine touches outside itself (balances, experience,
//! status effects, game rules, messages, storage) goes through the
//! capability traits in [`capability`].
//!
//! # Modules
//!
//! - [`reduction`] -- Parsing and applying relative/absolute reductions
//! - [`document`] -- The persisted YAML penalty document
//! - [`message`] -- Death message templates and their parameters
//! - [`catalog`] -- Validated, atomically swappable penalty catalog
//! - [`registry`] -- Durable set of pending deaths
//! - [`capability`] -- Host capability and storage traits
//! - [`engine`] -- Death and respawn handling
//! - [`error`] -- Error types

pub mod capability;
pub mod catalog;
pub mod document;
pub mod engine;
pub mod error;
pub mod message;
pub mod reduction;
pub mod registry;

pub use capability::{
    EconomyCapability, ExperienceCapability, GameRuleCapability, HostCapabilities,
    MessagingCapability, PersistentStore, StatusEffectCapability,
};
pub use catalog::{PenaltyCatalog, SharedCatalog};
pub use document::{DEFAULT_DEATH_MESSAGE, DeathTypes, PENDING_KEY, PenaltyDocument};
pub use engine::PunishmentEngine;
pub use error::{CapabilityError, ConfigError, EngineError, StoreError};
pub use message::{MessageParams, MessageTemplate};
pub use reduction::ReductionSpec;
pub use registry::PendingDeathRegistry;
