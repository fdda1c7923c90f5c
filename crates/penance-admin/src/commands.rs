//! Operator commands. Each writes its report to `out`.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use penance_core::{
    EconomyCapability, ExperienceCapability, GameRuleCapability, HostCapabilities,
    MessagingCapability, PenaltyCatalog, PendingDeathRegistry, PersistentStore, PunishmentEngine,
    StatusEffectCapability,
};
use penance_store::{FileStore, MemoryStore};
use penance_types::{DeathCause, ParticipantId, PenaltyResult, RespawnContext, WorldId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::sandbox::{Sandbox, SandboxState};

/// Inputs of a simulated death and respawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    /// Starting balance.
    pub balance: Decimal,
    /// Starting experience.
    pub experience: u32,
    /// Whether the respawn world keeps inventory on death.
    pub keep_inventory: bool,
    /// Run without an economy provider.
    pub no_economy: bool,
    /// Die to another participant instead of the environment.
    pub pvp: bool,
}

/// What `simulate` prints.
#[derive(Debug, Serialize)]
struct SimulationReport {
    marked_pending: bool,
    result: PenaltyResult,
    after: SandboxState,
}

fn open(path: &Path) -> Result<FileStore> {
    FileStore::open_existing(path)
        .with_context(|| format!("no penalty document at {}", path.display()))
}

/// Validate the document and print the catalog summary.
pub fn check(path: &Path, out: &mut impl Write) -> Result<()> {
    let store = open(path)?;
    let document = store
        .load()
        .with_context(|| format!("failed to read {}", path.display()))?;
    let catalog = PenaltyCatalog::load(&document)
        .with_context(|| format!("{} is not a valid penalty document", path.display()))?;

    writeln!(out, "{}: ok", store.path().display())?;
    writeln!(out, "{catalog}")?;
    if catalog.is_inert() {
        writeln!(out, "  no penalty is configured, deaths cost nothing")?;
    }
    for effect in &catalog.status_effects {
        writeln!(
            out,
            "  effect {} for {}s, amplifier {}",
            effect.id, effect.duration_seconds, effect.amplifier
        )?;
    }
    if catalog.messaging_enabled {
        writeln!(out, "  message {}", catalog.message_template.source())?;
    }
    writeln!(out, "{} pending death(s)", document.recently_died_players.len())?;
    Ok(())
}

/// List pending participants.
pub fn pending(path: &Path, json: bool, out: &mut impl Write) -> Result<()> {
    let registry = PendingDeathRegistry::restore(Arc::new(open(path)?))
        .with_context(|| format!("failed to read {}", path.display()))?;
    let ids = registry.snapshot();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&ids)?)?;
    } else {
        for id in &ids {
            writeln!(out, "{id}")?;
        }
    }
    Ok(())
}

/// Clear a pending death without applying any penalty.
pub fn forgive(path: &Path, participant: ParticipantId, out: &mut impl Write) -> Result<()> {
    let registry = PendingDeathRegistry::restore(Arc::new(open(path)?))
        .with_context(|| format!("failed to read {}", path.display()))?;

    if registry.clear_pending(participant) {
        info!(%participant, "pending death forgiven");
        writeln!(out, "forgave {participant}")?;
    } else {
        writeln!(out, "{participant} has no pending death")?;
    }
    Ok(())
}

/// Write the default document.
pub fn init(path: &Path, out: &mut impl Write) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    FileStore::open(path).with_context(|| format!("failed to create {}", path.display()))?;
    writeln!(out, "wrote default penalty document to {}", path.display())?;
    Ok(())
}

/// Dry-run one death and respawn against an in-memory copy of the document.
pub fn simulate(path: &Path, simulation: Simulation, out: &mut impl Write) -> Result<()> {
    let mut document = open(path)?
        .load()
        .with_context(|| format!("failed to read {}", path.display()))?;
    document.recently_died_players.clear();

    let sandbox = Arc::new(Sandbox::new(
        simulation.balance,
        simulation.experience,
        simulation.keep_inventory,
    ));
    let host = HostCapabilities {
        experience: Arc::clone(&sandbox) as Arc<dyn ExperienceCapability>,
        effects: Arc::clone(&sandbox) as Arc<dyn StatusEffectCapability>,
        game_rules: Arc::clone(&sandbox) as Arc<dyn GameRuleCapability>,
        messaging: Arc::clone(&sandbox) as Arc<dyn MessagingCapability>,
    };
    let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new(document));
    let engine = PunishmentEngine::start(store, host)
        .with_context(|| format!("{} is not a valid penalty document", path.display()))?;
    if !simulation.no_economy {
        engine.set_economy(Some(Arc::clone(&sandbox) as Arc<dyn EconomyCapability>));
    }

    let participant = ParticipantId::new();
    let cause = if simulation.pvp {
        DeathCause::Participant {
            killer: ParticipantId::new(),
        }
    } else {
        DeathCause::Environment
    };
    let marked_pending = engine.on_death(participant, &cause);
    let result = engine.on_respawn(participant, RespawnContext::new(WorldId::new()));

    let report = SimulationReport {
        marked_pending,
        result,
        after: sandbox.state(),
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
