//! Pending deaths across process restarts, backed by a real YAML file.
//!
//! Each "process" is a fresh [`PunishmentEngine`] over a fresh
//! [`FileStore`] pointing at the same path; nothing but the file carries
//! state between them.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use penance_core::{
    CapabilityError, EconomyCapability, ExperienceCapability, GameRuleCapability,
    HostCapabilities, MessagingCapability, PenaltyDocument, PersistentStore, PunishmentEngine,
    StatusEffectCapability,
};
use penance_store::FileStore;
use penance_types::{DeathCause, EffectHandle, ParticipantId, RespawnContext, WorldId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Balances and experience that outlive the engine, as a game server's
/// player data would.
#[derive(Default)]
struct World {
    balances: Mutex<BTreeMap<ParticipantId, Decimal>>,
    experience: Mutex<BTreeMap<ParticipantId, u32>>,
}

impl EconomyCapability for World {
    fn balance(&self, participant: ParticipantId) -> Result<Decimal, CapabilityError> {
        Ok(self.balances.lock().unwrap().get(&participant).copied().unwrap_or_default())
    }

    fn set_balance(&self, participant: ParticipantId, balance: Decimal) -> Result<(), CapabilityError> {
        self.balances.lock().unwrap().insert(participant, balance);
        Ok(())
    }
}

impl ExperienceCapability for World {
    fn experience(&self, participant: ParticipantId) -> Result<u32, CapabilityError> {
        Ok(self.experience.lock().unwrap().get(&participant).copied().unwrap_or_default())
    }

    fn set_experience(&self, participant: ParticipantId, experience: u32) -> Result<(), CapabilityError> {
        self.experience.lock().unwrap().insert(participant, experience);
        Ok(())
    }
}

impl StatusEffectCapability for World {
    fn resolve(&self, _id: &str) -> Option<EffectHandle> {
        None
    }

    fn apply(
        &self,
        _participant: ParticipantId,
        _effect: &EffectHandle,
        _duration_ticks: u32,
        _amplifier: u32,
        _show_particles: bool,
    ) -> Result<(), CapabilityError> {
        Ok(())
    }
}

impl GameRuleCapability for World {
    fn keep_inventory_enabled(&self, _world: WorldId) -> bool {
        true
    }
}

impl MessagingCapability for World {
    fn deliver(&self, _participant: ParticipantId, _text: &str) -> Result<(), CapabilityError> {
        Ok(())
    }
}

/// Start a fresh engine over the file at `path`.
fn boot(path: &Path, world: &Arc<World>) -> PunishmentEngine {
    let store = FileStore::open(path).expect("store opens");
    let host = HostCapabilities {
        experience: Arc::clone(world) as Arc<dyn ExperienceCapability>,
        effects: Arc::clone(world) as Arc<dyn StatusEffectCapability>,
        game_rules: Arc::clone(world) as Arc<dyn GameRuleCapability>,
        messaging: Arc::clone(world) as Arc<dyn MessagingCapability>,
    };
    let engine = PunishmentEngine::start(Arc::new(store), host).expect("engine starts");
    engine.set_economy(Some(Arc::clone(world) as Arc<dyn EconomyCapability>));
    engine
}

#[test]
fn pending_death_survives_restart_and_is_applied_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penance-config.yaml");
    FileStore::open(&path)
        .unwrap()
        .save(&PenaltyDocument {
            money_reduction: "10".to_owned(),
            xp_reduction: "50%".to_owned(),
            ..PenaltyDocument::default()
        })
        .unwrap();

    let world = Arc::new(World::default());
    let id = ParticipantId::new();
    world.balances.lock().unwrap().insert(id, dec!(100));
    world.experience.lock().unwrap().insert(id, 40);

    // First process: the participant dies, then the server stops.
    {
        let engine = boot(&path, &world);
        assert!(engine.on_death(id, &DeathCause::Environment));
    }

    // Second process: the participant respawns.
    {
        let engine = boot(&path, &world);
        assert!(engine.registry().is_pending(id));
        let result = engine.on_respawn(id, RespawnContext::new(WorldId::new()));
        assert_eq!(result.money_lost, Some(dec!(10)));
        assert_eq!(result.experience_lost, Some(20));
    }

    // Third process: another respawn must not punish again.
    {
        let engine = boot(&path, &world);
        assert!(!engine.registry().is_pending(id));
        let result = engine.on_respawn(id, RespawnContext::new(WorldId::new()));
        assert!(result.is_empty());
    }

    assert_eq!(world.balances.lock().unwrap().get(&id), Some(&dec!(90)));
    assert_eq!(world.experience.lock().unwrap().get(&id), Some(&20));
}

#[test]
fn registry_flush_keeps_operator_keys_and_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penance-config.yaml");
    fs::write(
        &path,
        "# tuned for the hardcore world\nmoneyReduction: 25\nmotd: be careful out there\n",
    )
    .unwrap();

    let world = Arc::new(World::default());
    let engine = boot(&path, &world);
    let id = ParticipantId::new();
    engine.on_death(id, &DeathCause::Environment);

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("motd: be careful out there"));
    assert!(raw.contains(&id.to_string()));

    // The operator changes a setting while the server runs; a later flush
    // must not undo it.
    let edited = raw.replace("moneyReduction: 25", "moneyReduction: 30");
    fs::write(&path, edited).unwrap();
    engine.on_respawn(id, RespawnContext::new(WorldId::new()));

    let doc = FileStore::open(&path).unwrap().load().unwrap();
    assert_eq!(doc.money_reduction, "30");
    assert!(doc.recently_died_players.is_empty());
}

#[test]
fn reload_picks_up_file_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penance-config.yaml");
    let world = Arc::new(World::default());
    let engine = boot(&path, &world);
    assert!(engine.catalog().currency_policy.is_no_op());

    fs::write(&path, "moneyReduction: \"5%\"\n").unwrap();
    let catalog = engine.reload().unwrap();
    assert!(!catalog.currency_policy.is_no_op());

    fs::write(&path, "moneyReduction: \"5%%\"\n").unwrap();
    assert!(engine.reload().is_err());
    assert_eq!(engine.catalog(), catalog);
}

#[test]
fn sample_document_survives_a_flush_without_its_comments() {
    let sample = include_str!("../../../penance-config.yaml");
    assert!(sample.contains("these comments are not"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("penance-config.yaml");
    fs::write(&path, sample).unwrap();
    let store = FileStore::open(&path).unwrap();
    let before = store.load().unwrap();

    let id = ParticipantId::new();
    store.save_pending(&[id]).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(!raw.contains('#'));
    let after = store.load().unwrap();
    assert_eq!(after.recently_died_players, vec![id]);
    assert_eq!(
        PenaltyDocument {
            recently_died_players: Vec::new(),
            ..after
        },
        before
    );
}
