//! Catalog reloads racing with respawns.
//!
//! A respawn must finish with the catalog it started with: its currency,
//! experience, effects and message all come from one snapshot even if an
//! operator reloads halfway through.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::panic,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};
use std::thread;

use penance_core::{
    CapabilityError, EconomyCapability, ExperienceCapability, GameRuleCapability,
    HostCapabilities, MessagingCapability, PenaltyDocument, PersistentStore, PunishmentEngine,
    StatusEffectCapability, StoreError,
};
use penance_types::{
    DeathCause, EffectHandle, ParticipantId, RespawnContext, StatusEffectSpec, WorldId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// In-memory document store.
#[derive(Default)]
struct Store(Mutex<PenaltyDocument>);

impl Store {
    fn set(&self, document: PenaltyDocument) {
        let mut current = self.0.lock().unwrap();
        let pending = std::mem::take(&mut current.recently_died_players);
        *current = PenaltyDocument {
            recently_died_players: pending,
            ..document
        };
    }
}

impl PersistentStore for Store {
    fn load(&self) -> Result<PenaltyDocument, StoreError> {
        Ok(self.0.lock().unwrap().clone())
    }

    fn save(&self, document: &PenaltyDocument) -> Result<(), StoreError> {
        *self.0.lock().unwrap() = document.clone();
        Ok(())
    }

    fn save_pending(&self, pending: &[ParticipantId]) -> Result<(), StoreError> {
        self.0.lock().unwrap().recently_died_players = pending.to_vec();
        Ok(())
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// A host where every participant has 100 coins and 40 experience, and
/// reading experience can trigger a hook.
#[derive(Default)]
struct Host {
    balances: Mutex<BTreeMap<ParticipantId, Decimal>>,
    on_experience_read: Mutex<Option<Hook>>,
}

impl EconomyCapability for Host {
    fn balance(&self, participant: ParticipantId) -> Result<Decimal, CapabilityError> {
        Ok(*self
            .balances
            .lock()
            .unwrap()
            .entry(participant)
            .or_insert(dec!(100)))
    }

    fn set_balance(&self, participant: ParticipantId, balance: Decimal) -> Result<(), CapabilityError> {
        self.balances.lock().unwrap().insert(participant, balance);
        Ok(())
    }
}

impl ExperienceCapability for Host {
    fn experience(&self, _participant: ParticipantId) -> Result<u32, CapabilityError> {
        let hook = self.on_experience_read.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(40)
    }

    fn set_experience(&self, _participant: ParticipantId, _experience: u32) -> Result<(), CapabilityError> {
        Ok(())
    }
}

impl StatusEffectCapability for Host {
    fn resolve(&self, id: &str) -> Option<EffectHandle> {
        Some(EffectHandle::new(format!("minecraft:{id}")))
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

impl GameRuleCapability for Host {
    fn keep_inventory_enabled(&self, _world: WorldId) -> bool {
        true
    }
}

impl MessagingCapability for Host {
    fn deliver(&self, _participant: ParticipantId, _text: &str) -> Result<(), CapabilityError> {
        Ok(())
    }
}

fn catalog_document(label: &str, money: &str, effect: &str) -> PenaltyDocument {
    PenaltyDocument {
        money_reduction: money.to_owned(),
        xp_reduction: "50%".to_owned(),
        potion_effects: vec![StatusEffectSpec {
            id: effect.to_owned(),
            ..StatusEffectSpec::default()
        }],
        death_message: format!("{label}: {{{{ moneyLoss }}}} {{{{ potionEffects }}}}"),
        ..PenaltyDocument::default()
    }
}

fn start(document: PenaltyDocument) -> (Arc<Store>, Arc<Host>, Arc<PunishmentEngine>) {
    let store = Arc::new(Store::default());
    store.set(document);
    let host = Arc::new(Host::default());
    let capabilities = HostCapabilities {
        experience: Arc::clone(&host) as Arc<dyn ExperienceCapability>,
        effects: Arc::clone(&host) as Arc<dyn StatusEffectCapability>,
        game_rules: Arc::clone(&host) as Arc<dyn GameRuleCapability>,
        messaging: Arc::clone(&host) as Arc<dyn MessagingCapability>,
    };
    let engine = PunishmentEngine::start(Arc::clone(&store) as Arc<dyn PersistentStore>, capabilities)
        .expect("engine starts");
    engine.set_economy(Some(Arc::clone(&host) as Arc<dyn EconomyCapability>));
    (store, host, Arc::new(engine))
}

#[test]
fn reload_midway_through_respawn_does_not_mix_catalogs() {
    let (store, host, engine) = start(catalog_document("old", "10", "slowness"));

    let weak: Weak<PunishmentEngine> = Arc::downgrade(&engine);
    let hook_store = Arc::clone(&store);
    *host.on_experience_read.lock().unwrap() = Some(Box::new(move || {
        hook_store.set(catalog_document("new", "20", "hunger"));
        let engine = weak.upgrade().expect("engine alive");
        engine.reload().expect("reload succeeds");
    }));

    let id = ParticipantId::new();
    assert!(engine.on_death(id, &DeathCause::Environment));
    let result = engine.on_respawn(id, RespawnContext::new(WorldId::new()));

    assert_eq!(result.money_lost, Some(dec!(10)));
    assert_eq!(result.applied_effects, vec!["slowness".to_owned()]);
    assert_eq!(result.message.as_deref(), Some("old: 10 slowness"));

    // The reload did happen and governs the next respawn.
    assert_eq!(engine.catalog().status_effects[0].id, "hunger");
    let next = ParticipantId::new();
    engine.on_death(next, &DeathCause::Environment);
    let result = engine.on_respawn(next, RespawnContext::new(WorldId::new()));
    assert_eq!(result.money_lost, Some(dec!(20)));
    assert_eq!(result.message.as_deref(), Some("new: 20 hunger"));
}

#[test]
fn concurrent_reloads_always_yield_consistent_results() {
    let (store, _host, engine) = start(catalog_document("a", "10", "slowness"));

    let reloader = {
        let store = Arc::clone(&store);
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for round in 0..200 {
                let doc = if round % 2 == 0 {
                    catalog_document("b", "20", "hunger")
                } else {
                    catalog_document("a", "10", "slowness")
                };
                store.set(doc);
                engine.reload().expect("reload succeeds");
            }
        })
    };

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut results = Vec::new();
                for _ in 0..25 {
                    let id = ParticipantId::new();
                    engine.on_death(id, &DeathCause::Environment);
                    results.push(engine.on_respawn(id, RespawnContext::new(WorldId::new())));
                }
                results
            })
        })
        .collect();

    reloader.join().unwrap();
    for worker in workers {
        for result in worker.join().unwrap() {
            let message = result.message.unwrap();
            match result.money_lost {
                Some(lost) if lost == dec!(10) => {
                    assert_eq!(result.applied_effects, vec!["slowness".to_owned()]);
                    assert_eq!(message, "a: 10 slowness");
                }
                Some(lost) if lost == dec!(20) => {
                    assert_eq!(result.applied_effects, vec!["hunger".to_owned()]);
                    assert_eq!(message, "b: 20 hunger");
                }
                other => panic!("unexpected money loss {other:?}"),
            }
        }
    }
    assert!(engine.registry().is_empty());
}
