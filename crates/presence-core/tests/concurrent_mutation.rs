//! Store mutations racing a tick: the tick's read and write form one
//! commit, so a mutation issued while it computes is either rejected
//! (same thread) or applied after the tick's commit (other threads).

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use presence_core::clock::SessionClock;
use presence_core::tick::{UnknownStatePolicy, run_tick};
use presence_propagation::{PropagationConfig, PropagationEngine, SpaceEffect};
use presence_store::{StateStore, StoreError};
use presence_types::{FlowSpace, Member, MemberState, SpaceId};

fn seeded_store() -> StateStore {
    let store = StateStore::new();
    store
        .upsert_space(FlowSpace::new("hall", "Hall").with_members(vec![
            Member::new("a", MemberState::Active),
            Member::new("b", MemberState::Calm),
        ]))
        .unwrap();
    store
}

/// Removes `hall` from another thread while the tick is computing.
struct RemoveFromOtherThread {
    store: StateStore,
    remover: Mutex<Option<JoinHandle<Result<bool, StoreError>>>>,
}

impl SpaceEffect for RemoveFromOtherThread {
    fn space_effect(&self, _room: &FlowSpace) -> f64 {
        let mut remover = self.remover.lock().unwrap();
        if remover.is_none() {
            let store = self.store.clone();
            *remover = Some(std::thread::spawn(move || {
                store.remove_space(&SpaceId::new("hall"))
            }));
            // Give the remover time to reach the store.
            std::thread::sleep(Duration::from_millis(20));
        }
        1.0
    }
}

/// Tries to remove `hall` from the ticking thread itself.
struct RemoveFromSameThread {
    store: StateStore,
    outcome: Mutex<Option<Result<bool, StoreError>>>,
}

impl SpaceEffect for RemoveFromSameThread {
    fn space_effect(&self, _room: &FlowSpace) -> f64 {
        let mut outcome = self.outcome.lock().unwrap();
        if outcome.is_none() {
            *outcome = Some(self.store.remove_space(&SpaceId::new("hall")));
        }
        1.0
    }
}

#[test]
fn removal_from_another_thread_lands_after_the_tick() {
    let store = seeded_store();
    let engine = PropagationEngine::new(
        PropagationConfig::default(),
        RemoveFromOtherThread {
            store: store.clone(),
            remover: Mutex::new(None),
        },
    );
    let mut clock = SessionClock::new(0.1).unwrap();

    let summary = run_tick(&mut clock, &store, &engine, UnknownStatePolicy::Skip).unwrap();
    let remover = engine.strategy().remover.lock().unwrap().take().unwrap();
    let removed = remover.join().unwrap();

    assert_eq!(summary.version, 2);
    assert_eq!(removed, Ok(true));
    assert!(store.snapshot().space(&SpaceId::new("hall")).is_none());
    assert_eq!(store.version(), 3);
}

#[test]
fn removal_from_the_ticking_thread_is_rejected() {
    let store = seeded_store();
    let engine = PropagationEngine::new(
        PropagationConfig::default(),
        RemoveFromSameThread {
            store: store.clone(),
            outcome: Mutex::new(None),
        },
    );
    let mut clock = SessionClock::new(0.1).unwrap();

    let summary = run_tick(&mut clock, &store, &engine, UnknownStatePolicy::Skip).unwrap();
    let outcome = engine.strategy().outcome.lock().unwrap().take().unwrap();

    assert_eq!(outcome, Err(StoreError::ReentrantUpdate));
    assert_eq!(summary.version, 2);
    let state = store.snapshot();
    let hall = state.space(&SpaceId::new("hall")).unwrap();
    assert!(hall.members.iter().all(|m| m.depth > 0.0));
}

#[test]
fn energy_level_fold_keeps_concurrent_energy_fields() {
    let store = seeded_store();
    let mut energy = store.snapshot().energy;
    energy.quality = 0.9;
    store.update_energy(energy).unwrap();

    store.set_energy_level(0.3).unwrap();

    let root = store.snapshot().energy;
    assert!((root.level - 0.3).abs() < 1e-9);
    assert!((root.quality - 0.9).abs() < 1e-9);
}
