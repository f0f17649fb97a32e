//! # Membership Consistency Tests
//!
//! Drives a world with a seeded random workload and, after every mutation,
//! checks process lists, signatures and storages against a brute-force
//! recomputation from a shadow model.

use std::collections::{BTreeMap, BTreeSet};

use fzy_core::{ComponentTypeId, EcsConfig, Entity, Process, ProcessTypeId, Signature, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MAX_ENTITIES: usize = 48;
const COMPONENTS: usize = 5;

/// Shadow state the world is checked against.
#[derive(Default)]
struct Model {
    /// Live entity -> attached components.
    live: BTreeMap<Entity, BTreeSet<ComponentTypeId>>,
}

struct Harness {
    world: World,
    model: Model,
    components: Vec<ComponentTypeId>,
    processes: Vec<(ProcessTypeId, Signature)>,
}

impl Harness {
    fn new(rng: &mut ChaCha8Rng) -> Self {
        let mut world = World::new(EcsConfig::with_max_entities(MAX_ENTITIES)).unwrap();
        let components: Vec<_> = (0..COMPONENTS)
            .map(|i| world.component_register(&format!("c{i}"), 1 + i * 3).unwrap())
            .collect();

        // Random requirement masks, plus the empty mask that matches everything
        let mut processes = Vec::new();
        for i in 0..6 {
            let signature: Signature = if i == 0 {
                Signature::EMPTY
            } else {
                components.iter().copied().filter(|_| rng.gen_bool(0.4)).collect()
            };
            let id = world.process_register(&format!("p{i}"), Process::new(signature)).unwrap();
            processes.push((id, signature));
        }

        Self { world, model: Model::default(), components, processes }
    }

    fn random_live(&self, rng: &mut ChaCha8Rng) -> Option<Entity> {
        if self.model.live.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..self.model.live.len());
        self.model.live.keys().nth(pick).copied()
    }

    fn step(&mut self, rng: &mut ChaCha8Rng) {
        let component = self.components[rng.gen_range(0..self.components.len())];
        match rng.gen_range(0..10) {
            0..=2 => match self.world.entity_create() {
                Ok(entity) => {
                    assert!(self.model.live.insert(entity, BTreeSet::new()).is_none());
                }
                Err(_) => assert_eq!(self.model.live.len(), MAX_ENTITIES),
            },
            3 => {
                if let Some(entity) = self.random_live(rng) {
                    self.world.entity_destroy(entity).unwrap();
                    self.model.live.remove(&entity);
                    assert!(self.world.entity_destroy(entity).is_err());
                }
            }
            4..=6 => {
                if let Some(entity) = self.random_live(rng) {
                    let held = self.model.live.get_mut(&entity).unwrap();
                    let result = self.world.component_add(entity, component).map(|slot| slot.fill(7));
                    assert_eq!(result.is_ok(), held.insert(component));
                }
            }
            _ => {
                if let Some(entity) = self.random_live(rng) {
                    let held = self.model.live.get_mut(&entity).unwrap();
                    let result = self.world.component_remove(entity, component);
                    assert_eq!(result.is_ok(), held.remove(&component));
                }
            }
        }
    }

    fn check(&self) {
        let world = &self.world;
        assert_eq!(world.living_count(), self.model.live.len());
        assert_eq!(
            world.entities().collect::<BTreeSet<_>>(),
            self.model.live.keys().copied().collect::<BTreeSet<_>>()
        );

        for (&entity, held) in &self.model.live {
            let signature = world.signature_of(entity).unwrap();
            assert_eq!(signature, held.iter().copied().collect::<Signature>());
            for &component in &self.components {
                assert_eq!(world.component_get(entity, component).is_some(), held.contains(&component));
            }
        }

        for &component in &self.components {
            let storage = world.storage(component).unwrap();
            let expected: BTreeSet<Entity> = self
                .model
                .live
                .iter()
                .filter(|(_, held)| held.contains(&component))
                .map(|(&entity, _)| entity)
                .collect();
            let stored: BTreeSet<Entity> = storage.entities().iter().copied().collect();
            assert_eq!(stored.len(), storage.len(), "duplicate entity in dense storage");
            assert_eq!(stored, expected);
            assert!(storage.as_bytes().iter().all(|&b| b == 7));
        }

        for &(id, required) in &self.processes {
            let process = world.process_get(id).unwrap();
            let expected: BTreeSet<Entity> = self
                .model
                .live
                .keys()
                .copied()
                .filter(|&entity| world.signature_of(entity).unwrap().contains(required))
                .collect();
            let listed: BTreeSet<Entity> = process.entities().iter().copied().collect();
            assert_eq!(listed.len(), process.len(), "duplicate entity in process list");
            assert_eq!(listed, expected, "process {id} out of sync");
        }
    }
}

/// Test: random churn never desynchronizes processes from signatures.
#[test]
fn test_random_workload_keeps_memberships_exact() {
    for seed in [1u64, 7, 42, 1337] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut harness = Harness::new(&mut rng);
        for _ in 0..2_000 {
            harness.step(&mut rng);
            harness.check();
        }
    }
}

/// Test: a process registered mid-run is seeded with the current matches.
#[test]
fn test_late_registration_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut harness = Harness::new(&mut rng);
    for _ in 0..500 {
        harness.step(&mut rng);
    }

    let required = Signature::EMPTY.with(harness.components[0]).with(harness.components[2]);
    let id = harness
        .world
        .process_register("late", Process::new(required))
        .unwrap();
    harness.processes.push((id, required));
    harness.check();

    for _ in 0..500 {
        harness.step(&mut rng);
        harness.check();
    }
}

/// Test: live ids are unique and recycled in FIFO order.
#[test]
fn test_ids_unique_and_recycled_fifo() {
    let mut world = World::new(EcsConfig::with_max_entities(MAX_ENTITIES)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let mut live: Vec<Entity> = (0..MAX_ENTITIES).map(|_| world.entity_create().unwrap()).collect();
    let unique: BTreeSet<u32> = live.iter().map(|entity| entity.index()).collect();
    assert_eq!(unique.len(), MAX_ENTITIES);

    // Free a random subset, then expect the ids back in release order
    let mut released = Vec::new();
    for _ in 0..MAX_ENTITIES / 2 {
        let entity = live.swap_remove(rng.gen_range(0..live.len()));
        world.entity_destroy(entity).unwrap();
        released.push(entity.index());
    }
    let recycled: Vec<u32> = released
        .iter()
        .map(|_| world.entity_create().unwrap().index())
        .collect();
    assert_eq!(recycled, released);
}
