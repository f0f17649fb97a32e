//! # ECS Performance Benchmark
//!
//! Measures the hot paths at full entity capacity:
//! - Entity create/destroy churn
//! - Component attach/detach with process membership updates
//! - Dense iteration through a process update
//!
//! Run with: `cargo bench --package fzy_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fzy_core::{EcsConfig, Entity, Process, Signature, World, MAX_ENTITIES};

type Position = [f32; 3];
type Velocity = [f32; 3];

/// Benchmark: Fill and drain every entity slot.
fn bench_entity_churn(c: &mut Criterion) {
    let mut world = World::new(EcsConfig::default()).unwrap();
    let mut entities = Vec::with_capacity(MAX_ENTITIES);

    c.bench_function("entity_create_destroy_12288", |b| {
        b.iter(|| {
            for _ in 0..MAX_ENTITIES {
                entities.push(world.entity_create().unwrap());
            }
            for entity in entities.drain(..) {
                world.entity_destroy(entity).unwrap();
            }
            black_box(world.living_count())
        });
    });
}

/// Benchmark: Attach and detach a component with N processes listening.
fn bench_component_add_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("component_add_remove");

    for process_count in [0usize, 8, 64] {
        let mut world = World::new(EcsConfig::default()).unwrap();
        let position = world.component_register_type::<Position>("position").unwrap();
        for i in 0..process_count {
            world
                .process_register(&format!("p{i}"), Process::new(Signature::EMPTY.with(position)))
                .unwrap();
        }
        let entities: Vec<Entity> = (0..1_024).map(|_| world.entity_create().unwrap()).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(process_count),
            &process_count,
            |b, _| {
                b.iter(|| {
                    for &entity in &entities {
                        world.component_add(entity, position).unwrap();
                    }
                    for &entity in &entities {
                        world.component_remove(entity, position).unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: One frame of a movement process over every entity.
fn bench_movement_update(c: &mut Criterion) {
    let mut world = World::new(EcsConfig::default()).unwrap();
    let position = world.component_register_type::<Position>("position").unwrap();
    let velocity = world.component_register_type::<Velocity>("velocity").unwrap();

    let movement = Process::new(Signature::EMPTY.with(position).with(velocity)).with_update(
        move |world: &mut World, entities: &[Entity], delta: f32| {
            for &entity in entities {
                let v = *world.component::<Velocity>(entity, velocity).unwrap();
                let p = world.component_mut::<Position>(entity, position).unwrap();
                for axis in 0..3 {
                    p[axis] += v[axis] * delta;
                }
            }
        },
    );
    world.process_register("movement", movement).unwrap();

    for i in 0..MAX_ENTITIES {
        let entity = world.entity_create().unwrap();
        world.component_insert(entity, position, [0.0f32; 3]).unwrap();
        #[allow(clippy::cast_precision_loss)]
        world.component_insert(entity, velocity, [i as f32, 0.0, 1.0]).unwrap();
    }

    c.bench_function("movement_update_12288", |b| {
        b.iter(|| world.run_processes(black_box(0.016)).unwrap());
    });
}

/// Benchmark: Same movement through the dense typed slices.
fn bench_dense_slices(c: &mut Criterion) {
    let mut world = World::new(EcsConfig::default()).unwrap();
    let position = world.component_register_type::<Position>("position").unwrap();
    for _ in 0..MAX_ENTITIES {
        let entity = world.entity_create().unwrap();
        world.component_insert(entity, position, [1.0f32, 2.0, 3.0]).unwrap();
    }

    c.bench_function("dense_slice_sum_12288", |b| {
        b.iter(|| {
            let positions = world.storage(position).unwrap().as_slice::<Position>().unwrap();
            black_box(positions.iter().map(|p| p[0] + p[1] + p[2]).sum::<f32>())
        });
    });
}

criterion_group!(
    benches,
    bench_entity_churn,
    bench_component_add_remove,
    bench_movement_update,
    bench_dense_slices,
);

criterion_main!(benches);
