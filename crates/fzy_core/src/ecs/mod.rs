//! # Entity Component System
//!
//! Signature-driven ECS built on preallocated buffers.
//!
//! ## Design Principles
//!
//! 1. **Dense storage** - Component bytes stay contiguous per type
//! 2. **Capacity up front** - Every buffer is sized at registration, never grown
//! 3. **Eager membership** - Process entity lists are updated on every signature change
//!
//! ## Example
//!
//! ```rust
//! use fzy_core::{EcsConfig, Entity, Process, Signature, World};
//!
//! let mut world = World::new(EcsConfig::with_max_entities(64))?;
//! let velocity = world.component_register_type::<[f32; 2]>("velocity")?;
//!
//! let gravity = Process::new(Signature::EMPTY.with(velocity)).with_update(
//!     move |world: &mut World, entities: &[Entity], delta: f32| {
//!         for &entity in entities {
//!             if let Ok(v) = world.component_mut::<[f32; 2]>(entity, velocity) {
//!                 v[1] -= 9.8 * delta;
//!             }
//!         }
//!     },
//! );
//! world.process_register("gravity", gravity)?;
//!
//! let entity = world.entity_create()?;
//! world.component_insert(entity, velocity, [1.0f32, 0.0])?;
//! world.run_processes(0.5)?;
//! assert_eq!(world.component::<[f32; 2]>(entity, velocity)?, &[1.0, -4.9]);
//! # Ok::<(), fzy_core::EcsError>(())
//! ```

mod entity;
mod process;
mod registry;
mod signature;
mod storage;
mod world;

pub use entity::Entity;
pub use process::{Process, ProcessTypeId, Update};
pub use signature::{ComponentTypeId, Signature};
pub use storage::ComponentStorage;
pub use world::World;
