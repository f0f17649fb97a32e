//! # FZY Core
//!
//! Entity Component System for the FZY engine:
//! - Entities are recycled numeric handles with generation counters
//! - Components live in dense, preallocated per-type byte storages
//! - Processes keep their matching entity lists in sync on every signature change
//!
//! ## Architecture Rules
//!
//! 1. **One owned world** - All ECS state lives in a [`World`], never in globals
//! 2. **Dense storage** - Swap-with-last removal keeps component arrays contiguous
//! 3. **Typed failures** - Exhaustion and misuse are [`EcsError`] values, never aborts
//!
//! ## Example
//!
//! ```rust
//! use fzy_core::{EcsConfig, Process, Signature, World};
//!
//! let mut world = World::new(EcsConfig::default())?;
//! let position = world.component_register("position", 12)?;
//! let mover = world.process_register("mover", Process::new(Signature::EMPTY.with(position)))?;
//!
//! let entity = world.entity_create()?;
//! world.component_add(entity, position)?;
//! assert!(world.process_get(mover).is_some_and(|p| p.contains(entity)));
//! # Ok::<(), fzy_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collections;
pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod sync;

pub use collections::{NameTable, RecyclingQueue};
pub use config::{EcsConfig, MAX_COMPONENTS, MAX_ENTITIES, MAX_PROCESSES};
pub use ecs::{
    ComponentStorage, ComponentTypeId, Entity, Process, ProcessTypeId, Signature, Update, World,
};
pub use error::{EcsError, EcsResult, ErrorKind, QueueError, Resource, TableError};
pub use memory::{MemoryStats, MemoryTag};
pub use sync::SharedWorld;
