//! # ECS World
//!
//! The context object owning all ECS state: entity slots, component
//! storages, processes and the name registries. Any number of worlds may
//! coexist; nothing is global.
//!
//! Every buffer is sized from the [`EcsConfig`] when the world is
//! initialized or a type is registered. Entity churn and component
//! attach/detach never allocate.

use bytemuck::Pod;

use super::entity::{Entity, EntitySlot};
use super::process::{Process, ProcessTypeId};
use super::registry::TypeRegistry;
use super::signature::{ComponentTypeId, Signature};
use super::storage::ComponentStorage;
use crate::collections::RecyclingQueue;
use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult, Resource};
use crate::memory::{MemoryStats, MemoryTag};

/// A registered process plus the registration it belongs to.
#[derive(Debug)]
struct ProcessEntry {
    process: Process,
    /// Distinguishes re-registrations that land on the same id.
    serial: u64,
}

/// Everything that exists only between `initialize` and `shutdown`.
#[derive(Debug)]
struct WorldState {
    slots: Box<[EntitySlot]>,
    free_entities: RecyclingQueue<u32>,
    living: usize,

    component_names: TypeRegistry,
    storages: Box<[Option<ComponentStorage>]>,

    process_names: TypeRegistry,
    processes: Box<[Option<ProcessEntry>]>,
    /// Registration order, which is also update order.
    run_order: Vec<ProcessTypeId>,

    /// Reused buffer for update snapshots.
    scratch: Vec<Entity>,
}

impl WorldState {
    fn new(config: &EcsConfig) -> EcsResult<Self> {
        #[allow(clippy::cast_possible_truncation)]
        let free_entities = RecyclingQueue::preloaded(0..config.max_entities as u32);

        Ok(Self {
            slots: vec![EntitySlot::default(); config.max_entities].into_boxed_slice(),
            free_entities,
            living: 0,
            component_names: TypeRegistry::new(
                Resource::ComponentType,
                config.max_components,
                config.name_table_buckets,
            )?,
            storages: (0..config.max_components).map(|_| None).collect(),
            process_names: TypeRegistry::new(
                Resource::Process,
                config.max_processes,
                config.name_table_buckets,
            )?,
            processes: (0..config.max_processes).map(|_| None).collect(),
            run_order: Vec::with_capacity(config.max_processes),
            scratch: Vec::with_capacity(config.max_entities),
        })
    }

    /// Fixed buffers allocated on initialize, by tag.
    fn base_allocations(&self) -> [(usize, MemoryTag); 4] {
        use std::mem::size_of;

        [
            (
                self.slots.len() * size_of::<EntitySlot>()
                    + self.free_entities.capacity() * size_of::<u32>(),
                MemoryTag::Entity,
            ),
            (
                self.component_names.allocated_bytes() + self.process_names.allocated_bytes(),
                MemoryTag::Hashtable,
            ),
            (self.storages.len() * size_of::<Option<ComponentStorage>>(), MemoryTag::Component),
            (
                self.processes.len() * size_of::<Option<ProcessEntry>>()
                    + self.run_order.capacity() * size_of::<ProcessTypeId>(),
                MemoryTag::Process,
            ),
        ]
    }

    /// Validates `entity` and returns its slot index.
    fn live_index(&self, entity: Entity) -> EcsResult<usize> {
        let index = entity.index() as usize;
        let slot = self.slots.get(index).ok_or(EcsError::EntityOutOfRange {
            entity,
            max: self.slots.len(),
        })?;
        if !slot.is_current(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        Ok(index)
    }

    fn storage(&self, id: ComponentTypeId) -> EcsResult<&ComponentStorage> {
        self.storages
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(EcsError::UnknownComponentType(id))
    }

    fn storage_mut(&mut self, id: ComponentTypeId) -> EcsResult<&mut ComponentStorage> {
        self.storages
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(EcsError::UnknownComponentType(id))
    }

    fn process_entry(&self, id: ProcessTypeId) -> Option<&ProcessEntry> {
        self.processes.get(id.index()).and_then(Option::as_ref)
    }

    fn process_entry_mut(&mut self, id: ProcessTypeId) -> Option<&mut ProcessEntry> {
        self.processes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Re-evaluates `entity` against every registered process.
    fn notify(&mut self, entity: Entity, signature: Signature) {
        for entry in self.processes.iter_mut().flatten() {
            entry.process.sync(entity, signature);
        }
    }
}

/// The ECS World - container for all entities, components and processes.
///
/// # Lifecycle
///
/// [`World::new`] returns an initialized world. [`World::shutdown`] frees
/// everything and [`World::initialize`] brings it back as if fresh. While
/// shut down, operations fail with [`EcsError::NotInitialized`] and
/// observers report nothing.
///
/// # Example
///
/// ```rust
/// use fzy_core::{EcsConfig, World};
///
/// let mut world = World::new(EcsConfig::with_max_entities(2))?;
/// let a = world.entity_create()?;
/// let _b = world.entity_create()?;
/// assert!(world.entity_create().is_err());
///
/// world.entity_destroy(a)?;
/// let c = world.entity_create()?;
/// assert_eq!(c.index(), a.index());
/// assert!(!world.is_alive(a));
/// # Ok::<(), fzy_core::EcsError>(())
/// ```
#[derive(Debug)]
pub struct World {
    config: EcsConfig,
    state: Option<WorldState>,
    stats: MemoryStats,
    /// Monotonic across lifecycles, so a stale update is never reinstalled.
    next_serial: u64,
}

impl World {
    /// Creates and initializes a world with the given limits.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: EcsConfig) -> EcsResult<Self> {
        config.validate()?;
        let mut world = Self { config, state: None, stats: MemoryStats::new(), next_serial: 0 };
        world.initialize()?;
        Ok(world)
    }

    /// Allocates all entity, registry and process tables.
    ///
    /// Every entity id starts free with an empty signature.
    ///
    /// # Errors
    ///
    /// [`EcsError::AlreadyInitialized`] if the world is live.
    pub fn initialize(&mut self) -> EcsResult<()> {
        if self.state.is_some() {
            return Err(EcsError::AlreadyInitialized);
        }

        let state = WorldState::new(&self.config)?;
        for (bytes, tag) in state.base_allocations() {
            self.stats.allocate(bytes, tag);
        }
        self.state = Some(state);

        tracing::debug!(
            max_entities = self.config.max_entities,
            max_components = self.config.max_components,
            max_processes = self.config.max_processes,
            "ecs initialized"
        );
        Ok(())
    }

    /// Frees every storage, process and registry.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotInitialized`] if the world is already shut down.
    pub fn shutdown(&mut self) -> EcsResult<()> {
        let state = self.state.take().ok_or(EcsError::NotInitialized)?;

        for storage in state.storages.iter().flatten() {
            self.stats.release(storage.allocated_bytes(), MemoryTag::Component);
        }
        for entry in state.processes.iter().flatten() {
            self.stats.release(entry.process.allocated_bytes(), MemoryTag::Process);
        }
        for (bytes, tag) in state.base_allocations() {
            self.stats.release(bytes, tag);
        }

        tracing::debug!(living = state.living, "ecs shut down");
        Ok(())
    }

    /// Checks if the world is between `initialize` and `shutdown`.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// The limits this world was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// Tagged byte counts of the world's buffers.
    #[inline]
    #[must_use]
    pub const fn memory_stats(&self) -> &MemoryStats {
        &self.stats
    }

    fn live(&self) -> EcsResult<&WorldState> {
        self.state.as_ref().ok_or(EcsError::NotInitialized)
    }

    fn live_mut(&mut self) -> EcsResult<&mut WorldState> {
        self.state.as_mut().ok_or(EcsError::NotInitialized)
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with an empty signature.
    ///
    /// Ids are handed out in FIFO order of release, so a destroyed id comes
    /// back only after every id freed before it.
    ///
    /// # Errors
    ///
    /// [`EcsError::Exhausted`] when all `max_entities` ids are live.
    pub fn entity_create(&mut self) -> EcsResult<Entity> {
        let state = self.live_mut()?;
        let index = state.free_entities.pop().map_err(|_| EcsError::Exhausted {
            resource: Resource::Entity,
            capacity: state.slots.len(),
        })?;

        let slot = &mut state.slots[index as usize];
        slot.alive = true;
        slot.signature = Signature::EMPTY;
        let entity = slot.handle(index);
        state.living += 1;

        // Processes with an empty requirement match every entity.
        state.notify(entity, Signature::EMPTY);

        tracing::trace!(%entity, "entity created");
        Ok(entity)
    }

    /// Destroys `entity`, detaching all of its components and process memberships.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`] for an index beyond capacity
    /// - [`EcsError::DeadEntity`] for a free id or stale handle; the free pool is untouched
    pub fn entity_destroy(&mut self, entity: Entity) -> EcsResult<()> {
        let state = self.live_mut()?;
        let index = state.live_index(entity)?;

        let signature = state.slots[index].signature;
        for component in signature.iter() {
            state.storage_mut(component)?.remove(entity)?;
        }
        for entry in state.processes.iter_mut().flatten() {
            entry.process.remove(entity);
        }

        let slot = &mut state.slots[index];
        slot.signature = Signature::EMPTY;
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        state.living -= 1;

        // The id becomes free only once nothing refers to it.
        #[allow(clippy::cast_possible_truncation)]
        state.free_entities.push(index as u32)?;

        tracing::trace!(%entity, "entity destroyed");
        Ok(())
    }

    /// Checks if `entity` is live and its handle current.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.state.as_ref().is_some_and(|state| state.live_index(entity).is_ok())
    }

    /// Signature of a live entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityOutOfRange`] or [`EcsError::DeadEntity`] for an invalid handle.
    pub fn signature_of(&self, entity: Entity) -> EcsResult<Signature> {
        let state = self.live()?;
        let index = state.live_index(entity)?;
        Ok(state.slots[index].signature)
    }

    /// Number of live entities.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.living)
    }

    /// Iterates live entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.state.iter().flat_map(|state| {
            state
                .slots
                .iter()
                .zip(0u32..)
                .filter(|(slot, _)| slot.alive)
                .map(|(slot, index)| slot.handle(index))
        })
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Registers a component type of `element_size` bytes per element.
    ///
    /// Preallocates zeroed storage for `max_entities` elements.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ZeroElementSize`] if `element_size` is zero
    /// - [`EcsError::ElementTooLarge`] if the storage would not fit in memory
    /// - [`EcsError::DuplicateName`] if `name` is taken
    /// - [`EcsError::Exhausted`] when all component type ids are in use
    ///
    /// Nothing is registered on error.
    pub fn component_register(&mut self, name: &str, element_size: usize) -> EcsResult<ComponentTypeId> {
        let capacity = self.config.max_entities;
        let state = self.state.as_mut().ok_or(EcsError::NotInitialized)?;
        // Size checks come first so a rejected size never binds the name.
        ComponentStorage::word_count(element_size, capacity)?;
        let id = ComponentTypeId(state.component_names.register(name)?);
        let storage = ComponentStorage::new(id, element_size, capacity)?;

        self.stats.allocate(storage.allocated_bytes(), MemoryTag::Component);
        state.storages[id.index()] = Some(storage);

        tracing::debug!(name, %id, element_size, "component type registered");
        Ok(id)
    }

    /// Registers a component type sized for `T`.
    ///
    /// # Errors
    ///
    /// Same as [`World::component_register`].
    pub fn component_register_type<T: Pod>(&mut self, name: &str) -> EcsResult<ComponentTypeId> {
        self.component_register(name, std::mem::size_of::<T>())
    }

    /// Unregisters a component type, detaching it from every holder.
    ///
    /// Holders lose the component's signature bit and process memberships
    /// are re-evaluated. The id returns to the free pool.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NameNotFound`] if `name` is not registered
    /// - [`EcsError::TypeIdMismatch`] if `name` is bound to another id
    pub fn component_unregister(&mut self, name: &str, id: ComponentTypeId) -> EcsResult<()> {
        let state = self.state.as_mut().ok_or(EcsError::NotInitialized)?;
        state.component_names.unregister(name, id.get())?;

        let Some(storage) = state.storages[id.index()].take() else {
            return Ok(());
        };
        for &entity in storage.entities() {
            let slot = &mut state.slots[entity.index() as usize];
            slot.signature.remove(id);
            let signature = slot.signature;
            state.notify(entity, signature);
        }
        self.stats.release(storage.allocated_bytes(), MemoryTag::Component);

        tracing::debug!(name, %id, holders = storage.len(), "component type unregistered");
        Ok(())
    }

    /// Attaches component `id` to `entity` and returns its zeroed slot.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`] or [`EcsError::DeadEntity`] for an invalid handle
    /// - [`EcsError::UnknownComponentType`] if `id` is not registered
    /// - [`EcsError::DuplicateComponent`] if `entity` already has the component
    pub fn component_add(&mut self, entity: Entity, id: ComponentTypeId) -> EcsResult<&mut [u8]> {
        let state = self.live_mut()?;
        let index = state.live_index(entity)?;
        state.storage_mut(id)?.add(entity)?;

        let slot = &mut state.slots[index];
        slot.signature.set(id);
        let signature = slot.signature;
        state.notify(entity, signature);

        tracing::trace!(%entity, component = %id, "component added");
        state
            .storage_mut(id)?
            .get_mut(entity)
            .ok_or(EcsError::MissingComponent { entity, component: id })
    }

    /// Attaches component `id` to `entity` initialized to `value`.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` does not match the registered
    /// element size, plus everything [`World::component_add`] reports. Nothing
    /// is attached on error.
    pub fn component_insert<T: Pod>(&mut self, entity: Entity, id: ComponentTypeId, value: T) -> EcsResult<()> {
        self.live()?.storage(id)?.check_layout::<T>()?;
        self.component_add(entity, id)?.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    /// Detaches component `id` from `entity`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`] or [`EcsError::DeadEntity`] for an invalid handle
    /// - [`EcsError::UnknownComponentType`] if `id` is not registered
    /// - [`EcsError::MissingComponent`] if `entity` does not have the component
    pub fn component_remove(&mut self, entity: Entity, id: ComponentTypeId) -> EcsResult<()> {
        let state = self.live_mut()?;
        let index = state.live_index(entity)?;
        state.storage_mut(id)?.remove(entity)?;

        let slot = &mut state.slots[index];
        slot.signature.remove(id);
        let signature = slot.signature;
        state.notify(entity, signature);

        tracing::trace!(%entity, component = %id, "component removed");
        Ok(())
    }

    /// Bytes of `entity`'s component `id`.
    ///
    /// `None` for an invalid handle, an unregistered type, or an entity
    /// without the component.
    #[must_use]
    pub fn component_get(&self, entity: Entity, id: ComponentTypeId) -> Option<&[u8]> {
        let state = self.state.as_ref()?;
        state.live_index(entity).ok()?;
        state.storage(id).ok()?.get(entity)
    }

    /// Mutable bytes of `entity`'s component `id`.
    ///
    /// `None` under the same conditions as [`World::component_get`].
    pub fn component_get_mut(&mut self, entity: Entity, id: ComponentTypeId) -> Option<&mut [u8]> {
        let state = self.state.as_mut()?;
        state.live_index(entity).ok()?;
        state.storage_mut(id).ok()?.get_mut(entity)
    }

    /// `entity`'s component `id` viewed as `T`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`] or [`EcsError::DeadEntity`] for an invalid handle
    /// - [`EcsError::UnknownComponentType`] if `id` is not registered
    /// - [`EcsError::LayoutMismatch`] if `T` does not match the element layout
    /// - [`EcsError::MissingComponent`] if `entity` does not have the component
    pub fn component<T: Pod>(&self, entity: Entity, id: ComponentTypeId) -> EcsResult<&T> {
        let state = self.live()?;
        state.live_index(entity)?;
        state.storage(id)?.get_as(entity)
    }

    /// `entity`'s component `id` viewed as a mutable `T`.
    ///
    /// # Errors
    ///
    /// Same as [`World::component`].
    pub fn component_mut<T: Pod>(&mut self, entity: Entity, id: ComponentTypeId) -> EcsResult<&mut T> {
        let state = self.live_mut()?;
        state.live_index(entity)?;
        state.storage_mut(id)?.get_as_mut(entity)
    }

    /// Id registered under `name`.
    #[must_use]
    pub fn component_type(&self, name: &str) -> Option<ComponentTypeId> {
        let state = self.state.as_ref()?;
        state.component_names.lookup(name).map(ComponentTypeId)
    }

    /// Storage of component type `id`.
    #[must_use]
    pub fn storage(&self, id: ComponentTypeId) -> Option<&ComponentStorage> {
        self.state.as_ref()?.storage(id).ok()
    }

    /// Number of registered component types.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.component_names.len())
    }

    // =========================================================================
    // Processes
    // =========================================================================

    /// Registers `process` under `name`.
    ///
    /// The process's list is rebuilt from the live entities that already
    /// match its signature. Processes update in registration order.
    ///
    /// # Errors
    ///
    /// - [`EcsError::DuplicateName`] if `name` is taken
    /// - [`EcsError::Exhausted`] when all process ids are in use
    pub fn process_register(&mut self, name: &str, mut process: Process) -> EcsResult<ProcessTypeId> {
        let capacity = self.config.max_entities;
        let state = self.state.as_mut().ok_or(EcsError::NotInitialized)?;
        let id = ProcessTypeId(state.process_names.register(name)?);

        process.attach(capacity);
        let required = process.signature();
        for (slot, index) in state.slots.iter().zip(0u32..) {
            if slot.alive && slot.signature.contains(required) {
                process.insert(slot.handle(index));
            }
        }

        self.stats.allocate(process.allocated_bytes(), MemoryTag::Process);
        self.next_serial += 1;
        tracing::debug!(name, %id, matching = process.len(), "process registered");

        state.processes[id.index()] = Some(ProcessEntry { process, serial: self.next_serial });
        state.run_order.push(id);
        Ok(id)
    }

    /// Unregisters the process `name`, dropping it and recycling its id.
    ///
    /// # Errors
    ///
    /// - [`EcsError::NameNotFound`] if `name` is not registered
    /// - [`EcsError::TypeIdMismatch`] if `name` is bound to another id
    pub fn process_unregister(&mut self, name: &str, id: ProcessTypeId) -> EcsResult<()> {
        let state = self.state.as_mut().ok_or(EcsError::NotInitialized)?;
        state.process_names.unregister(name, id.get())?;
        state.run_order.retain(|&registered| registered != id);

        if let Some(entry) = state.processes[id.index()].take() {
            self.stats.release(entry.process.allocated_bytes(), MemoryTag::Process);
            entry.process.destroy();
        }

        tracing::debug!(name, %id, "process unregistered");
        Ok(())
    }

    /// Process registered under `id`.
    #[must_use]
    pub fn process_get(&self, id: ProcessTypeId) -> Option<&Process> {
        self.state.as_ref()?.process_entry(id).map(|entry| &entry.process)
    }

    /// Mutable process registered under `id`, for swapping its update.
    pub fn process_get_mut(&mut self, id: ProcessTypeId) -> Option<&mut Process> {
        self.state.as_mut()?.process_entry_mut(id).map(|entry| &mut entry.process)
    }

    /// Process registered under `name`.
    #[must_use]
    pub fn process_get_by_name(&self, name: &str) -> Option<&Process> {
        self.process_get(self.process_type(name)?)
    }

    /// Id registered under `name`.
    #[must_use]
    pub fn process_type(&self, name: &str) -> Option<ProcessTypeId> {
        let state = self.state.as_ref()?;
        state.process_names.lookup(name).map(ProcessTypeId)
    }

    /// Number of registered processes.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.process_names.len())
    }

    /// Runs the update of process `id` once. A process without one is a no-op.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownProcess`] if `id` is not registered.
    pub fn process_update(&mut self, id: ProcessTypeId, delta: f32) -> EcsResult<()> {
        let serial = self
            .live()?
            .process_entry(id)
            .ok_or(EcsError::UnknownProcess(id))?
            .serial;
        self.run_update(id, serial, delta);
        Ok(())
    }

    /// Runs every process update once, in registration order.
    ///
    /// Processes registered by an update during this pass wait for the next
    /// one; processes unregistered during it are skipped.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotInitialized`] if the world is shut down.
    pub fn run_processes(&mut self, delta: f32) -> EcsResult<()> {
        let state = self.live()?;
        let order: Vec<(ProcessTypeId, u64)> = state
            .run_order
            .iter()
            .filter_map(|&id| state.process_entry(id).map(|entry| (id, entry.serial)))
            .collect();

        for (id, serial) in order {
            self.run_update(id, serial, delta);
        }
        Ok(())
    }

    /// Runs one update against a snapshot of the process's list.
    ///
    /// The update object is taken out for the call and reinstalled only if
    /// the same registration is still present and no new update was set.
    fn run_update(&mut self, id: ProcessTypeId, serial: u64, delta: f32) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let Some(entry) = state.processes.get_mut(id.index()).and_then(Option::as_mut) else {
            return;
        };
        if entry.serial != serial {
            return;
        }
        let Some(mut update) = entry.process.update.take() else {
            return;
        };

        let mut entities = std::mem::take(&mut state.scratch);
        entities.clear();
        entities.extend_from_slice(entry.process.entities());

        update.update(self, &entities, delta);
        tracing::trace!(process = %id, entities = entities.len(), "process updated");

        if let Some(state) = self.state.as_mut() {
            if let Some(entry) = state.process_entry_mut(id) {
                if entry.serial == serial && entry.process.update.is_none() {
                    entry.process.update = Some(update);
                }
            }
            state.scratch = entities;
        }
    }
}
