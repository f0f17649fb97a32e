//! # Processes
//!
//! A process is a system: a required signature plus the list of live
//! entities whose signature contains it. The world keeps the list current
//! on every signature change; the optional [`Update`] runs over it.

use std::fmt;

use super::entity::Entity;
use super::signature::Signature;
use super::world::World;

/// Position-map value for "not listed".
const UNLISTED: u32 = u32::MAX;

/// Id of a registered process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProcessTypeId(pub(crate) u8);

impl ProcessTypeId {
    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the id as an index into per-process tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProcessTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-frame behavior of a process.
///
/// `entities` is a snapshot of the process's list taken before the call, so
/// the update may freely create, destroy and re-shape entities through
/// `world`. Changes show up in the next snapshot.
pub trait Update: Send {
    /// Runs one step over the matching entities.
    fn update(&mut self, world: &mut World, entities: &[Entity], delta: f32);
}

impl<F> Update for F
where
    F: FnMut(&mut World, &[Entity], f32) + Send,
{
    #[inline]
    fn update(&mut self, world: &mut World, entities: &[Entity], delta: f32) {
        self(world, entities, delta);
    }
}

/// A system and its matching entities.
///
/// # Example
///
/// ```rust
/// use fzy_core::{EcsConfig, Process, Signature, World};
///
/// let mut world = World::new(EcsConfig::with_max_entities(8))?;
/// let tag = world.component_register("tag", 1)?;
/// let tagged = world.process_register("tagged", Process::new(Signature::EMPTY.with(tag)))?;
///
/// let entity = world.entity_create()?;
/// assert!(!world.process_get(tagged).is_some_and(|p| p.contains(entity)));
/// world.component_add(entity, tag)?;
/// assert_eq!(world.process_get(tagged).map(|p| p.entities().to_vec()), Some(vec![entity]));
/// # Ok::<(), fzy_core::EcsError>(())
/// ```
pub struct Process {
    signature: Signature,
    /// Matching entities. Order is not stable across removals.
    entities: Vec<Entity>,
    /// Entity index -> position in `entities`. Sized on registration.
    positions: Vec<u32>,
    pub(crate) update: Option<Box<dyn Update>>,
}

impl Process {
    /// Creates an unregistered process requiring `signature`.
    #[must_use]
    pub fn new(signature: Signature) -> Self {
        Self { signature, entities: Vec::new(), positions: Vec::new(), update: None }
    }

    /// Builder form of [`Process::set_update`].
    #[must_use]
    pub fn with_update<U: Update + 'static>(mut self, update: U) -> Self {
        self.set_update(update);
        self
    }

    /// Installs the per-frame update, replacing any previous one.
    pub fn set_update<U: Update + 'static>(&mut self, update: U) {
        self.update = Some(Box::new(update));
    }

    /// Removes the per-frame update.
    pub fn clear_update(&mut self) {
        self.update = None;
    }

    /// Checks if an update is installed.
    #[inline]
    #[must_use]
    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    /// Required signature.
    #[inline]
    #[must_use]
    pub const fn signature(&self) -> Signature {
        self.signature
    }

    /// Matching live entities.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of matching entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks if no entity matches.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Checks if `entity` is in the list.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        match self.positions.get(entity.index() as usize) {
            Some(&position) if position != UNLISTED => self.entities[position as usize] == entity,
            _ => false,
        }
    }

    /// Consumes the process, dropping its list and update.
    pub fn destroy(self) {
        drop(self);
    }

    /// Sizes the position map for `capacity` entities and empties the list.
    pub(crate) fn attach(&mut self, capacity: usize) {
        self.entities.clear();
        self.entities.reserve(capacity);
        self.positions.clear();
        self.positions.resize(capacity, UNLISTED);
    }

    /// Bytes held by the list and position map.
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.entities.capacity() * std::mem::size_of::<Entity>()
            + self.positions.capacity() * std::mem::size_of::<u32>()
    }

    /// Adds or drops `entity` according to its new `signature`.
    pub(crate) fn sync(&mut self, entity: Entity, signature: Signature) {
        if signature.contains(self.signature) {
            self.insert(entity);
        } else {
            self.remove(entity);
        }
    }

    /// Lists `entity`; no-op if already listed.
    pub(crate) fn insert(&mut self, entity: Entity) {
        let index = entity.index() as usize;
        if self.positions[index] != UNLISTED {
            return;
        }
        #[allow(clippy::cast_possible_truncation)]
        {
            self.positions[index] = self.entities.len() as u32;
        }
        self.entities.push(entity);
    }

    /// Unlists `entity`; no-op if not listed.
    pub(crate) fn remove(&mut self, entity: Entity) {
        let index = entity.index() as usize;
        let position = self.positions[index];
        if position == UNLISTED {
            return;
        }

        self.entities.swap_remove(position as usize);
        if let Some(moved) = self.entities.get(position as usize) {
            self.positions[moved.index() as usize] = position;
        }
        self.positions[index] = UNLISTED;
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("signature", &self.signature)
            .field("entities", &self.entities.len())
            .field("has_update", &self.has_update())
            .finish_non_exhaustive()
    }
}
