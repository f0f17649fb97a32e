//! # Component Storage
//!
//! Preallocated, dense storage for one component type.
//!
//! The storage uses a packed array strategy:
//! - Element slots for every possible entity are allocated at creation
//! - A forward map (entity index -> dense index) gives O(1) lookup
//! - A backward map (dense index -> entity) lets removal move the last
//!   element into the hole, so occupied slots stay contiguous
//!
//! Dense indices are not stable across removals. Never cache them.

use bytemuck::Pod;

use super::entity::Entity;
use super::signature::ComponentTypeId;
use crate::error::{EcsError, EcsResult};

/// Forward-map value for "no component".
const UNMAPPED: u32 = u32::MAX;

/// Backing words are 16 bytes so typed views of any `Pod` type with
/// alignment up to 16 line up with element boundaries.
type Word = u128;
const WORD_SIZE: usize = std::mem::size_of::<Word>();

/// Largest buffer the allocator accepts (`isize::MAX` bytes).
const MAX_BUFFER_BYTES: usize = usize::MAX >> 1;

/// Dense byte storage for a single component type.
///
/// Elements are opaque `element_size`-byte records. Typed access goes
/// through [`bytemuck::Pod`] views whose size must equal `element_size`.
///
/// # Example
///
/// ```rust
/// use fzy_core::{EcsConfig, World};
///
/// let mut world = World::new(EcsConfig::with_max_entities(16))?;
/// let health = world.component_register_type::<u32>("health")?;
/// let entity = world.entity_create()?;
/// world.component_insert(entity, health, 100u32)?;
///
/// let storage = world.storage(health).expect("registered");
/// assert_eq!(storage.len(), 1);
/// assert_eq!(storage.as_slice::<u32>()?, &[100]);
/// # Ok::<(), fzy_core::EcsError>(())
/// ```
#[derive(Debug)]
pub struct ComponentStorage {
    /// Type id this storage serves.
    id: ComponentTypeId,
    /// Bytes per element.
    element_size: usize,
    /// Element bytes, `capacity * element_size` rounded up to whole words.
    words: Box<[Word]>,
    /// Entity index -> dense index, `UNMAPPED` if absent.
    forward: Box<[u32]>,
    /// Dense index -> owning entity. Only `..count` is meaningful.
    backward: Box<[Entity]>,
    /// Occupied slots.
    count: usize,
}

impl ComponentStorage {
    /// Backing words needed for `capacity` elements of `element_size` bytes.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ZeroElementSize`] if `element_size` is zero
    /// - [`EcsError::ElementTooLarge`] if the buffer size overflows or exceeds `isize::MAX` bytes
    pub fn word_count(element_size: usize, capacity: usize) -> EcsResult<usize> {
        if element_size == 0 {
            return Err(EcsError::ZeroElementSize);
        }

        capacity
            .checked_mul(element_size)
            .map(|bytes| bytes.div_ceil(WORD_SIZE))
            .filter(|words| words.checked_mul(WORD_SIZE).is_some_and(|b| b <= MAX_BUFFER_BYTES))
            .ok_or(EcsError::ElementTooLarge { element_size, capacity })
    }

    /// Creates a storage for `capacity` entities of `element_size` bytes each.
    ///
    /// All element bytes start zeroed.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentStorage::word_count`].
    pub fn new(id: ComponentTypeId, element_size: usize, capacity: usize) -> EcsResult<Self> {
        let word_count = Self::word_count(element_size, capacity)?;
        Ok(Self {
            id,
            element_size,
            words: vec![0; word_count].into_boxed_slice(),
            forward: vec![UNMAPPED; capacity].into_boxed_slice(),
            backward: vec![Entity::NULL; capacity].into_boxed_slice(),
            count: 0,
        })
    }

    /// Type id this storage serves.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ComponentTypeId {
        self.id
    }

    /// Bytes per element.
    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.element_size
    }

    /// Maximum number of elements.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.forward.len()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Checks if no entity holds this component.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes held by this storage's buffers.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.words.len() * WORD_SIZE
            + self.forward.len() * std::mem::size_of::<u32>()
            + self.backward.len() * std::mem::size_of::<Entity>()
    }

    /// Dense index of `entity`'s element, if it has one.
    #[inline]
    #[must_use]
    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        match self.forward.get(entity.index() as usize) {
            Some(&index) if index != UNMAPPED => Some(index as usize),
            _ => None,
        }
    }

    /// Checks if `entity` has an element here.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Entities holding this component, in dense order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.backward[..self.count]
    }

    /// Occupied element bytes, in dense order.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes()[..self.count * self.element_size]
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    #[inline]
    fn span(&self, dense: usize) -> std::ops::Range<usize> {
        let start = dense * self.element_size;
        start..start + self.element_size
    }

    /// Appends a zeroed element for `entity` and returns it.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityOutOfRange`] if the index is beyond capacity
    /// - [`EcsError::DuplicateComponent`] if `entity` already has an element
    pub fn add(&mut self, entity: Entity) -> EcsResult<&mut [u8]> {
        let index = entity.index() as usize;
        let capacity = self.capacity();
        let Some(&mapped) = self.forward.get(index) else {
            return Err(EcsError::EntityOutOfRange { entity, max: capacity });
        };
        if mapped != UNMAPPED {
            return Err(EcsError::DuplicateComponent { entity, component: self.id });
        }

        // `count < capacity` holds because every entity index maps at most once.
        let dense = self.count;
        #[allow(clippy::cast_possible_truncation)]
        {
            self.forward[index] = dense as u32;
        }
        self.backward[dense] = entity;
        self.count += 1;

        let span = self.span(dense);
        let slot = &mut self.bytes_mut()[span];
        slot.fill(0);
        Ok(slot)
    }

    /// Removes `entity`'s element, moving the last element into its slot.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `entity` has no element here.
    pub fn remove(&mut self, entity: Entity) -> EcsResult<()> {
        let Some(hole) = self.dense_index(entity) else {
            return Err(EcsError::MissingComponent { entity, component: self.id });
        };

        let last = self.count - 1;
        if hole != last {
            let from = self.span(last);
            let to = self.span(hole).start;
            self.bytes_mut().copy_within(from, to);

            let moved = self.backward[last];
            #[allow(clippy::cast_possible_truncation)]
            {
                self.forward[moved.index() as usize] = hole as u32;
            }
            self.backward[hole] = moved;
        }

        self.forward[entity.index() as usize] = UNMAPPED;
        self.backward[last] = Entity::NULL;
        self.count = last;
        Ok(())
    }

    /// Returns `entity`'s element bytes.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&[u8]> {
        let dense = self.dense_index(entity)?;
        Some(&self.bytes()[self.span(dense)])
    }

    /// Returns `entity`'s element bytes mutably.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut [u8]> {
        let dense = self.dense_index(entity)?;
        let span = self.span(dense);
        Some(&mut self.bytes_mut()[span])
    }

    pub(crate) fn check_layout<T: Pod>(&self) -> EcsResult<()> {
        let requested = std::mem::size_of::<T>();
        if requested != self.element_size || std::mem::align_of::<T>() > WORD_SIZE {
            return Err(EcsError::LayoutMismatch {
                component: self.id,
                stored: self.element_size,
                requested,
            });
        }
        Ok(())
    }

    /// Returns `entity`'s element as `T`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::LayoutMismatch`] if `T` does not fit the element layout
    /// - [`EcsError::MissingComponent`] if `entity` has no element here
    pub fn get_as<T: Pod>(&self, entity: Entity) -> EcsResult<&T> {
        self.check_layout::<T>()?;
        let bytes = self
            .get(entity)
            .ok_or(EcsError::MissingComponent { entity, component: self.id })?;
        Ok(bytemuck::from_bytes(bytes))
    }

    /// Returns `entity`'s element as `T`, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentStorage::get_as`].
    pub fn get_as_mut<T: Pod>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.check_layout::<T>()?;
        let component = self.id;
        let bytes = self
            .get_mut(entity)
            .ok_or(EcsError::MissingComponent { entity, component })?;
        Ok(bytemuck::from_bytes_mut(bytes))
    }

    /// All occupied elements as a `T` slice, in dense order.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` does not fit the element layout.
    pub fn as_slice<T: Pod>(&self) -> EcsResult<&[T]> {
        self.check_layout::<T>()?;
        Ok(bytemuck::cast_slice(self.as_bytes()))
    }

    /// All occupied elements as a mutable `T` slice, in dense order.
    ///
    /// # Errors
    ///
    /// [`EcsError::LayoutMismatch`] if `T` does not fit the element layout.
    pub fn as_mut_slice<T: Pod>(&mut self) -> EcsResult<&mut [T]> {
        self.check_layout::<T>()?;
        let len = self.count * self.element_size;
        Ok(bytemuck::cast_slice_mut(&mut self.bytes_mut()[..len]))
    }

    /// Iterates `(entity, element bytes)` in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &[u8])> + '_ {
        self.entities()
            .iter()
            .copied()
            .zip(self.as_bytes().chunks_exact(self.element_size))
    }
}
