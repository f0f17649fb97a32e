//! # Entity Management
//!
//! Entities are lightweight handles consisting of:
//! - An index into component storages and the entity slot table
//! - A generation counter for detecting use of a recycled index

use std::fmt;

use super::signature::Signature;

/// Handle to an entity.
///
/// The handle is split into two parts:
/// - Lower 32 bits: index (`0..max_entities`)
/// - Upper 32 bits: generation of the slot when the handle was minted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// Null/invalid handle. Never returned by a world.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a handle from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this is [`Entity::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Raw packed value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// Per-index bookkeeping held by the world.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct EntitySlot {
    /// Current generation; bumped every time the index is freed.
    pub generation: u32,
    /// Components attached to the live entity. Zero while free.
    pub signature: Signature,
    /// Whether the index is handed out.
    pub alive: bool,
}

impl EntitySlot {
    /// Handle for this slot at `index`.
    #[inline]
    pub const fn handle(&self, index: u32) -> Entity {
        Entity::new(index, self.generation)
    }

    /// Checks if `entity` is the live occupant of this slot.
    #[inline]
    pub const fn is_current(&self, entity: Entity) -> bool {
        self.alive && self.generation == entity.generation()
    }
}
