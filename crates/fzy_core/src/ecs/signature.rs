//! # Signatures
//!
//! A signature is a 64-bit set of component type ids. Entities carry one
//! describing their attached components; processes carry one describing the
//! components they require.

use std::fmt;

/// Id of a registered component type; doubles as its signature bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ComponentTypeId(pub(crate) u8);

impl ComponentTypeId {
    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the id as an index into per-type tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bitset of component types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(u64);

impl Signature {
    /// Number of distinct component types a signature can hold.
    pub const BITS: usize = u64::BITS as usize;

    /// No components.
    pub const EMPTY: Self = Self(0);

    /// Wraps a raw mask.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw mask.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    const fn bit(component: ComponentTypeId) -> u64 {
        1 << component.0
    }

    /// Returns a copy with `component` set.
    #[inline]
    #[must_use]
    pub const fn with(self, component: ComponentTypeId) -> Self {
        Self(self.0 | Self::bit(component))
    }

    /// Returns a copy with `component` cleared.
    #[inline]
    #[must_use]
    pub const fn without(self, component: ComponentTypeId) -> Self {
        Self(self.0 & !Self::bit(component))
    }

    /// Sets `component`.
    #[inline]
    pub fn set(&mut self, component: ComponentTypeId) {
        self.0 |= Self::bit(component);
    }

    /// Clears `component`.
    #[inline]
    pub fn remove(&mut self, component: ComponentTypeId) {
        self.0 &= !Self::bit(component);
    }

    /// Checks if `component` is set.
    #[inline]
    #[must_use]
    pub const fn test(self, component: ComponentTypeId) -> bool {
        self.0 & Self::bit(component) != 0
    }

    /// Checks if every bit of `mask` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, mask: Self) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// Checks if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates set component ids, lowest first.
    pub fn iter(self) -> impl Iterator<Item = ComponentTypeId> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                return None;
            }
            #[allow(clippy::cast_possible_truncation)]
            let bit = rest.trailing_zeros() as u8;
            rest &= rest - 1;
            Some(ComponentTypeId(bit))
        })
    }
}

impl FromIterator<ComponentTypeId> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentTypeId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}
