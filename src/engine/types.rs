//! Core ECS Types, Identifiers, and Bit-Level Layouts
//!
//! This module defines the **fundamental identifiers and signatures** used
//! throughout the store. They are shared by the component registry, the
//! archetype registry, the entity registry and the query engine.
//!
//! ## Design Philosophy
//!
//! - **One machine word per signature.** A component set is a single `u64`,
//!   so a process-wide ceiling of 64 component types is part of the design.
//! - **Single-bit component identifiers.** A [`ComponentId`] *is* its own
//!   one-bit mask, which makes signature arithmetic a handful of bit ops.
//! - **Dense archetype identifiers.** Archetypes are addressed by their index
//!   into the archetype table and never removed.
//!
//! ## Signatures
//!
//! A [`ComponentMask`] describes the exact component set of an archetype or the
//! requested set of a query:
//!
//! - archetype identity: masks are compared for bit-pattern equality,
//! - query matching: an archetype matches when its mask [`has`](ComponentMask::has)
//!   the query mask,
//! - transitions: the component that differs between two neighbouring
//!   archetypes is `old ^ new`.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, BitXor};

/// Maximum number of distinct component types a registry can hold.
pub const MAX_COMPONENTS: usize = 64;

/// Capacity a component array grows to on its first insertion.
pub const DEFAULT_ARRAY_CAPACITY: usize = 16;

/// Dense identifier of an archetype (its index in the archetype table).
pub type ArchetypeId = u32;

/// Row index inside an archetype.
pub type Row = usize;

/// Identifier of a component type.
///
/// ## Representation
/// The wrapped value has exactly one bit set; the bit position (0–63) is the
/// registration order of the component type inside its registry.
///
/// ## Invariants
/// - `self.0.count_ones() == 1`

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Builds the identifier for bit position `index`.
    ///
    /// ## Panics
    /// Panics if `index >= MAX_COMPONENTS`.

    #[inline]
    pub fn from_index(index: usize) -> Self {
        assert!(
            index < MAX_COMPONENTS,
            "component bit position {index} exceeds the {MAX_COMPONENTS}-component ceiling"
        );
        Self(1u64 << index)
    }

    /// Returns the bit position (0–63) of this identifier.
    #[inline]
    pub fn index(self) -> usize {
        self.0.trailing_zeros() as usize
    }

    /// Returns the raw single-bit value.
    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Returns a mask containing only this component.
    #[inline]
    pub fn mask(self) -> ComponentMask {
        ComponentMask(self.0)
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.index())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

/// Bitset representing a set of components.
///
/// ## Purpose
/// Used both as the identity of an archetype (its exact signature) and as the
/// requested set of a query.
///
/// ## Notes
/// Two masks are equal iff their bit patterns are equal.

#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// The empty signature.
    pub const EMPTY: ComponentMask = ComponentMask(0);

    /// Creates a mask from raw bits.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns `true` if no component is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of components in the set.
    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if `component_id` is in the set.
    #[inline]
    pub fn contains(self, component_id: ComponentId) -> bool {
        self.0 & component_id.bits() != 0
    }

    /// Returns `true` if every component of `other` is also in `self`
    /// (superset test).
    #[inline]
    pub const fn has(self, other: ComponentMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set subtraction: components of `self` that are not in `other`.
    #[inline]
    pub const fn without(self, other: ComponentMask) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns a copy with `component_id` added.
    #[inline]
    pub fn with(self, component_id: ComponentId) -> Self {
        Self(self.0 | component_id.bits())
    }

    /// Adds `component_id` in place.
    #[inline]
    pub fn insert(&mut self, component_id: ComponentId) {
        self.0 |= component_id.bits();
    }

    /// Removes `component_id` in place.
    #[inline]
    pub fn remove(&mut self, component_id: ComponentId) {
        self.0 &= !component_id.bits();
    }

    /// Iterates over the component ids of this set in bit order.
    pub fn iter(self) -> impl Iterator<Item = ComponentId> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let lowest = bits & bits.wrapping_neg();
            bits &= bits - 1;
            Some(ComponentId(lowest))
        })
    }

    /// Returns the only component of a single-element mask.
    ///
    /// ## Panics
    /// Panics unless exactly one bit is set.

    #[inline]
    pub fn single(self) -> ComponentId {
        assert_eq!(self.len(), 1, "mask {self:?} does not hold exactly one component");
        ComponentId(self.0)
    }
}

impl From<ComponentId> for ComponentMask {
    fn from(component_id: ComponentId) -> Self {
        component_id.mask()
    }
}

impl BitOr for ComponentMask {
    type Output = ComponentMask;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ComponentMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ComponentMask {
    type Output = ComponentMask;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitXor for ComponentMask {
    type Output = ComponentMask;
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentMask({:#b})", self.0)
    }
}
