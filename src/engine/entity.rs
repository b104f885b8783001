//! Entity identity and location tracking.
//!
//! An [`EntityId`] is the only public name of an entity. It carries no data
//! and no ownership; it is purely a key into [`Entities`], which maps it to
//! the entity's current [`EntityRecord`] (archetype and row).
//!
//! ## Identity
//! Ids are assigned from a monotonically increasing counter and are never
//! reused within one world, so a destroyed id can never alias a newer entity.
//!
//! ## Location
//! Entities do not know where their component data lives. Every structural
//! change (component add/remove, destruction of another entity in the same
//! archetype) updates the record here.

use std::collections::HashMap;
use std::fmt;

use crate::engine::types::{ArchetypeId, Row};

/// Opaque entity handle.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw id. Only meaningful for ids previously obtained from
    /// [`EntityId::to_raw`] in the same world.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Current storage location of one entity.
///
/// For entities in the empty-signature archetype the row is nominal (`0`):
/// that archetype has no arrays, so no row is materialised.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityRecord {
    /// Archetype holding the entity's components.
    pub archetype: ArchetypeId,

    /// Row inside that archetype.
    pub row: Row,
}

/// Registry of live entities.
///
/// ## Invariants
/// - Exactly one record per live entity.
/// - `next_id` is strictly greater than every id ever handed out.

#[derive(Default)]
pub struct Entities {
    next_id: u64,
    records: HashMap<EntityId, EntityRecord>,
}

impl Entities {
    /// Creates an empty registry with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: 0,
            records: HashMap::with_capacity(capacity),
        }
    }

    /// Allocates the next id and records its initial location.
    pub fn alloc(&mut self, record: EntityRecord) -> EntityId {
        let entity = EntityId(self.next_id);
        self.next_id += 1;
        self.records.insert(entity, record);
        entity
    }

    /// Erases `entity`, returning its last location.
    pub fn free(&mut self, entity: EntityId) -> Option<EntityRecord> {
        self.records.remove(&entity)
    }

    /// Returns the location of `entity`, if live.
    #[inline]
    pub fn get(&self, entity: EntityId) -> Option<EntityRecord> {
        self.records.get(&entity).copied()
    }

    /// Overwrites the location of a live entity.
    pub fn set(&mut self, entity: EntityId, record: EntityRecord) {
        debug_assert!(
            self.records.contains_key(&entity),
            "set was called on a dead entity. Entity: {entity}, Record: {record:?}"
        );
        if let Some(slot) = self.records.get_mut(&entity) {
            *slot = record;
        }
    }

    /// Overwrites only the row of a live entity.
    pub fn set_row(&mut self, entity: EntityId, row: Row) {
        debug_assert!(self.records.contains_key(&entity), "set_row was called on a dead entity {entity}");
        if let Some(slot) = self.records.get_mut(&entity) {
            slot.row = row;
        }
    }

    /// Returns `true` if `entity` is live.
    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.records.contains_key(&entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no entity is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates live entities and their locations, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityRecord)> + '_ {
        self.records.iter().map(|(&entity, &record)| (entity, record))
    }
}
