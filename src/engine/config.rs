//! World configuration.
//!
//! Knobs that influence allocation behaviour only; none of them change the
//! observable semantics of the store.

use crate::engine::types::DEFAULT_ARRAY_CAPACITY;

/// Construction parameters for a [`World`](crate::World).
///
/// ## Example
/// ```
/// use archetype_ecs::{World, WorldConfig};
///
/// let config = WorldConfig::default()
///     .with_array_base_capacity(64)
///     .with_entity_capacity_hint(1024);
/// let world = World::with_config(config);
/// assert_eq!(world.config().array_base_capacity, 64);
/// ```

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    /// Capacity each component array grows to on its first insertion.
    /// Subsequent growth doubles the capacity.
    pub array_base_capacity: usize,

    /// Number of entity records to reserve up front.
    pub entity_capacity_hint: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            array_base_capacity: DEFAULT_ARRAY_CAPACITY,
            entity_capacity_hint: 0,
        }
    }
}

impl WorldConfig {
    /// Sets the base capacity of component arrays. Zero is clamped to one.
    pub fn with_array_base_capacity(mut self, capacity: usize) -> Self {
        self.array_base_capacity = capacity.max(1);
        self
    }

    /// Sets the number of entity records reserved at construction.
    pub fn with_entity_capacity_hint(mut self, entities: usize) -> Self {
        self.entity_capacity_hint = entities;
        self
    }
}
