//! # Archetypes and the archetype transition graph
//!
//! An [`Archetype`] stores every component of every entity that shares one
//! exact signature, as parallel arrays: row `i` of each array belongs to the
//! entity at `entities[i]`.
//!
//! [`Archetypes`] is the registry of all archetypes. It maps signatures to
//! archetypes, creates new archetypes lazily when an entity's signature
//! changes, and keeps the [`ComponentIndex`] that answers "which array of
//! archetype Y stores component X".
//!
//! ## Column order
//!
//! A new archetype is always created *from* a neighbouring archetype that
//! differs by exactly one component. It inherits the neighbour's array order
//! (minus the removed component, or plus the added one at the end). Array
//! order therefore reflects transition history, not bit order, which is why
//! positions are looked up through the component index instead of computed.
//!
//! ## Transition edges
//!
//! Each archetype caches the destination of every add/remove transition that
//! has been taken from it, so repeated transitions skip the signature lookup.
//!
//! ## Lifetime
//!
//! Archetypes are never deleted, even when empty. Games revisit the same
//! signatures constantly, so keeping them avoids churn.

use std::collections::HashMap;

use crate::engine::component::Component;
use crate::engine::entity::EntityId;
use crate::engine::storage::{ComponentArray, TypeErasedArray};
use crate::engine::types::{ArchetypeId, ComponentId, ComponentMask, Row, MAX_COMPONENTS};

/// Id of the empty-signature archetype every entity starts in.
pub const EMPTY_ARCHETYPE: ArchetypeId = 0;

/// Parallel component arrays for one exact signature.
///
/// ## Invariants
/// - One array per bit of `mask`.
/// - Every array has `entities.len()` rows.

pub struct Archetype {
    archetype_id: ArchetypeId,
    mask: ComponentMask,
    arrays: Vec<Box<dyn TypeErasedArray>>,
    entities: Vec<EntityId>,
    add_edges: HashMap<ComponentId, ArchetypeId>,
    remove_edges: HashMap<ComponentId, ArchetypeId>,
}

impl Archetype {
    fn new(archetype_id: ArchetypeId, mask: ComponentMask, arrays: Vec<Box<dyn TypeErasedArray>>) -> Self {
        Self {
            archetype_id,
            mask,
            arrays,
            entities: Vec::new(),
            add_edges: HashMap::new(),
            remove_edges: HashMap::new(),
        }
    }

    /// Dense id of this archetype.
    #[inline]
    pub fn id(&self) -> ArchetypeId {
        self.archetype_id
    }

    /// Exact signature of this archetype.
    #[inline]
    pub fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// Returns `true` if this archetype stores `component_id`.
    #[inline]
    pub fn has(&self, component_id: ComponentId) -> bool {
        self.mask.contains(component_id)
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity is stored here.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Row-to-entity map.
    #[inline]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Entity stored at `row`.
    #[inline]
    pub fn entity_at(&self, row: Row) -> EntityId {
        self.entities[row]
    }

    /// Arrays in column order.
    #[inline]
    pub fn arrays(&self) -> &[Box<dyn TypeErasedArray>] {
        &self.arrays
    }

    /// Typed view of the array at `column`.
    ///
    /// ## Panics
    /// Panics if the array does not store `T`.

    pub fn column<T: Component>(&self, column: usize) -> &ComponentArray<T> {
        let array = &self.arrays[column];
        let name = array.element_type_name();
        array
            .as_any()
            .downcast_ref::<ComponentArray<T>>()
            .unwrap_or_else(|| panic!("column {column} stores `{name}`, not `{}`", std::any::type_name::<T>()))
    }

    /// Mutable typed view of the array at `column`.
    ///
    /// ## Panics
    /// Panics if the array does not store `T`.

    pub fn column_mut<T: Component>(&mut self, column: usize) -> &mut ComponentArray<T> {
        let array = &mut self.arrays[column];
        let name = array.element_type_name();
        array
            .as_any_mut()
            .downcast_mut::<ComponentArray<T>>()
            .unwrap_or_else(|| panic!("column {column} stores `{name}`, not `{}`", std::any::type_name::<T>()))
    }

    /// Splits the archetype into its arrays (mutable) and row-to-entity map.
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&mut [Box<dyn TypeErasedArray>], &[EntityId]) {
        (&mut self.arrays, &self.entities)
    }

    /// Appends `entity` to the row-to-entity map and returns its row.
    pub(crate) fn push_entity(&mut self, entity: EntityId) -> Row {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Swap-removes `row` from the row-to-entity map only.
    ///
    /// Returns the entity that now occupies `row`, if any.
    pub(crate) fn swap_remove_entity(&mut self, row: Row) -> Option<EntityId> {
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    /// Destroys every component at `row` and swap-removes the row.
    ///
    /// Returns the entity that now occupies `row`, if any.
    pub(crate) fn destroy_row(&mut self, row: Row) -> Option<EntityId> {
        for array in self.arrays.iter_mut() {
            array.remove_dyn(row);
        }
        self.swap_remove_entity(row)
    }

    /// Cached destination of adding `component_id`, if already taken.
    #[inline]
    pub fn add_edge(&self, component_id: ComponentId) -> Option<ArchetypeId> {
        self.add_edges.get(&component_id).copied()
    }

    /// Cached destination of removing `component_id`, if already taken.
    #[inline]
    pub fn remove_edge(&self, component_id: ComponentId) -> Option<ArchetypeId> {
        self.remove_edges.get(&component_id).copied()
    }
}

/// `(ComponentId, ArchetypeId) -> column` lookup table.
pub struct ComponentIndex {
    columns: Vec<HashMap<ArchetypeId, usize>>,
}

impl Default for ComponentIndex {
    fn default() -> Self {
        Self {
            columns: (0..MAX_COMPONENTS).map(|_| HashMap::new()).collect(),
        }
    }
}

impl ComponentIndex {
    fn insert(&mut self, component_id: ComponentId, archetype_id: ArchetypeId, column: usize) {
        self.columns[component_id.index()].insert(archetype_id, column);
    }

    /// Column of `component_id` inside `archetype_id`, if stored there.
    #[inline]
    pub fn column(&self, component_id: ComponentId, archetype_id: ArchetypeId) -> Option<usize> {
        self.columns[component_id.index()].get(&archetype_id).copied()
    }
}

/// Registry of all archetypes, keyed by signature.
pub struct Archetypes {
    archetypes: Vec<Archetype>,
    by_mask: HashMap<ComponentMask, ArchetypeId>,
    index: ComponentIndex,
}

impl Default for Archetypes {
    fn default() -> Self {
        Self::new()
    }
}

impl Archetypes {
    /// Creates a registry holding only the empty-signature archetype.
    pub fn new() -> Self {
        let mut by_mask = HashMap::new();
        by_mask.insert(ComponentMask::EMPTY, EMPTY_ARCHETYPE);
        Self {
            archetypes: vec![Archetype::new(EMPTY_ARCHETYPE, ComponentMask::EMPTY, Vec::new())],
            by_mask,
            index: ComponentIndex::default(),
        }
    }

    /// Looks up the archetype with exactly `mask`.
    #[inline]
    pub fn find(&self, mask: ComponentMask) -> Option<ArchetypeId> {
        self.by_mask.get(&mask).copied()
    }

    /// Builds the archetype for `new_mask` from its neighbour `old`.
    ///
    /// ## Behavior
    /// 1. `new_mask.has(old_mask)` decides between an add and a remove
    ///    transition; the single differing component is `old_mask ^ new_mask`.
    /// 2. Arrays of `old` are carried over in their existing order, except the
    ///    removed one.
    /// 3. On an add, `added_array` supplies the new component's array, which
    ///    is appended last.
    /// 4. Every column is recorded in the component index and the archetype is
    ///    registered under `new_mask`.
    ///
    /// ## Panics
    /// Panics if an archetype for `new_mask` exists already, or if the masks do
    /// not differ by exactly one component.

    pub fn create(
        &mut self,
        old: ArchetypeId,
        new_mask: ComponentMask,
        added_array: impl FnOnce(ComponentId) -> Box<dyn TypeErasedArray>,
    ) -> ArchetypeId {
        assert!(self.find(new_mask).is_none(), "archetype for {new_mask:?} already exists");

        let old_archetype = &self.archetypes[old as usize];
        let old_mask = old_archetype.mask;
        let is_add = new_mask.has(old_mask);
        let changed = (old_mask ^ new_mask).single();

        let new_id = self.archetypes.len() as ArchetypeId;
        let mut arrays: Vec<Box<dyn TypeErasedArray>> = Vec::with_capacity(old_archetype.arrays.len() + 1);

        for array in &old_archetype.arrays {
            let component_id = array.component_id();
            if !is_add && component_id == changed {
                continue;
            }
            self.index.insert(component_id, new_id, arrays.len());
            arrays.push(array.new_empty());
        }

        if is_add {
            let array = added_array(changed);
            debug_assert_eq!(array.component_id(), changed);
            self.index.insert(changed, new_id, arrays.len());
            arrays.push(array);
        }

        log::debug!(
            "created archetype {} {:?} from {} ({} {})",
            new_id,
            new_mask,
            old,
            if is_add { "add" } else { "remove" },
            changed
        );

        self.archetypes.push(Archetype::new(new_id, new_mask, arrays));
        self.by_mask.insert(new_mask, new_id);
        new_id
    }

    /// Resolves the destination of adding (`is_add`) or removing `component_id`
    /// from archetype `from`, creating it if needed and caching the edge.
    pub fn transition(
        &mut self,
        from: ArchetypeId,
        component_id: ComponentId,
        is_add: bool,
        added_array: impl FnOnce(ComponentId) -> Box<dyn TypeErasedArray>,
    ) -> ArchetypeId {
        let source = &self.archetypes[from as usize];
        let cached = if is_add {
            source.add_edge(component_id)
        } else {
            source.remove_edge(component_id)
        };
        if let Some(destination) = cached {
            return destination;
        }

        let new_mask = if is_add {
            source.mask.with(component_id)
        } else {
            source.mask.without(component_id.mask())
        };

        let destination = match self.find(new_mask) {
            Some(existing) => existing,
            None => self.create(from, new_mask, added_array),
        };

        if is_add {
            self.archetypes[from as usize].add_edges.insert(component_id, destination);
            self.archetypes[destination as usize].remove_edges.insert(component_id, from);
        } else {
            self.archetypes[from as usize].remove_edges.insert(component_id, destination);
            self.archetypes[destination as usize].add_edges.insert(component_id, from);
        }
        destination
    }

    /// The archetype with id `archetype_id`.
    #[inline]
    pub fn get(&self, archetype_id: ArchetypeId) -> &Archetype {
        &self.archetypes[archetype_id as usize]
    }

    /// The archetype with id `archetype_id`, mutably.
    #[inline]
    pub fn get_mut(&mut self, archetype_id: ArchetypeId) -> &mut Archetype {
        &mut self.archetypes[archetype_id as usize]
    }

    /// Migrates `entity` from row `row` of `from` to the end of `to`.
    ///
    /// ## Behavior
    /// - Components stored by both archetypes are moved, never copied or
    ///   dropped.
    /// - Components `to` does not store are destroyed.
    /// - Both the source arrays and the source row-to-entity map are
    ///   swap-removed, so the last row of `from` fills the hole.
    ///
    /// Returns the entity's new row (nominally `0` in the empty archetype) and
    /// the entity that was moved into `row` of `from`, if any. Arrays that `to`
    /// stores but `from` does not are left for the caller to fill.

    pub(crate) fn move_row(
        &mut self,
        entity: EntityId,
        from: ArchetypeId,
        to: ArchetypeId,
        row: Row,
    ) -> (Row, Option<EntityId>) {
        let index = &self.index;
        let (source, destination) = pair_mut(&mut self.archetypes, from, to);

        if from == EMPTY_ARCHETYPE {
            return (destination.push_entity(entity), None);
        }

        debug_assert_eq!(source.entity_at(row), entity);

        for array in source.arrays.iter_mut() {
            match index.column(array.component_id(), to) {
                Some(column) => {
                    destination.arrays[column].push_from_dyn(&mut **array, row);
                }
                None => {
                    array.remove_dyn(row);
                }
            }
        }

        let moved = source.swap_remove_entity(row);
        let new_row = if to == EMPTY_ARCHETYPE {
            0
        } else {
            destination.push_entity(entity)
        };
        (new_row, moved)
    }

    /// The component index.
    #[inline]
    pub fn index(&self) -> &ComponentIndex {
        &self.index
    }

    /// All archetypes (mutably) together with the component index.
    #[inline]
    pub(crate) fn parts_mut(&mut self) -> (&mut [Archetype], &ComponentIndex) {
        (&mut self.archetypes, &self.index)
    }

    /// Iterates archetypes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Number of archetypes, including the empty one.
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Always `false`: the empty-signature archetype exists from the start.
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Non-empty archetypes whose signature is a superset of `mask`, in
    /// creation order.
    pub fn matching(&self, mask: ComponentMask) -> impl Iterator<Item = &Archetype> {
        self.archetypes
            .iter()
            .filter(move |archetype| !archetype.is_empty() && archetype.mask.has(mask))
    }
}

/// Two distinct archetypes of `archetypes`, mutably.
fn pair_mut(archetypes: &mut [Archetype], a: ArchetypeId, b: ArchetypeId) -> (&mut Archetype, &mut Archetype) {
    assert!(a != b, "source and destination archetype must differ");

    let (low, high) = if a < b { (a, b) } else { (b, a) };
    let (head, tail) = archetypes.split_at_mut(high as usize);

    let left = &mut head[low as usize];
    let right = &mut tail[0];

    if a < b { (left, right) } else { (right, left) }
}
