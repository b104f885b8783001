//! The world: entity lifecycle, component migration and query dispatch.
//!
//! [`World`] owns every piece of store state:
//!
//! * the component registry (type to bit position),
//! * the archetype registry and its transition graph,
//! * the entity registry (id to archetype and row),
//! * the construction-time [`WorldConfig`].
//!
//! ## Structural changes
//!
//! Adding or removing a component changes an entity's signature, which moves
//! all of its component values to a different archetype (*migration*).
//! Migration and destruction both swap-remove the entity's old row, so the
//! entity that previously occupied the last row of that archetype gets a new
//! row; its record is updated in the same step.
//!
//! References returned by [`World::add`], [`World::get`] and friends stay
//! valid only until the next structural change, which the borrow checker
//! enforces.
//!
//! ## Dispatch
//!
//! Every dispatch flavour visits the archetypes whose signature is a superset
//! of the query signature, skipping empty ones:
//!
//! | method | callback receives |
//! |---|---|
//! | [`run`](World::run) | spans |
//! | [`run_with`](World::run_with) | context, spans |
//! | [`run_each`](World::run_each) | context, one row of items |
//! | [`run_indexed`](World::run_indexed) | context, row-to-entity map, spans |
//! | [`run_interactions`](World::run_interactions) | context, two entity ids |
//!
//! Archetypes are visited in creation order. Callers should not depend on
//! cross-archetype ordering; rows within one archetype are stable for the
//! duration of a pass because the world is exclusively borrowed.
//!
//! ## Concurrency
//!
//! `World` is `Send + Sync` but takes `&mut self` for every structural change.
//! Spans handed to a callback may be split across a thread pool (for example
//! with `rayon`); structural changes discovered during a pass are recorded in
//! a [`CommandQueue`](crate::CommandQueue) and applied afterwards.

use std::any::type_name;

use crate::engine::archetype::{Archetype, Archetypes, EMPTY_ARCHETYPE};
use crate::engine::component::{Component, ComponentRegistry, ComponentSet};
use crate::engine::config::WorldConfig;
use crate::engine::entity::{Entities, EntityId, EntityRecord};
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::query::{query_mask, Columns, ComponentQuery};
use crate::engine::storage::TypeErasedArray;
use crate::engine::types::{ArchetypeId, ComponentId};

/// Archetype-based entity/component store.
///
/// ## Example
/// ```
/// use archetype_ecs::World;
///
/// #[derive(Debug, PartialEq)]
/// struct Position { x: f32, y: f32 }
/// struct Velocity { x: f32, y: f32 }
///
/// let mut world = World::new();
/// let e = world.create_entity();
/// world.add(e, Position { x: 1.0, y: 2.0 });
/// world.add(e, Velocity { x: 3.0, y: 4.0 });
///
/// world.run::<(&mut Position, &Velocity)>(|(positions, velocities)| {
///     for (p, v) in positions.iter_mut().zip(velocities.iter()) {
///         p.x += v.x;
///         p.y += v.y;
///     }
/// });
///
/// assert_eq!(world.get::<Position>(e), &Position { x: 4.0, y: 6.0 });
/// ```

pub struct World {
    config: WorldConfig,
    registry: ComponentRegistry,
    archetypes: Archetypes,
    entities: Entities,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an empty world with `config`.
    pub fn with_config(config: WorldConfig) -> Self {
        log::debug!("creating world with {config:?}");
        Self {
            config,
            registry: ComponentRegistry::new(),
            archetypes: Archetypes::new(),
            entities: Entities::with_capacity(config.entity_capacity_hint),
        }
    }

    /// Construction parameters of this world.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Component registry of this world.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Component registry of this world, mutably (for example to
    /// [`freeze`](ComponentRegistry::freeze) it after setup).
    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Archetype registry of this world, for inspection.
    pub fn archetypes(&self) -> &Archetypes {
        &self.archetypes
    }

    /// Registers `T` ahead of first use and returns its id.
    ///
    /// ## Panics
    /// Panics if the registry is frozen or full.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        self.registry.register::<T>()
    }

    /// Registers `T` ahead of first use and returns its id.
    pub fn try_register<T: Component>(&mut self) -> EcsResult<ComponentId> {
        self.registry.try_register::<T>()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entity lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Creates an entity with no components.
    ///
    /// Ids are never reused within one world.
    pub fn create_entity(&mut self) -> EntityId {
        let entity = self.entities.alloc(EntityRecord {
            archetype: EMPTY_ARCHETYPE,
            row: 0,
        });
        log::trace!("created {entity}");
        entity
    }

    /// Alias of [`create_entity`](World::create_entity).
    #[inline]
    pub fn new_entity(&mut self) -> EntityId {
        self.create_entity()
    }

    /// Destroys `entity` and every component it carries.
    ///
    /// ## Panics
    /// Panics if `entity` is not live.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        if let Err(error) = self.try_destroy_entity(entity) {
            panic!("{error}");
        }
    }

    /// Destroys `entity` and every component it carries.
    ///
    /// ## Behavior
    /// 1. Erases the entity's record.
    /// 2. Destroys every component value at its row (swap-remove).
    /// 3. Points the entity moved into the vacated row at its new row.
    ///
    /// ## Errors
    /// [`EcsError::NoSuchEntity`] if `entity` is not live.

    pub fn try_destroy_entity(&mut self, entity: EntityId) -> EcsResult<()> {
        let record = self.entities.free(entity).ok_or(EcsError::NoSuchEntity(entity))?;

        if record.archetype != EMPTY_ARCHETYPE {
            let archetype = self.archetypes.get_mut(record.archetype);
            if let Some(moved) = archetype.destroy_row(record.row) {
                self.entities.set_row(moved, record.row);
            }
        }

        log::trace!("destroyed {entity} from archetype {}", record.archetype);
        Ok(())
    }

    /// Returns `true` if `entity` is live.
    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Current storage location of `entity`, if live.
    #[inline]
    pub fn location(&self, entity: EntityId) -> Option<EntityRecord> {
        self.entities.get(entity)
    }

    fn record(&self, entity: EntityId) -> EntityRecord {
        match self.entities.get(entity) {
            Some(record) => record,
            None => panic!("{}", EcsError::NoSuchEntity(entity)),
        }
    }

    fn column_of<T: Component>(&self, archetype_id: ArchetypeId) -> Option<usize> {
        let component_id = self.registry.id_of::<T>()?;
        self.archetypes.index().column(component_id, archetype_id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Component access
    // ─────────────────────────────────────────────────────────────────────

    /// Returns `true` if `entity` is live and carries a `T`.
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        match (self.registry.id_of::<T>(), self.entities.get(entity)) {
            (Some(component_id), Some(record)) => self.archetypes.get(record.archetype).has(component_id),
            _ => false,
        }
    }

    /// The `T` of `entity`.
    ///
    /// ## Panics
    /// Panics if `entity` is not live or carries no `T`.
    pub fn get<T: Component>(&self, entity: EntityId) -> &T {
        let record = self.record(entity);
        let column = self
            .column_of::<T>(record.archetype)
            .unwrap_or_else(|| panic!("{entity} has no component `{}`", type_name::<T>()));
        self.archetypes.get(record.archetype).column::<T>(column).at(record.row)
    }

    /// The `T` of `entity`, mutably.
    ///
    /// ## Panics
    /// Panics if `entity` is not live or carries no `T`.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> &mut T {
        let record = self.record(entity);
        let column = self
            .column_of::<T>(record.archetype)
            .unwrap_or_else(|| panic!("{entity} has no component `{}`", type_name::<T>()));
        self.archetypes
            .get_mut(record.archetype)
            .column_mut::<T>(column)
            .at_mut(record.row)
    }

    /// The `T` of `entity`, or `None` if the entity is not live or has no `T`.
    pub fn try_get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        let record = self.entities.get(entity)?;
        let column = self.column_of::<T>(record.archetype)?;
        Some(self.archetypes.get(record.archetype).column::<T>(column).at(record.row))
    }

    /// The `T` of `entity` mutably, or `None` if the entity is not live or has
    /// no `T`.
    pub fn try_get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        let record = self.entities.get(entity)?;
        let column = self.column_of::<T>(record.archetype)?;
        Some(
            self.archetypes
                .get_mut(record.archetype)
                .column_mut::<T>(column)
                .at_mut(record.row),
        )
    }

    /// Attaches `value` to `entity` and returns a reference to the stored
    /// value.
    ///
    /// ## Behavior
    /// - If the entity already carries a `T`, the old value is dropped and
    ///   replaced in place; no migration happens.
    /// - Otherwise the entity migrates to the archetype for its signature plus
    ///   `T` (created on first use), every existing component value is moved
    ///   there unchanged, and `value` is appended.
    ///
    /// ## Panics
    /// Panics if `entity` is not live, or if `T` is a new component type and
    /// the registry is frozen or full.

    pub fn add<T: Component>(&mut self, entity: EntityId, value: T) -> &mut T {
        let component_id = self.registry.register::<T>();
        let record = self.record(entity);

        if let Some(column) = self.archetypes.index().column(component_id, record.archetype) {
            let slot = self
                .archetypes
                .get_mut(record.archetype)
                .column_mut::<T>(column)
                .at_mut(record.row);
            *slot = value;
            return slot;
        }

        let destination = self.transition(record.archetype, component_id, true);
        let row = self.migrate(entity, record, destination);

        let column = match self.archetypes.index().column(component_id, destination) {
            Some(column) => column,
            None => panic!("archetype {destination} does not store `{}`", type_name::<T>()),
        };
        let array = self.archetypes.get_mut(destination).column_mut::<T>(column);
        let pushed = array.emplace(value);
        debug_assert_eq!(pushed, row, "component arrays of archetype {destination} out of step");
        array.at_mut(pushed)
    }

    /// Detaches and drops the `T` of `entity`.
    ///
    /// Removing a component the entity does not carry is a no-op. Removing the
    /// last component leaves a live entity with no components.
    ///
    /// ## Panics
    /// Panics if `entity` is not live.

    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        let record = self.record(entity);
        let Some(component_id) = self.registry.id_of::<T>() else {
            return;
        };
        if !self.archetypes.get(record.archetype).has(component_id) {
            return;
        }

        let destination = self.transition(record.archetype, component_id, false);
        self.migrate(entity, record, destination);
    }

    fn transition(&mut self, from: ArchetypeId, component_id: ComponentId, is_add: bool) -> ArchetypeId {
        let registry = &self.registry;
        let base_capacity = self.config.array_base_capacity;
        self.archetypes
            .transition(from, component_id, is_add, |added| new_array(registry, added, base_capacity))
    }

    /// Moves `entity` from its current row to `destination` and repairs the
    /// records of both the entity and whichever entity filled its old row.
    fn migrate(&mut self, entity: EntityId, record: EntityRecord, destination: ArchetypeId) -> usize {
        let (row, moved) = self
            .archetypes
            .move_row(entity, record.archetype, destination, record.row);

        self.entities.set(
            entity,
            EntityRecord {
                archetype: destination,
                row,
            },
        );
        if let Some(moved) = moved {
            self.entities.set_row(moved, record.row);
        }

        log::trace!(
            "migrated {entity} from archetype {} row {} to archetype {destination} row {row}",
            record.archetype,
            record.row
        );
        row
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────

    fn dispatch<'w, Q: ComponentQuery>(&'w mut self, mut visit: impl FnMut(&'w [EntityId], Q::Span<'w>)) {
        let Some(mask) = query_mask::<Q>(&self.registry) else {
            return;
        };

        let registry = &self.registry;
        let (archetypes, index) = self.archetypes.parts_mut();

        for archetype in archetypes {
            if archetype.is_empty() || !archetype.mask().has(mask) {
                continue;
            }
            let archetype_id = archetype.id();
            let (arrays, entities) = archetype.split_mut();
            let mut columns = Columns::new(archetype_id, registry, index, arrays);
            visit(entities, Q::fetch(&mut columns));
        }
    }

    /// Calls `f` once per matching archetype with that archetype's spans.
    ///
    /// ## Panics
    /// Panics if `Q` names a component twice.
    pub fn run<'w, Q: ComponentQuery>(&'w mut self, mut f: impl FnMut(Q::Span<'w>)) {
        self.dispatch::<Q>(|_, span| f(span));
    }

    /// Calls `f` once per matching archetype with a shared context and that
    /// archetype's spans.
    ///
    /// ## Panics
    /// Panics if `Q` names a component twice.
    pub fn run_with<'w, C: ?Sized, Q: ComponentQuery>(&'w mut self, ctx: &mut C, mut f: impl FnMut(&mut C, Q::Span<'w>)) {
        self.dispatch::<Q>(|_, span| f(&mut *ctx, span));
    }

    /// Calls `f` once per matching entity with a shared context and the
    /// entity's components.
    ///
    /// Built on [`run_with`](World::run_with), so traversal order is identical.
    ///
    /// ## Panics
    /// Panics if `Q` names a component twice.
    pub fn run_each<'w, C: ?Sized, Q: ComponentQuery>(&'w mut self, ctx: &mut C, mut f: impl FnMut(&mut C, Q::Item<'w>)) {
        self.run_with::<C, Q>(ctx, |ctx, span| {
            for item in Q::rows(span) {
                f(&mut *ctx, item);
            }
        });
    }

    /// Calls `f` once per matching archetype with a shared context, the
    /// archetype's row-to-entity map and its spans.
    ///
    /// `entities[i]` is the entity whose components sit at index `i` of every
    /// span, which lets the callback record structural changes for specific
    /// rows (for example into a [`CommandQueue`](crate::CommandQueue)).
    ///
    /// ## Panics
    /// Panics if `Q` names a component twice.
    pub fn run_indexed<'w, C: ?Sized, Q: ComponentQuery>(
        &'w mut self,
        ctx: &mut C,
        mut f: impl FnMut(&mut C, &'w [EntityId], Q::Span<'w>),
    ) {
        self.dispatch::<Q>(|entities, span| f(&mut *ctx, entities, span));
    }

    /// Calls `f` once for every unordered pair of distinct entities carrying
    /// every component of `S`.
    ///
    /// No pair is visited twice and no entity is paired with itself. Pair
    /// order is unspecified.
    ///
    /// The world is only borrowed shared, so `ctx` may itself hold a `&World`
    /// to read the components of both entities.
    ///
    /// ## Example
    /// ```
    /// use archetype_ecs::World;
    ///
    /// struct Collider { radius: f32 }
    ///
    /// let mut world = World::new();
    /// for radius in [1.0, 2.0, 3.0] {
    ///     let e = world.create_entity();
    ///     world.add(e, Collider { radius });
    /// }
    ///
    /// let mut pairs = Vec::new();
    /// world.run_interactions::<_, (Collider,)>(&mut pairs, |pairs, a, b| pairs.push((a, b)));
    /// assert_eq!(pairs.len(), 3);
    /// ```

    pub fn run_interactions<C: ?Sized, S: ComponentSet>(&self, ctx: &mut C, mut f: impl FnMut(&mut C, EntityId, EntityId)) {
        let Some(mask) = self.registry.lookup_mask::<S>() else {
            return;
        };

        let matching: Vec<&[EntityId]> = self.archetypes.matching(mask).map(|archetype| archetype.entities()).collect();

        for (position, entities) in matching.iter().enumerate() {
            for (row, &first) in entities.iter().enumerate() {
                for &second in &entities[row + 1..] {
                    f(&mut *ctx, first, second);
                }
                for later in &matching[position + 1..] {
                    for &second in later.iter() {
                        f(&mut *ctx, first, second);
                    }
                }
            }
        }
    }

    /// Every entity carrying every component of `S`.
    pub fn query_entities<S: ComponentSet>(&self) -> Vec<EntityId> {
        let Some(mask) = self.registry.lookup_mask::<S>() else {
            return Vec::new();
        };
        self.archetypes
            .matching(mask)
            .flat_map(|archetype| archetype.entities().iter().copied())
            .collect()
    }

    /// Number of entities carrying every component of `S`.
    pub fn count<S: ComponentSet>(&self) -> usize {
        let Some(mask) = self.registry.lookup_mask::<S>() else {
            return 0;
        };
        self.archetypes.matching(mask).map(Archetype::len).sum()
    }
}

fn new_array(registry: &ComponentRegistry, component_id: ComponentId, base_capacity: usize) -> Box<dyn TypeErasedArray> {
    match registry.describe(component_id) {
        Some(desc) => desc.new_array(base_capacity),
        None => panic!("component {component_id} is not registered"),
    }
}
