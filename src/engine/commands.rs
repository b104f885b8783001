//! # Commands
//!
//! Deferred structural mutations of a [`World`].
//!
//! ## Purpose
//! Structural changes (spawning, destroying, adding or removing components)
//! move rows between archetypes and invalidate spans. They must not happen
//! while a dispatch pass is running. Systems therefore record them as
//! [`Command`] values in a [`CommandQueue`], which is applied once the pass
//! has finished.
//!
//! ## Design
//! - Commands are plain data describing *what* should change. Typed payloads
//!   are boxed behind a small capability trait ([`BoxedComponent`]) or a
//!   monomorphized function pointer; nothing captures world state.
//! - A queue applies its commands strictly in the order they were recorded.
//!
//! ## Stale targets
//! Two systems may independently decide to destroy the same entity in one
//! step. Commands whose target entity is no longer live when the queue is
//! applied are skipped, logged at `debug` and counted in the
//! [`ApplyReport`].

use std::any::type_name;
use std::fmt;

use crate::engine::component::Component;
use crate::engine::entity::EntityId;
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::world::World;

/// A component value whose type is only known to itself.
pub trait BoxedComponent: Send {
    /// Rust type name of the value.
    fn type_name(&self) -> &'static str;

    /// Attaches the value to `entity`.
    fn insert_into(self: Box<Self>, world: &mut World, entity: EntityId);
}

struct Pending<T>(T);

impl<T: Component> BoxedComponent for Pending<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn insert_into(self: Box<Self>, world: &mut World, entity: EntityId) {
        world.add(entity, self.0);
    }
}

/// Boxes `value` for deferred insertion.
pub fn boxed<T: Component>(value: T) -> Box<dyn BoxedComponent> {
    Box::new(Pending(value))
}

fn remove_component<T: Component>(world: &mut World, entity: EntityId) {
    world.remove::<T>(entity);
}

/// Ordered list of component values for a new entity.
///
/// ## Example
/// ```
/// use archetype_ecs::{Bundle, World};
///
/// struct Health(u32);
/// struct Name(&'static str);
///
/// let mut world = World::new();
/// let e = world.spawn(Bundle::new().with(Health(10)).with(Name("orc")));
/// assert_eq!(world.get::<Health>(e).0, 10);
/// ```

#[derive(Default)]
pub struct Bundle {
    values: Vec<Box<dyn BoxedComponent>>,
}

impl Bundle {
    /// Creates an empty bundle.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` and returns the bundle.
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Appends `value`.
    pub fn push<T: Component>(&mut self, value: T) {
        self.values.push(boxed(value));
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the bundle holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Adds every value to `entity`, in insertion order. A later value of the
    /// same type replaces an earlier one.
    pub fn insert_into(self, world: &mut World, entity: EntityId) {
        for value in self.values {
            value.insert_into(world, entity);
        }
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|value| value.type_name()))
            .finish()
    }
}

impl World {
    /// Creates an entity carrying every value of `bundle`.
    pub fn spawn(&mut self, bundle: Bundle) -> EntityId {
        let entity = self.create_entity();
        bundle.insert_into(self, entity);
        entity
    }
}

/// Represents a deferred world mutation.
///
/// ## Invariants
/// - Commands are applied in the order they are recorded.
/// - Apart from `Spawn`, every command names an entity that must still be
///   live when it is applied; otherwise it is skipped.

pub enum Command {
    /// Creates an entity carrying every value of `bundle`.
    Spawn {
        /// Initial components of the new entity.
        bundle: Bundle,
    },

    /// Destroys an entity and all of its components.
    Destroy {
        /// Entity to destroy.
        entity: EntityId,
    },

    /// Attaches a component, replacing an existing value of the same type.
    Add {
        /// Target entity.
        entity: EntityId,
        /// Value to attach.
        component: Box<dyn BoxedComponent>,
    },

    /// Detaches and drops a component.
    Remove {
        /// Target entity.
        entity: EntityId,
        /// Monomorphized remover for the component type.
        remove: fn(&mut World, EntityId),
    },
}

impl Command {
    /// Entity the command targets, or `None` for `Spawn`.
    pub fn target(&self) -> Option<EntityId> {
        match self {
            Command::Spawn { .. } => None,
            Command::Destroy { entity } | Command::Add { entity, .. } | Command::Remove { entity, .. } => Some(*entity),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Command::Spawn { .. } => "spawn",
            Command::Destroy { .. } => "destroy",
            Command::Add { .. } => "add",
            Command::Remove { .. } => "remove",
        }
    }

    /// Applies the command.
    ///
    /// Returns the new entity for `Spawn` and `None` otherwise.
    ///
    /// ## Errors
    /// [`EcsError::NoSuchEntity`] if the target entity is not live.

    pub fn apply(self, world: &mut World) -> EcsResult<Option<EntityId>> {
        if let Some(entity) = self.target() {
            if !world.contains(entity) {
                return Err(EcsError::NoSuchEntity(entity));
            }
        }

        match self {
            Command::Spawn { bundle } => Ok(Some(world.spawn(bundle))),
            Command::Destroy { entity } => world.try_destroy_entity(entity).map(|()| None),
            Command::Add { entity, component } => {
                component.insert_into(world, entity);
                Ok(None)
            }
            Command::Remove { entity, remove } => {
                remove(world, entity);
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Spawn { bundle } => f.debug_struct("Spawn").field("bundle", bundle).finish(),
            Command::Destroy { entity } => f.debug_struct("Destroy").field("entity", entity).finish(),
            Command::Add { entity, component } => f
                .debug_struct("Add")
                .field("entity", entity)
                .field("component", &component.type_name())
                .finish(),
            Command::Remove { entity, .. } => f.debug_struct("Remove").field("entity", entity).finish(),
        }
    }
}

/// Outcome of applying a [`CommandQueue`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Commands that took effect.
    pub applied: usize,

    /// Commands skipped because their target entity was no longer live.
    pub skipped: usize,

    /// Entities created by `Spawn` commands, in order.
    pub spawned: Vec<EntityId>,
}

impl ApplyReport {
    /// Folds `other` into `self`.
    pub fn merge(&mut self, other: ApplyReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.spawned.extend(other.spawned);
    }
}

/// Ordered buffer of deferred commands.
///
/// ## Example
/// ```
/// use archetype_ecs::{CommandQueue, World};
///
/// struct Ttl(u32);
///
/// let mut world = World::new();
/// for ttl in 0..4 {
///     let e = world.create_entity();
///     world.add(e, Ttl(ttl));
/// }
///
/// let mut queue = CommandQueue::new();
/// world.run_indexed::<_, (&Ttl,)>(&mut queue, |queue, entities, (ttls,)| {
///     for (entity, ttl) in entities.iter().zip(ttls) {
///         if ttl.0 == 0 {
///             queue.destroy(*entity);
///         }
///     }
/// });
///
/// let report = queue.apply(&mut world);
/// assert_eq!(report.applied, 1);
/// assert_eq!(world.len(), 3);
/// ```

#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `command`.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Records the creation of an entity carrying `bundle`.
    pub fn spawn(&mut self, bundle: Bundle) {
        self.push(Command::Spawn { bundle });
    }

    /// Records the destruction of `entity`.
    pub fn destroy(&mut self, entity: EntityId) {
        self.push(Command::Destroy { entity });
    }

    /// Records attaching `value` to `entity`.
    pub fn add<T: Component>(&mut self, entity: EntityId, value: T) {
        self.push(Command::Add {
            entity,
            component: boxed(value),
        });
    }

    /// Records detaching the `T` of `entity`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        self.push(Command::Remove {
            entity,
            remove: remove_component::<T>,
        });
    }

    /// Number of recorded commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Discards every recorded command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Applies and drains every recorded command, in record order.
    pub fn apply(&mut self, world: &mut World) -> ApplyReport {
        let mut report = ApplyReport::default();

        for command in self.commands.drain(..) {
            let kind = command.kind();
            match command.apply(world) {
                Ok(spawned) => {
                    report.applied += 1;
                    report.spawned.extend(spawned);
                }
                Err(error) => {
                    report.skipped += 1;
                    log::debug!("skipped deferred {kind} command: {error}");
                }
            }
        }

        if report.applied + report.skipped > 0 {
            log::trace!("applied {} deferred commands, skipped {}", report.applied, report.skipped);
        }
        report
    }
}
