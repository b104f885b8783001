//! # Component Registry
//!
//! This module assigns a compact [`ComponentId`] (a single bit, positions
//! 0–63) to every Rust type used as a component and keeps the per-type
//! metadata needed to allocate archetype arrays for it.
//!
//! ## Purpose
//! The registry decouples component type information (`TypeId`, name, size,
//! alignment) from runtime storage, so archetypes can hold heterogeneous
//! arrays behind [`TypeErasedArray`].
//!
//! ## Design
//! - Ids are assigned lazily and sequentially on first use of a type.
//! - The registry is an explicit object owned by each [`World`](crate::World),
//!   so independent worlds (and tests) have isolated type spaces.
//! - A per-component factory is stored for constructing empty arrays.
//! - The registry can be `freeze()`d to reject new types after setup.
//!
//! ## Invariants
//! - At most [`MAX_COMPONENTS`] types are registered; the 65th is fatal.
//! - Ids are unique and stable for the lifetime of the registry.
//! - `by_id[id.index()]` describes the type registered under `id`.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::mem::{align_of, size_of};

use crate::engine::error::{EcsError, EcsResult};
use crate::engine::storage::{ComponentArray, TypeErasedArray};
use crate::engine::types::{ComponentId, ComponentMask, MAX_COMPONENTS};

/// Marker for types that can be stored as components.
///
/// Implemented for every `'static + Send + Sync` type.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// Factory function for constructing an empty type-erased component array.
type FactoryFn = fn(ComponentId, usize) -> Box<dyn TypeErasedArray>;

fn new_component_array<T: Component>(component_id: ComponentId, base_capacity: usize) -> Box<dyn TypeErasedArray> {
    Box::new(ComponentArray::<T>::with_base_capacity(component_id, base_capacity))
}

/// Describes a registered component type.
///
/// ## Fields
/// - `component_id`: identifier assigned by the registry.
/// - `name`: the Rust type name (`type_name::<T>()`).
/// - `type_id`: the runtime `TypeId`.
/// - `size` / `align`: memory layout of one value.

#[derive(Clone, Copy, Debug)]
pub struct ComponentDesc {
    /// Runtime identifier assigned to this component type.
    pub component_id: ComponentId,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component.
    pub type_id: TypeId,

    /// Size of the component type in bytes.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,

    factory: FactoryFn,
}

impl ComponentDesc {
    fn of<T: Component>(component_id: ComponentId) -> Self {
        Self {
            component_id,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            factory: new_component_array::<T>,
        }
    }

    /// Creates an empty array for this component type.
    pub fn new_array(&self, base_capacity: usize) -> Box<dyn TypeErasedArray> {
        (self.factory)(self.component_id, base_capacity)
    }
}

impl fmt::Display for ComponentDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ComponentDesc {{ id: {}, name: {}, size: {}, align: {} }}",
            self.component_id, self.name, self.size, self.align
        )
    }
}

/// Mapping between Rust component types and [`ComponentId`] bit positions.
///
/// ## Design
/// - `by_type` maps `TypeId -> ComponentId`.
/// - `by_id` stores descriptors in registration order, so
///   `by_id[id.index()]` is the descriptor of `id`.
/// - `frozen` rejects further registrations.

#[derive(Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentId>,
    by_id: Vec<ComponentDesc>,
    frozen: bool,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` if needed and returns its id.
    ///
    /// ## Errors
    /// - [`EcsError::RegistryFrozen`] if `T` is new and the registry is frozen.
    /// - [`EcsError::ComponentLimit`] if `T` would be the 65th component type.

    pub fn try_register<T: Component>(&mut self) -> EcsResult<ComponentId> {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }

        if self.frozen {
            return Err(EcsError::RegistryFrozen { name: type_name::<T>() });
        }
        if self.by_id.len() >= MAX_COMPONENTS {
            return Err(EcsError::ComponentLimit { name: type_name::<T>() });
        }

        let component_id = ComponentId::from_index(self.by_id.len());
        self.by_type.insert(type_id, component_id);
        self.by_id.push(ComponentDesc::of::<T>(component_id));

        log::debug!("registered component `{}` as {}", type_name::<T>(), component_id);
        Ok(component_id)
    }

    /// Registers `T` if needed and returns its id.
    ///
    /// ## Panics
    /// Panics if the registry is frozen or already holds 64 component types.

    pub fn register<T: Component>(&mut self) -> ComponentId {
        match self.try_register::<T>() {
            Ok(component_id) => component_id,
            Err(error) => panic!("{error}"),
        }
    }

    /// Returns the id of `T`, if registered.
    #[inline]
    pub fn id_of<T: 'static>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the id associated with a runtime `TypeId`, if registered.
    #[inline]
    pub fn id_of_type_id(&self, type_id: TypeId) -> Option<ComponentId> {
        self.by_type.get(&type_id).copied()
    }

    /// Returns the descriptor for `component_id`, if registered.
    #[inline]
    pub fn describe(&self, component_id: ComponentId) -> Option<&ComponentDesc> {
        self.by_id.get(component_id.index())
    }

    /// Registers every type of `S` and returns the union of their ids.
    pub fn mask_of<S: ComponentSet>(&mut self) -> ComponentMask {
        S::register(self)
    }

    /// Union of the ids of `S`, or `None` if any of its types is unregistered.
    pub fn lookup_mask<S: ComponentSet>(&self) -> Option<ComponentMask> {
        S::lookup(self)
    }

    /// Rejects registration of any new component type from now on.
    pub fn freeze(&mut self) {
        self.frozen = true;
        log::debug!("component registry frozen with {} types", self.by_id.len());
    }

    /// Returns `true` if the registry has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no type has been registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDesc> {
        self.by_id.iter()
    }
}

/// A statically known set of component types, used to build signatures.
///
/// Implemented for tuples of one to eight component types:
///
/// ```
/// use archetype_ecs::engine::component::ComponentRegistry;
///
/// struct Position;
/// struct Velocity;
///
/// let mut registry = ComponentRegistry::new();
/// let both = registry.mask_of::<(Position, Velocity)>();
/// let position = registry.mask_of::<(Position,)>();
/// assert!(both.has(position));
/// assert_eq!(both.len(), 2);
/// ```

pub trait ComponentSet {
    /// Registers every member type and returns the union of their ids.
    fn register(registry: &mut ComponentRegistry) -> ComponentMask;

    /// Union of the member ids, or `None` if any member is unregistered.
    fn lookup(registry: &ComponentRegistry) -> Option<ComponentMask>;
}

macro_rules! impl_component_set {
    ($($T:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            fn register(registry: &mut ComponentRegistry) -> ComponentMask {
                ComponentMask::EMPTY $(| registry.register::<$T>().mask())+
            }

            fn lookup(registry: &ComponentRegistry) -> Option<ComponentMask> {
                Some(ComponentMask::EMPTY $(| registry.id_of::<$T>()?.mask())+)
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
