//! Typed component queries over archetype storage.
//!
//! A query type names the components a dispatch wants and how it wants them:
//!
//! * `&T` yields a read-only span `&[T]` and items `&T`,
//! * `&mut T` yields a mutable span `&mut [T]` and items `&mut T`,
//! * tuples of up to eight queries yield tuples of spans and items.
//!
//! ```ignore
//! world.run::<(&mut Position, &Velocity)>(|(positions, velocities)| {
//!     for (p, v) in positions.iter_mut().zip(velocities) {
//!         p.x += v.x;
//!     }
//! });
//! ```
//!
//! ## Execution model
//! For every archetype whose signature is a superset of the query signature,
//! the dispatcher builds a [`Columns`] view over the archetype's arrays and
//! lets the query [`fetch`](ComponentQuery::fetch) its spans from it. Every
//! array can be fetched at most once per archetype, so two spans handed to one
//! callback never alias.
//!
//! ## Failure semantics
//! Naming the same component twice in one query is a programmer error and
//! panics before any archetype is visited.

use std::any::{type_name, TypeId};

use crate::engine::archetype::ComponentIndex;
use crate::engine::component::{Component, ComponentRegistry};
use crate::engine::storage::{ComponentArray, TypeErasedArray};
use crate::engine::types::{ArchetypeId, ComponentMask};

/// Component access declared by a query: the type and its name.
#[derive(Clone, Copy, Debug)]
pub struct Access {
    /// Runtime type of the component.
    pub type_id: TypeId,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Whether the query writes the component.
    pub mutable: bool,
}

/// A statically typed set of component accesses.
///
/// Implemented for `&T`, `&mut T` and tuples of up to eight queries.
pub trait ComponentQuery {
    /// What one archetype yields: slices over its matching arrays.
    type Span<'w>;

    /// What one row yields: references into those slices.
    type Item<'w>;

    /// Row-by-row iterator over a span.
    type Iter<'w>: Iterator<Item = Self::Item<'w>>;

    /// Appends the accesses of this query in fetch order.
    fn accesses(out: &mut Vec<Access>);

    /// Takes this query's spans out of `columns`.
    fn fetch<'w>(columns: &mut Columns<'w>) -> Self::Span<'w>;

    /// Iterates a span row by row.
    fn rows<'w>(span: Self::Span<'w>) -> Self::Iter<'w>;
}

/// Resolves the signature a query matches.
///
/// Returns `None` when some requested component has never been registered, in
/// which case no archetype can match.
///
/// ## Panics
/// Panics if the query names a component twice.

pub fn query_mask<Q: ComponentQuery>(registry: &ComponentRegistry) -> Option<ComponentMask> {
    let mut accesses = Vec::new();
    Q::accesses(&mut accesses);

    for (i, access) in accesses.iter().enumerate() {
        if accesses[..i].iter().any(|earlier| earlier.type_id == access.type_id) {
            panic!("component `{}` requested twice in one query", access.name);
        }
    }

    let mut mask = ComponentMask::EMPTY;
    for access in &accesses {
        mask.insert(registry.id_of_type_id(access.type_id)?);
    }
    Some(mask)
}

/// Per-archetype view the query fetches its spans from.
///
/// Each array slot can be taken once.
pub struct Columns<'w> {
    archetype_id: ArchetypeId,
    registry: &'w ComponentRegistry,
    index: &'w ComponentIndex,
    slots: Vec<Option<&'w mut Box<dyn TypeErasedArray>>>,
}

impl<'w> Columns<'w> {
    pub(crate) fn new(
        archetype_id: ArchetypeId,
        registry: &'w ComponentRegistry,
        index: &'w ComponentIndex,
        arrays: &'w mut [Box<dyn TypeErasedArray>],
    ) -> Self {
        Self {
            archetype_id,
            registry,
            index,
            slots: arrays.iter_mut().map(Some).collect(),
        }
    }

    /// Takes the array storing `T`.
    ///
    /// ## Panics
    /// Panics if `T` is not stored in this archetype or was already taken.

    pub fn take<T: Component>(&mut self) -> &'w mut ComponentArray<T> {
        let column = self
            .registry
            .id_of::<T>()
            .and_then(|component_id| self.index.column(component_id, self.archetype_id))
            .unwrap_or_else(|| panic!("archetype {} does not store `{}`", self.archetype_id, type_name::<T>()));

        let array = self.slots[column]
            .take()
            .unwrap_or_else(|| panic!("component `{}` requested twice in one query", type_name::<T>()));

        array
            .as_any_mut()
            .downcast_mut::<ComponentArray<T>>()
            .unwrap_or_else(|| panic!("column {column} does not store `{}`", type_name::<T>()))
    }
}

impl<'a, T: Component> ComponentQuery for &'a T {
    type Span<'w> = &'w [T];
    type Item<'w> = &'w T;
    type Iter<'w> = std::slice::Iter<'w, T>;

    fn accesses(out: &mut Vec<Access>) {
        out.push(Access {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            mutable: false,
        });
    }

    fn fetch<'w>(columns: &mut Columns<'w>) -> Self::Span<'w> {
        columns.take::<T>().as_slice()
    }

    fn rows<'w>(span: Self::Span<'w>) -> Self::Iter<'w> {
        span.iter()
    }
}

impl<'a, T: Component> ComponentQuery for &'a mut T {
    type Span<'w> = &'w mut [T];
    type Item<'w> = &'w mut T;
    type Iter<'w> = std::slice::IterMut<'w, T>;

    fn accesses(out: &mut Vec<Access>) {
        out.push(Access {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            mutable: true,
        });
    }

    fn fetch<'w>(columns: &mut Columns<'w>) -> Self::Span<'w> {
        columns.take::<T>().as_mut_slice()
    }

    fn rows<'w>(span: Self::Span<'w>) -> Self::Iter<'w> {
        span.iter_mut()
    }
}

/// Lock-step iterator over a tuple of row iterators.
///
/// Every span of one archetype has the same length, so the iterators run out
/// together.
pub struct RowIter<I>(I);

macro_rules! impl_component_query {
    ($($Q:ident),+) => {
        impl<$($Q: ComponentQuery),+> ComponentQuery for ($($Q,)+) {
            type Span<'w> = ($($Q::Span<'w>,)+);
            type Item<'w> = ($($Q::Item<'w>,)+);
            type Iter<'w> = RowIter<($($Q::Iter<'w>,)+)>;

            fn accesses(out: &mut Vec<Access>) {
                $($Q::accesses(out);)+
            }

            fn fetch<'w>(columns: &mut Columns<'w>) -> Self::Span<'w> {
                ($($Q::fetch(columns),)+)
            }

            #[allow(non_snake_case)]
            fn rows<'w>(span: Self::Span<'w>) -> Self::Iter<'w> {
                let ($($Q,)+) = span;
                RowIter(($($Q::rows($Q),)+))
            }
        }

        impl<$($Q: Iterator),+> Iterator for RowIter<($($Q,)+)> {
            type Item = ($($Q::Item,)+);

            #[allow(non_snake_case)]
            fn next(&mut self) -> Option<Self::Item> {
                let ($($Q,)+) = &mut self.0;
                Some(($($Q.next()?,)+))
            }
        }
    };
}

impl_component_query!(A);
impl_component_query!(A, B);
impl_component_query!(A, B, C);
impl_component_query!(A, B, C, D);
impl_component_query!(A, B, C, D, E);
impl_component_query!(A, B, C, D, E, F);
impl_component_query!(A, B, C, D, E, F, G);
impl_component_query!(A, B, C, D, E, F, G, H);
