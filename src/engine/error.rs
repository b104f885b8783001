//! Error types for the recoverable edges of the store.
//!
//! The store distinguishes two classes of failure:
//!
//! * **Programmer errors** (missing entity, missing component through the
//!   unchecked accessor, out-of-bounds rows, raw inserts of the wrong size,
//!   a 65th component type). These panic; there is no recoverable path for
//!   them through the primary API.
//! * **Expected conditions** surfaced by the `try_*` twins of the primary API
//!   and by deferred command replay. These are modelled by [`EcsError`].
//!
//! Expected *absence* of a component (`has` / `try_get`) is not an error at
//! all and is reported through `bool` / `Option`.
//!
//! ## Example
//! ```
//! use archetype_ecs::{World, EcsError};
//!
//! let mut world = World::new();
//! let entity = world.create_entity();
//! world.destroy_entity(entity);
//!
//! match world.try_destroy_entity(entity) {
//!     Err(EcsError::NoSuchEntity(e)) => assert_eq!(e, entity),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```

use thiserror::Error;

use crate::engine::entity::EntityId;
use crate::engine::types::MAX_COMPONENTS;

/// Convenience result alias used across the crate.
pub type EcsResult<T> = Result<T, EcsError>;

/// Recoverable store failures.
///
/// ### Display
/// Messages are short, single-line and suitable for logs. `Debug` keeps the
/// full structure.

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The registry already holds [`MAX_COMPONENTS`] component types.
    #[error("cannot register `{name}`: all {MAX_COMPONENTS} component slots are in use")]
    ComponentLimit {
        /// Rust type name of the rejected component.
        name: &'static str,
    },

    /// The registry was frozen before this component type was first used.
    #[error("cannot register `{name}`: component registry is frozen")]
    RegistryFrozen {
        /// Rust type name of the rejected component.
        name: &'static str,
    },

    /// The entity was never created or has already been destroyed.
    #[error("no such entity: {0}")]
    NoSuchEntity(EntityId),
}
