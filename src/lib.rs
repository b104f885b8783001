//! # archetype_ecs
//!
//! Archetype-based Entity-Component-System store for real-time simulations
//! and games.
//!
//! ## Design Goals
//! - Entities with the same component signature share contiguous arrays
//! - Cache-friendly bulk dispatch over typed component spans
//! - Structural changes deferred to explicit barriers
//! - Safe, explicit data access
//!
//! ## Quick start
//! ```rust
//! use archetype_ecs::prelude::*;
//!
//! struct Position(f32, f32);
//! struct Velocity(f32, f32);
//!
//! let mut world = World::new();
//! let e = world.create_entity();
//! world.add(e, Position(0.0, 0.0));
//! world.add(e, Velocity(1.0, 2.0));
//!
//! world.run_each::<_, (&mut Position, &Velocity)>(&mut (), |_, (p, v)| {
//!     p.0 += v.0;
//!     p.1 += v.1;
//! });
//!
//! assert_eq!(world.get::<Position>(e).1, 2.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(dead_code)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::world::World;

pub use engine::config::WorldConfig;

pub use engine::entity::{
    EntityId,
    EntityRecord,
};

pub use engine::component::{
    Component,
    ComponentRegistry,
    ComponentSet,
};

pub use engine::query::ComponentQuery;

pub use engine::commands::{
    ApplyReport,
    Bundle,
    Command,
    CommandQueue,
};

pub use engine::systems::{
    FnSystem,
    Schedule,
    System,
};

pub use engine::error::{
    EcsError,
    EcsResult,
};

pub use engine::types::{
    ArchetypeId,
    ComponentId,
    ComponentMask,
    MAX_COMPONENTS,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use archetype_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Bundle,
        CommandQueue,
        EntityId,
        FnSystem,
        Schedule,
        System,
        World,
        WorldConfig,
    };
}
