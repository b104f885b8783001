//! System Abstractions
//!
//! A **system** is a unit of logic run once per step against the world. It
//! reads and writes component data through the dispatch methods of
//! [`World`] and records structural changes into a [`CommandQueue`] instead
//! of applying them mid-pass.
//!
//! ## Step model
//!
//! A [`Schedule`] runs its systems in registration order and then applies
//! the shared command queue once, the *step barrier*. Structural changes made
//! by one system are therefore invisible to later systems of the same step.
//! [`Schedule::run_with_barrier_per_system`] applies the queue after every
//! system instead.
//!
//! ## Function-backed systems
//!
//! [`FnSystem`] turns a named closure into a system without a dedicated type:
//!
//! ```
//! use archetype_ecs::{FnSystem, Schedule, World};
//!
//! struct Age(u32);
//!
//! let mut world = World::new();
//! let e = world.create_entity();
//! world.add(e, Age(0));
//!
//! let mut schedule = Schedule::new();
//! schedule.add_system(FnSystem::new("aging", |world, _commands| {
//!     world.run::<(&mut Age,)>(|(ages,)| {
//!         for age in ages {
//!             age.0 += 1;
//!         }
//!     });
//! }));
//!
//! schedule.run(&mut world);
//! assert_eq!(world.get::<Age>(e).0, 1);
//! ```

use crate::engine::commands::{ApplyReport, CommandQueue};
use crate::engine::world::World;

/// A unit of executable logic operating on the world.
pub trait System: Send {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Executes the system. Structural changes go into `commands`.
    fn run(&mut self, world: &mut World, commands: &mut CommandQueue);
}

/// A concrete [`System`] backed by a function or closure.
pub struct FnSystem<F>
where
    F: FnMut(&mut World, &mut CommandQueue) + Send,
{
    name: &'static str,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut World, &mut CommandQueue) + Send,
{
    /// Creates a new function-backed system.
    ///
    /// # Parameters
    /// - `name`: Human-readable name, useful for debugging.
    /// - `f`: The function or closure executed when the system runs.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, &mut CommandQueue) + Send,
{
    fn name(&self) -> &str {
        self.name
    }

    fn run(&mut self, world: &mut World, commands: &mut CommandQueue) {
        (self.f)(world, commands)
    }
}

/// Ordered list of systems sharing one command queue.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<Box<dyn System>>,
    commands: CommandQueue,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `system`; systems run in the order they were added.
    pub fn add_system(&mut self, system: impl System + 'static) -> &mut Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Number of systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if the schedule holds no system.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Names of the systems, in run order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|system| system.name())
    }

    /// Runs one step: every system in order, then the command queue.
    pub fn run(&mut self, world: &mut World) -> ApplyReport {
        for system in self.systems.iter_mut() {
            log::trace!("running system `{}`", system.name());
            system.run(world, &mut self.commands);
        }
        self.commands.apply(world)
    }

    /// Runs one step, applying the command queue after each system.
    pub fn run_with_barrier_per_system(&mut self, world: &mut World) -> ApplyReport {
        let mut report = ApplyReport::default();
        for system in self.systems.iter_mut() {
            log::trace!("running system `{}`", system.name());
            system.run(world, &mut self.commands);
            report.merge(self.commands.apply(world));
        }
        report
    }
}
