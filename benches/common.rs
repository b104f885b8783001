#![allow(dead_code)]

use archetype_ecs::{Bundle, CommandQueue, World};

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Health {
    pub value: f32,
}

#[derive(Clone, Copy)]
pub struct Collider {
    pub radius: f32,
}

/// Builds a world of `agent_count` moving entities through the deferred
/// spawn path; every third also carries `Health`.
pub fn setup_world(agent_count: usize) -> World {
    let mut world = World::new();
    let mut commands = CommandQueue::new();

    for i in 0..agent_count {
        let mut bundle = Bundle::new()
            .with(Position { x: i as f32, y: 0.0 })
            .with(Velocity { x: 1.0, y: 0.5 });
        if i % 3 == 0 {
            bundle.push(Health { value: 100.0 });
        }
        commands.spawn(bundle);
    }

    commands.apply(&mut world);
    world
}
