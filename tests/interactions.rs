mod common;

use std::collections::BTreeSet;

use archetype_ecs::{CommandQueue, EntityId, World};

use common::*;

fn unordered(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn pairs_of(world: &World) -> Vec<(EntityId, EntityId)> {
    let mut pairs = Vec::new();
    world.run_interactions::<_, (Collider,)>(&mut pairs, |pairs, a, b| pairs.push((a, b)));
    pairs
}

#[test]
fn three_entities_give_three_distinct_pairs() {
    init_logging();
    let mut world = World::new();
    let entities: Vec<_> = (0..3)
        .map(|i| {
            let e = world.create_entity();
            world.add(e, Collider { radius: i as f32 });
            e
        })
        .collect();

    let pairs = pairs_of(&world);

    assert_eq!(pairs.len(), 3);
    assert!(pairs.iter().all(|(a, b)| a != b));

    let unique: BTreeSet<_> = pairs.iter().map(|&(a, b)| unordered(a, b)).collect();
    let expected: BTreeSet<_> = [
        (entities[0], entities[1]),
        (entities[0], entities[2]),
        (entities[1], entities[2]),
    ]
    .into_iter()
    .collect();
    assert_eq!(unique, expected);
}

#[test]
fn pairs_span_archetypes_and_ignore_non_matching_entities() {
    let mut world = World::new();

    let plain = world.create_entity();
    world.add(plain, Collider { radius: 1.0 });

    let with_a = world.create_entity();
    world.add(with_a, Collider { radius: 1.0 });
    world.add(with_a, A(1));

    let with_b = world.create_entity();
    world.add(with_b, B(1));
    world.add(with_b, Collider { radius: 1.0 });

    let bystander = world.create_entity();
    world.add(bystander, A(2));

    let pairs = pairs_of(&world);

    assert_eq!(pairs.len(), 3);
    assert!(pairs.iter().all(|&(a, b)| a != bystander && b != bystander));
}

#[test]
fn every_unordered_pair_is_visited_once() {
    let mut world = World::new();
    let n = 12;
    for i in 0..n {
        let e = world.create_entity();
        world.add(e, Collider { radius: 0.5 });
        match i % 3 {
            0 => {}
            1 => {
                world.add(e, A(0));
            }
            _ => {
                world.add(e, B(0));
            }
        }
    }

    let pairs = pairs_of(&world);
    let unique: BTreeSet<_> = pairs.iter().map(|&(a, b)| unordered(a, b)).collect();

    assert_eq!(pairs.len(), n * (n - 1) / 2);
    assert_eq!(unique.len(), pairs.len());
    assert!(pairs.iter().all(|(a, b)| a != b));
}

#[test]
fn fewer_than_two_entities_produce_no_pairs() {
    let mut world = World::new();
    assert!(pairs_of(&world).is_empty());

    let e = world.create_entity();
    world.add(e, Collider { radius: 1.0 });
    assert!(pairs_of(&world).is_empty());
}

#[test]
fn context_can_read_both_entities_and_defer_destruction() {
    struct Collisions<'a> {
        world: &'a World,
        commands: CommandQueue,
        hits: usize,
    }

    let mut world = World::new();
    let spawn = |world: &mut World, x: f32, radius: f32| {
        let e = world.create_entity();
        world.add(e, Position { x, y: 0.0 });
        world.add(e, Collider { radius });
        e
    };
    let a = spawn(&mut world, 0.0, 1.0);
    let b = spawn(&mut world, 1.5, 1.0);
    let far = spawn(&mut world, 100.0, 1.0);

    let mut commands = {
        let mut ctx = Collisions {
            world: &world,
            commands: CommandQueue::new(),
            hits: 0,
        };
        world.run_interactions::<_, (Position, Collider)>(&mut ctx, |ctx, first, second| {
            let p1 = ctx.world.get::<Position>(first);
            let p2 = ctx.world.get::<Position>(second);
            let reach = ctx.world.get::<Collider>(first).radius + ctx.world.get::<Collider>(second).radius;
            if (p1.x - p2.x).abs() < reach {
                ctx.hits += 1;
                ctx.commands.destroy(first);
                ctx.commands.destroy(second);
            }
        });
        assert_eq!(ctx.hits, 1);
        ctx.commands
    };

    let report = commands.apply(&mut world);

    assert_eq!(report.applied, 2);
    assert!(!world.contains(a));
    assert!(!world.contains(b));
    assert!(world.contains(far));
}
