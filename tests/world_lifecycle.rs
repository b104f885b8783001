mod common;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use archetype_ecs::engine::archetype::EMPTY_ARCHETYPE;
use archetype_ecs::{EcsError, World, WorldConfig};

use common::*;

#[test]
fn position_velocity_add_remove_scenario() {
    init_logging();
    let mut world = World::new();

    let e1 = world.create_entity();
    world.add(e1, Position { x: 1.0, y: 2.0 });
    world.add(e1, Velocity { x: 3.0, y: 4.0 });

    assert_eq!(*world.get::<Position>(e1), Position { x: 1.0, y: 2.0 });
    assert_eq!(*world.get::<Velocity>(e1), Velocity { x: 3.0, y: 4.0 });

    world.remove::<Velocity>(e1);

    assert!(!world.has::<Velocity>(e1));
    assert!(world.has::<Position>(e1));
    assert_eq!(*world.get::<Position>(e1), Position { x: 1.0, y: 2.0 });
}

#[test]
fn has_reflects_net_component_set() {
    let mut world = World::new();
    let e = world.create_entity();

    assert!(!world.has::<A>(e));

    world.add(e, A(1));
    world.add(e, B(2));
    world.add(e, C(3));
    world.remove::<B>(e);
    world.add(e, B(4));
    world.remove::<A>(e);
    world.remove::<C>(e);
    world.add(e, C(5));

    assert!(!world.has::<A>(e));
    assert!(world.has::<B>(e));
    assert!(world.has::<C>(e));
    assert_eq!(world.get::<B>(e).0, 4);
    assert_eq!(world.get::<C>(e).0, 5);
}

#[test]
fn add_returns_stored_value_and_keeps_previous_components() {
    let mut world = World::new();
    let e = world.create_entity();

    world.add(e, Name("scout".to_string()));
    world.add(e, Health(70));

    let stored = world.add(e, Position { x: -1.5, y: 8.0 });
    stored.x = 0.5;

    assert_eq!(*world.get::<Position>(e), Position { x: 0.5, y: 8.0 });
    assert_eq!(world.get::<Name>(e).0, "scout");
    assert_eq!(*world.get::<Health>(e), Health(70));
}

#[test]
fn adding_an_existing_component_replaces_in_place() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add(e, Health(1));
    world.add(e, A(9));

    let before = world.location(e).unwrap();
    let archetypes_before = world.archetypes().len();

    world.add(e, Health(2));

    assert_eq!(world.location(e).unwrap(), before);
    assert_eq!(world.archetypes().len(), archetypes_before);
    assert_eq!(*world.get::<Health>(e), Health(2));
    assert_eq!(*world.get::<A>(e), A(9));
}

#[test]
fn removing_an_absent_component_is_a_no_op() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add(e, A(1));

    let before = world.location(e).unwrap();

    world.remove::<B>(e);
    world.register::<C>();
    world.remove::<C>(e);

    assert_eq!(world.location(e).unwrap(), before);
    assert_eq!(*world.get::<A>(e), A(1));
}

#[test]
fn removing_the_last_component_keeps_the_entity_alive() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add(e, A(1));
    world.remove::<A>(e);

    assert!(world.contains(e));
    assert_eq!(world.location(e).unwrap().archetype, EMPTY_ARCHETYPE);

    world.add(e, B(3));
    assert_eq!(*world.get::<B>(e), B(3));
}

#[test]
fn ids_are_never_reused() {
    let mut world = World::new();
    let first = world.create_entity();
    world.destroy_entity(first);

    let mut seen = vec![first];
    for _ in 0..32 {
        let e = world.new_entity();
        assert!(!seen.contains(&e));
        seen.push(e);
        if e.to_raw() % 2 == 0 {
            world.destroy_entity(e);
        }
    }
}

#[test]
fn destroying_fixes_the_swapped_entity() {
    let mut world = World::new();
    let entities: Vec<_> = (0..4)
        .map(|i| {
            let e = world.create_entity();
            world.add(e, Health(i));
            world.add(e, A(u64::from(i) * 10));
            e
        })
        .collect();

    world.destroy_entity(entities[0]);

    assert!(!world.contains(entities[0]));
    assert_eq!(world.len(), 3);
    for (i, &e) in entities.iter().enumerate().skip(1) {
        assert_eq!(*world.get::<Health>(e), Health(i as u32));
        assert_eq!(*world.get::<A>(e), A(i as u64 * 10));
    }

    // The last entity filled row 0.
    assert_eq!(world.location(entities[3]).unwrap().row, 0);
}

#[test]
fn migration_fixes_the_swapped_entity() {
    let mut world = World::new();
    let e1 = world.create_entity();
    let e2 = world.create_entity();
    world.add(e1, A(1));
    world.add(e2, A(2));

    world.add(e1, B(10));

    assert_eq!(world.location(e2).unwrap().row, 0);
    assert_eq!(*world.get::<A>(e2), A(2));
    assert_eq!(*world.get::<A>(e1), A(1));
    assert_eq!(*world.get::<B>(e1), B(10));
}

#[test]
#[should_panic(expected = "no such entity")]
fn destroying_a_missing_entity_panics() {
    let mut world = World::new();
    let e = world.create_entity();
    world.destroy_entity(e);
    world.destroy_entity(e);
}

#[test]
fn try_destroy_reports_missing_entity() {
    let mut world = World::new();
    let e = world.create_entity();

    assert_eq!(world.try_destroy_entity(e), Ok(()));
    assert_eq!(world.try_destroy_entity(e), Err(EcsError::NoSuchEntity(e)));
}

#[test]
#[should_panic(expected = "has no component")]
fn get_of_missing_component_panics() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add(e, A(1));
    world.register::<B>();
    world.get::<B>(e);
}

#[test]
fn try_get_reports_absence() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add(e, A(1));

    assert_eq!(world.try_get::<A>(e), Some(&A(1)));
    assert_eq!(world.try_get::<B>(e), None);

    if let Some(a) = world.try_get_mut::<A>(e) {
        a.0 = 7;
    }
    assert_eq!(*world.get::<A>(e), A(7));
    assert!(world.try_get_mut::<B>(e).is_none());

    world.destroy_entity(e);
    assert_eq!(world.try_get::<A>(e), None);
    assert!(!world.has::<A>(e));
}

#[test]
fn values_are_dropped_exactly_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut world = World::new();

    // Migration moves, removal drops.
    let e1 = world.create_entity();
    world.add(e1, DropCounter::new(&counter));
    world.add(e1, Position { x: 0.0, y: 0.0 });
    world.add(e1, Velocity { x: 0.0, y: 0.0 });
    world.remove::<Position>(e1);
    assert_eq!(drops(&counter), 0);
    world.remove::<DropCounter>(e1);
    assert_eq!(drops(&counter), 1);

    // Destruction drops.
    let e2 = world.create_entity();
    world.add(e2, DropCounter::new(&counter));
    world.destroy_entity(e2);
    assert_eq!(drops(&counter), 2);

    // Replacement drops the old value only.
    let e3 = world.create_entity();
    world.add(e3, DropCounter::new(&counter));
    world.add(e3, DropCounter::new(&counter));
    assert_eq!(drops(&counter), 3);

    // Dropping the world drops what is left.
    drop(world);
    assert_eq!(drops(&counter), 4);
}

#[test]
fn config_controls_array_base_capacity() {
    let config = WorldConfig::default()
        .with_array_base_capacity(4)
        .with_entity_capacity_hint(64);
    let mut world = World::with_config(config);
    assert_eq!(world.config().array_base_capacity, 4);

    let e = world.create_entity();
    world.add(e, A(1));

    let archetype = world.location(e).unwrap().archetype;
    let arrays = world.archetypes().get(archetype).arrays();
    assert_eq!(arrays.len(), 1);
    assert_eq!(arrays[0].capacity(), 4);

    for i in 0..4 {
        let e = world.create_entity();
        world.add(e, A(i));
    }
    let arrays = world.archetypes().get(archetype).arrays();
    assert_eq!(arrays[0].capacity(), 8);
}

#[test]
fn archetypes_are_reused_across_entities() {
    let mut world = World::new();
    for i in 0..10 {
        let e = world.create_entity();
        world.add(e, A(i));
        world.add(e, B(i as u32));
    }

    // Empty, {A}, {A, B}.
    assert_eq!(world.archetypes().len(), 3);
    assert_eq!(world.count::<(A, B)>(), 10);
    assert_eq!(world.count::<(A,)>(), 10);
}

#[test]
fn transition_edges_are_cached_both_ways() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add(e, A(1));
    let with_a = world.location(e).unwrap().archetype;
    world.add(e, B(2));
    let with_ab = world.location(e).unwrap().archetype;

    let b = world.registry().id_of::<B>().unwrap();
    let archetypes = world.archetypes();
    assert_eq!(archetypes.get(with_a).add_edge(b), Some(with_ab));
    assert_eq!(archetypes.get(with_ab).remove_edge(b), Some(with_a));

    world.remove::<B>(e);
    assert_eq!(world.location(e).unwrap().archetype, with_a);
}

#[test]
fn column_order_follows_transition_history() {
    let mut world = World::new();

    let e1 = world.create_entity();
    world.add(e1, A(1));
    world.add(e1, B(2));

    let e2 = world.create_entity();
    world.add(e2, B(3));
    world.add(e2, C(4));
    world.add(e2, A(5));
    world.remove::<C>(e2);

    // Both ended up with {A, B} and share one archetype.
    assert_eq!(world.location(e1).unwrap().archetype, world.location(e2).unwrap().archetype);
    assert_eq!(*world.get::<A>(e2), A(5));
    assert_eq!(*world.get::<B>(e2), B(3));
}
