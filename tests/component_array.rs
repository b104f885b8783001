mod common;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use archetype_ecs::engine::storage::{ComponentArray, TypeErasedArray};
use archetype_ecs::engine::types::{ComponentId, DEFAULT_ARRAY_CAPACITY};

use common::*;

fn id(index: usize) -> ComponentId {
    ComponentId::from_index(index)
}

#[test]
fn swap_remove_moves_last_row_into_the_hole() {
    let mut array = ComponentArray::<Health>::new(id(0));
    for hp in [10, 20, 30, 40] {
        array.emplace(Health(hp));
    }

    let (removed, moved_from) = array.swap_remove(1);

    assert_eq!(removed, Health(20));
    assert_eq!(moved_from, Some(3));
    assert_eq!(array.len(), 3);
    assert_eq!(array.as_slice(), &[Health(10), Health(40), Health(30)]);
}

#[test]
fn removing_the_last_row_only_shrinks() {
    let mut array = ComponentArray::<Health>::new(id(0));
    for hp in [1, 2, 3] {
        array.emplace(Health(hp));
    }

    assert_eq!(array.remove(2), None);
    assert_eq!(array.as_slice(), &[Health(1), Health(2)]);
}

#[test]
fn capacity_starts_at_base_and_doubles() {
    let mut array = ComponentArray::<A>::new(id(0));
    assert_eq!(array.capacity(), 0);

    array.emplace(A(0));
    assert_eq!(array.capacity(), DEFAULT_ARRAY_CAPACITY);

    for i in 1..16 {
        array.emplace_with(|| A(i));
    }
    assert_eq!(array.capacity(), 16);

    array.emplace(A(16));
    assert_eq!(array.capacity(), 32);
    assert_eq!(array.len(), 17);

    // Removing never shrinks.
    while !array.is_empty() {
        array.remove(0);
    }
    assert_eq!(array.capacity(), 32);
}

#[test]
fn custom_base_capacity_is_honoured() {
    let mut array = ComponentArray::<A>::with_base_capacity(id(0), 3);
    array.emplace(A(1));
    assert_eq!(array.capacity(), 3);
    for i in 0..3 {
        array.emplace(A(i));
    }
    assert_eq!(array.capacity(), 6);
}

#[test]
fn raw_insert_copies_plain_data() {
    let mut array = ComponentArray::<Position>::new(id(0));
    let value = Position { x: 1.25, y: -3.0 };

    let row = array.insert_bytes(bytemuck::bytes_of(&value));

    assert_eq!(row, 0);
    assert_eq!(*array.at(0), value);
    assert_eq!(array.row_bytes(0), bytemuck::bytes_of(&value));
    assert_eq!(array.bytes().len(), array.element_size());
}

#[test]
#[should_panic(expected = "non-matching size")]
fn raw_insert_of_wrong_size_panics() {
    let mut array = ComponentArray::<Position>::new(id(0));
    array.insert_bytes(&[0u8; 4]);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn out_of_bounds_access_panics() {
    let mut array = ComponentArray::<A>::new(id(0));
    array.emplace(A(1));
    array.at(1);
}

#[test]
fn transfer_moves_without_dropping() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut source = ComponentArray::<DropCounter>::new(id(2));
    source.emplace(DropCounter::new(&counter));
    source.emplace(DropCounter::new(&counter));

    let mut destination = source.new_empty();
    assert_eq!(destination.component_id(), id(2));

    let (row, moved_from) = destination.push_from_dyn(&mut source, 0);

    assert_eq!(row, 0);
    assert_eq!(moved_from, Some(1));
    assert_eq!(source.len(), 1);
    assert_eq!(destination.len(), 1);
    assert_eq!(drops(&counter), 0);

    destination.remove_dyn(0);
    assert_eq!(drops(&counter), 1);

    drop(source);
    assert_eq!(drops(&counter), 2);
}

#[test]
#[should_panic(expected = "cannot move")]
fn transfer_between_element_types_panics() {
    let mut source = ComponentArray::<A>::new(id(0));
    source.emplace(A(1));
    let mut destination = ComponentArray::<B>::new(id(1));
    destination.push_from_dyn(&mut source, 0);
}

#[test]
fn erased_view_reports_element_metadata() {
    let array: Box<dyn TypeErasedArray> = Box::new(ComponentArray::<Velocity>::new(id(5)));

    assert_eq!(array.element_size(), std::mem::size_of::<Velocity>());
    assert!(array.element_type_name().ends_with("Velocity"));
    assert!(array.is_empty());
    assert!(array.as_any().downcast_ref::<ComponentArray<Velocity>>().is_some());
    assert!(array.as_any().downcast_ref::<ComponentArray<Position>>().is_none());
}
