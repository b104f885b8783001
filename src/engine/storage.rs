//! Component array storage and type-erased column access.
//!
//! This module implements [`ComponentArray<T>`], a dense, contiguous container
//! for the values of exactly one component type, and [`TypeErasedArray`], the
//! small capability interface archetypes use to manage heterogeneous arrays
//! behind `Box<dyn TypeErasedArray>`.
//!
//! # Storage model
//!
//! Values are stored densely in a single growable buffer, rows `0..len`, with
//! no gaps. The logical capacity starts at zero, jumps to a base capacity on
//! the first insertion and doubles on every overflow afterwards. It never
//! shrinks.
//!
//! # Core operations
//!
//! - **Append**: `emplace` constructs one value at the next free row.
//! - **Raw append**: `insert_bytes` copies one plain-old-data value from a
//!   byte slice whose length must equal the element size.
//! - **Remove**: `swap_remove` moves the value at a row out in `O(1)` by filling
//!   the hole with the last row. Removing the last row only shortens the array.
//! - **Transfer**: `push_from_dyn` moves a row from one array into another of
//!   the same type; the value is moved, never dropped twice.
//!
//! # Destruction
//!
//! Destruction logic is the component type's own `Drop`. A value is destroyed
//! exactly once: when it is removed with [`ComponentArray::remove`] /
//! [`TypeErasedArray::remove_dyn`], or when the array itself is dropped. Values
//! moved into another array through `swap_remove` or `push_from_dyn` are not
//! destroyed.
//!
//! # Failure semantics
//!
//! Out-of-bounds rows, raw inserts of the wrong size and transfers between
//! arrays of different element types are programmer errors and panic.

use std::any::{type_name, Any};
use std::mem::size_of;

use bytemuck::Pod;

use crate::engine::component::Component;
use crate::engine::types::{ComponentId, Row, DEFAULT_ARRAY_CAPACITY};

/// A type-erased interface over a [`ComponentArray<T>`].
///
/// Archetypes hold their arrays as `Box<dyn TypeErasedArray>` and only need
/// the element type when handing out typed slices, which goes through
/// [`as_any`](TypeErasedArray::as_any) downcasting.
///
/// # Downcasting
/// ```
/// use archetype_ecs::engine::storage::{ComponentArray, TypeErasedArray};
/// use archetype_ecs::engine::types::ComponentId;
///
/// let erased: Box<dyn TypeErasedArray> = Box::new(ComponentArray::<f32>::new(ComponentId::from_index(0)));
/// let typed = erased.as_any().downcast_ref::<ComponentArray<f32>>().unwrap();
/// assert!(typed.is_empty());
/// ```

pub trait TypeErasedArray: Any + Send + Sync {
    /// Component stored by this array.
    fn component_id(&self) -> ComponentId;

    /// Size in bytes of one element.
    fn element_size(&self) -> usize;

    /// Human-readable name of the element type.
    fn element_type_name(&self) -> &'static str;

    /// Number of occupied rows.
    fn len(&self) -> usize;

    /// Returns `true` if no row is occupied.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical capacity in elements.
    fn capacity(&self) -> usize;

    /// Immutable reference for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable reference for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Creates an empty array of the same element type and growth policy.
    fn new_empty(&self) -> Box<dyn TypeErasedArray>;

    /// Swap-removes `row` and destroys its value.
    ///
    /// Returns the row whose value was moved into `row`, or `None` if `row`
    /// was the last row.
    fn remove_dyn(&mut self, row: Row) -> Option<Row>;

    /// Moves the value at `row` of `source` to the end of `self`.
    ///
    /// `source` is swap-removed without destroying the moved value. Returns
    /// the destination row and the source row that was moved into `row`, if
    /// any.
    ///
    /// ## Panics
    /// Panics if `source` stores a different element type or `row` is out of
    /// bounds.
    fn push_from_dyn(&mut self, source: &mut dyn TypeErasedArray, row: Row) -> (Row, Option<Row>);
}

/// Dense, growable storage for the values of one component type.
///
/// ## Invariants
/// - `values.len() <= capacity`
/// - `capacity` is `0` or `base_capacity * 2^k`

pub struct ComponentArray<T> {
    component_id: ComponentId,
    base_capacity: usize,
    capacity: usize,
    values: Vec<T>,
}

impl<T: Component> ComponentArray<T> {
    /// Creates an empty array using the default base capacity.
    pub fn new(component_id: ComponentId) -> Self {
        Self::with_base_capacity(component_id, DEFAULT_ARRAY_CAPACITY)
    }

    /// Creates an empty array that grows to `base_capacity` on first insert.
    pub fn with_base_capacity(component_id: ComponentId, base_capacity: usize) -> Self {
        Self {
            component_id,
            base_capacity: base_capacity.max(1),
            capacity: 0,
            values: Vec::new(),
        }
    }

    #[inline]
    fn grow(&mut self) {
        let new_capacity = if self.capacity == 0 {
            self.base_capacity
        } else {
            self.capacity * 2
        };
        self.values.reserve_exact(new_capacity - self.values.len());
        self.capacity = new_capacity;
    }

    #[inline]
    fn check_row(&self, row: Row) {
        assert!(
            row < self.values.len(),
            "ComponentArray<{}> access out of bounds (row = {}, len = {})",
            type_name::<T>(),
            row,
            self.values.len()
        );
    }

    /// Appends `value` and returns its row.
    pub fn emplace(&mut self, value: T) -> Row {
        if self.values.len() == self.capacity {
            self.grow();
        }
        let row = self.values.len();
        self.values.push(value);
        row
    }

    /// Appends the value produced by `construct` and returns its row.
    pub fn emplace_with(&mut self, construct: impl FnOnce() -> T) -> Row {
        self.emplace(construct())
    }

    /// Moves the value at `row` out of the array.
    ///
    /// The last row's value fills the hole; the returned `Option` names the row
    /// it came from, or is `None` when `row` was already the last row.
    ///
    /// ## Panics
    /// Panics if `row` is out of bounds.

    pub fn swap_remove(&mut self, row: Row) -> (T, Option<Row>) {
        self.check_row(row);
        let last = self.values.len() - 1;
        let value = self.values.swap_remove(row);
        (value, (row != last).then_some(last))
    }

    /// Swap-removes `row` and destroys its value.
    pub fn remove(&mut self, row: Row) -> Option<Row> {
        let (value, moved_from) = self.swap_remove(row);
        drop(value);
        moved_from
    }

    /// Returns the value at `row`.
    ///
    /// ## Panics
    /// Panics if `row` is out of bounds.
    #[inline]
    pub fn at(&self, row: Row) -> &T {
        self.check_row(row);
        &self.values[row]
    }

    /// Returns the value at `row` mutably.
    ///
    /// ## Panics
    /// Panics if `row` is out of bounds.
    #[inline]
    pub fn at_mut(&mut self, row: Row) -> &mut T {
        self.check_row(row);
        &mut self.values[row]
    }

    /// All occupied rows.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// All occupied rows, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Number of occupied rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no row is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Logical capacity in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Component stored by this array.
    #[inline]
    pub fn component_id(&self) -> ComponentId {
        self.component_id
    }

    /// Size in bytes of one element.
    #[inline]
    pub fn element_size(&self) -> usize {
        size_of::<T>()
    }
}

impl<T: Component + Pod> ComponentArray<T> {
    /// Appends one value by copying its bytes.
    ///
    /// ## Panics
    /// Panics if `bytes.len()` differs from the element size.

    pub fn insert_bytes(&mut self, bytes: &[u8]) -> Row {
        assert_eq!(
            bytes.len(),
            size_of::<T>(),
            "trying to insert a component of non-matching size into ComponentArray<{}> \
             (element size = {}, inserted size = {})",
            type_name::<T>(),
            size_of::<T>(),
            bytes.len()
        );
        self.emplace(bytemuck::pod_read_unaligned(bytes))
    }

    /// Bytes of all occupied rows.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }

    /// Bytes of a single row.
    ///
    /// ## Panics
    /// Panics if `row` is out of bounds.
    pub fn row_bytes(&self, row: Row) -> &[u8] {
        bytemuck::bytes_of(self.at(row))
    }
}

impl<T: Component> TypeErasedArray for ComponentArray<T> {
    fn component_id(&self) -> ComponentId {
        self.component_id
    }

    fn element_size(&self) -> usize {
        size_of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn new_empty(&self) -> Box<dyn TypeErasedArray> {
        Box::new(ComponentArray::<T>::with_base_capacity(self.component_id, self.base_capacity))
    }

    fn remove_dyn(&mut self, row: Row) -> Option<Row> {
        self.remove(row)
    }

    fn push_from_dyn(&mut self, source: &mut dyn TypeErasedArray, row: Row) -> (Row, Option<Row>) {
        let source_name = source.element_type_name();
        let source = source
            .as_any_mut()
            .downcast_mut::<ComponentArray<T>>()
            .unwrap_or_else(|| {
                panic!(
                    "cannot move a `{}` row into ComponentArray<{}>",
                    source_name,
                    type_name::<T>()
                )
            });

        let (value, moved_from) = source.swap_remove(row);
        (self.emplace(value), moved_from)
    }
}
