use std::marker::PhantomData;
use crate::bodies::RigidBody;
use crate::constraints::Constraint;
use crate::core::{BodyHandle, ConstraintHandle};

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Clears all items from the storage
    fn clear(&mut self);

    /// Returns all live handles in slot order
    fn handles(&self) -> Vec<H>;

    /// Returns an iterator over all items in slot order
    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a;

    /// Returns a mutable iterator over all items in slot order
    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a;
}

/// Handle types that can address an [`Arena`] slot
pub trait ArenaHandle: Copy {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(&self) -> usize;
    fn generation(&self) -> u32;
}

impl ArenaHandle for BodyHandle {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    fn index(&self) -> usize {
        self.index as usize
    }

    fn generation(&self) -> u32 {
        self.generation
    }
}

impl ArenaHandle for ConstraintHandle {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    fn index(&self) -> usize {
        self.index as usize
    }

    fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    item: Option<T>,
}

/// Slot arena with generation-checked handles and a free list.
///
/// Slots are reused most-recently-freed first; every removal bumps the
/// slot's generation so old handles stop resolving.
#[derive(Debug, Clone)]
pub struct Arena<T, H> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _handle: PhantomData<H>,
}

/// Storage for physics bodies
pub type BodyStorage = Arena<RigidBody, BodyHandle>;

/// Storage for physics constraints
pub type ConstraintStorage = Arena<Constraint, ConstraintHandle>;

impl<T, H: ArenaHandle> Storage<T, H> for Arena<T, H> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _handle: PhantomData,
        }
    }

    fn add(&mut self, item: T) -> H {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.item = Some(item);
            return H::from_parts(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, item: Some(item) });
        H::from_parts(index, 0)
    }

    fn get(&self, handle: H) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.item.as_ref())
    }

    fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.item.as_mut())
    }

    fn remove(&mut self, handle: H) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let item = slot.item.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.len -= 1;
        Some(item)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.item.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    fn handles(&self) -> Vec<H> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.item
                .as_ref()
                .map(|item| (H::from_parts(index as u32, slot.generation), item))
        })
    }

    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.item
                .as_mut()
                .map(|item| (H::from_parts(index as u32, generation), item))
        })
    }
}

impl<T, H: ArenaHandle> Arena<T, H> {
    /// Returns true if the handle still refers to a live item
    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    /// Mutable access to two distinct items at once
    pub fn get_pair_mut(&mut self, a: H, b: H) -> Option<(&mut T, &mut T)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (first, second) = if ia < ib {
            let (left, right) = self.slots.split_at_mut(ib);
            (&mut left[ia], &mut right[0])
        } else {
            let (left, right) = self.slots.split_at_mut(ia);
            (&mut right[0], &mut left[ib])
        };

        match (first.item.as_mut(), second.item.as_mut()) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

impl<T, H: ArenaHandle> Default for Arena<T, H> {
    fn default() -> Self {
        <Self as Storage<T, H>>::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestArena = Arena<&'static str, BodyHandle>;

    #[test]
    fn stale_handle_does_not_resolve() {
        let mut arena = TestArena::new();
        let a = arena.add("a");
        assert_eq!(arena.remove(a), Some("a"));

        let b = arena.add("b");
        assert_eq!(a.index, b.index);
        assert_ne!(a.generation, b.generation);
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn iteration_follows_slot_order() {
        let mut arena = TestArena::new();
        let a = arena.add("a");
        let _b = arena.add("b");
        let _c = arena.add("c");
        arena.remove(a);
        let d = arena.add("d");

        let items: Vec<_> = arena.iter().map(|(_, item)| *item).collect();
        assert_eq!(items, vec!["d", "b", "c"]);
        assert_eq!(arena.handles()[0], d);
    }

    #[test]
    fn pair_access_in_either_order() {
        let mut arena = TestArena::new();
        let a = arena.add("a");
        let b = arena.add("b");

        let (x, y) = arena.get_pair_mut(b, a).unwrap();
        assert_eq!((*x, *y), ("b", "a"));
        assert!(arena.get_pair_mut(a, a).is_none());
    }
}
