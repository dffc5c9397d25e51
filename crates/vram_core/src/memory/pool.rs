//! # Record Pool
//!
//! Fixed-capacity slot storage for allocator records, addressed by
//! generation-checked handles instead of pointers.

/// Handle to a record in a [`RecordPool`].
///
/// A handle stays valid until its record is removed. Removing bumps the
/// slot's generation, so stale copies of the handle stop resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordHandle {
    /// Index into the pool.
    index: u32,
    /// Generation of the slot when the record was inserted.
    generation: u32,
}

impl RecordHandle {
    /// Returns the slot index (stable for the record's lifetime).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A pool of allocator records.
///
/// All slots are reserved up front; `insert` and `remove` never touch the heap.
///
/// # Thread Safety
///
/// Not thread-safe. Every allocator is mutated from the main thread only.
#[derive(Clone, Debug)]
pub struct RecordPool<T> {
    /// The storage array.
    slots: Box<[Slot<T>]>,
    /// Free list - indices of available slots.
    free_list: Vec<u32>,
    /// Number of live records.
    len: usize,
}

impl<T> RecordPool<T> {
    /// Creates a pool with room for `capacity` records.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        let slots: Vec<Slot<T>> = (0..capacity)
            .map(|_| Slot { generation: 0, value: None })
            .collect();

        Self {
            slots: slots.into_boxed_slice(),
            free_list: (0..capacity as u32).rev().collect(),
            len: 0,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of live records.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no record is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a record. Returns `None` if every slot is taken.
    pub fn insert(&mut self, value: T) -> Option<RecordHandle> {
        let index = self.free_list.pop()?;
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        self.len += 1;

        Some(RecordHandle { index, generation: slot.generation })
    }

    /// Removes a record, invalidating every copy of its handle.
    pub fn remove(&mut self, handle: RecordHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }

        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.len -= 1;

        Some(value)
    }

    /// Returns true if the handle resolves to a live record.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: RecordHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets a record.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: RecordHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation == handle.generation {
            slot.value.as_ref()
        } else {
            None
        }
    }

    /// Gets a record mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: RecordHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation == handle.generation {
            slot.value.as_mut()
        } else {
            None
        }
    }

    /// Removes every record. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free_list.clear();
        self.free_list.extend((0..self.slots.len() as u32).rev());
        self.len = 0;
    }

    /// Iterates over live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (RecordHandle { index: index as u32, generation: slot.generation }, value)
            })
        })
    }

    /// Returns the first live record matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<RecordHandle> {
        self.iter().find(|(_, value)| predicate(value)).map(|(handle, _)| handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_insert_remove() {
        let mut pool: RecordPool<u32> = RecordPool::new(4);

        let h1 = pool.insert(42).unwrap();
        assert_eq!(pool.get(h1), Some(&42));
        assert_eq!(pool.len(), 1);

        assert_eq!(pool.remove(h1), Some(42));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_full() {
        let mut pool: RecordPool<u8> = RecordPool::new(2);

        let _ = pool.insert(1).unwrap();
        let _ = pool.insert(2).unwrap();
        assert!(pool.insert(3).is_none());
    }

    #[test]
    fn test_pool_stale_handle() {
        let mut pool: RecordPool<u32> = RecordPool::new(1);

        let h1 = pool.insert(1).unwrap();
        pool.remove(h1);

        let h2 = pool.insert(2).unwrap();
        assert_eq!(h1.index(), h2.index()); // Same slot reused
        assert!(pool.get(h1).is_none());
        assert!(pool.remove(h1).is_none());
        assert_eq!(pool.get(h2), Some(&2));
    }

    #[test]
    fn test_pool_clear_invalidates() {
        let mut pool: RecordPool<u32> = RecordPool::new(3);
        let h1 = pool.insert(1).unwrap();
        let _ = pool.insert(2).unwrap();

        pool.clear();
        assert!(pool.is_empty());
        assert!(!pool.contains(h1));
        assert_eq!(pool.iter().count(), 0);
        assert!(pool.insert(5).is_some());
    }
}
