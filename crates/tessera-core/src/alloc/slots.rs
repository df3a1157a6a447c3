//! Generational slot storage.
//!
//! Removing a value bumps its slot's generation, so a stale [`SlotKey`] never
//! resolves to whatever value reuses the slot later.

use std::num::NonZeroU64;

use crate::profiling::profile_function;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey(NonZeroU64);

impl SlotKey {
    pub fn new(generation: u32, idx: u32) -> Self {
        let packed = ((generation as u64) << 32) | (idx as u64 + 1);
        // The low half is at least one, so `packed` is never zero.
        Self(NonZeroU64::new(packed).unwrap_or(NonZeroU64::MIN))
    }

    pub fn generation(&self) -> u32 {
        (self.0.get() >> 32) as u32
    }

    pub fn index(&self) -> u32 {
        ((self.0.get() & u32::MAX as u64) - 1) as u32
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub struct SlotMap<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> SlotMap<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, value: T) -> SlotKey {
        profile_function!();
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.value = Some(value);
            SlotKey::new(slot.generation, idx)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            SlotKey::new(0, idx)
        }
    }

    fn slot(&self, key: SlotKey) -> Option<&Slot<T>> {
        self.slots
            .get(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.slot(key).and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index() as usize)
            .filter(|slot| slot.generation == key.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Removes and returns the value, invalidating `key`.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        profile_function!();
        let index = key.index();
        let slot = self
            .slots
            .get_mut(index as usize)
            .filter(|slot| slot.generation == key.generation())?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    /// Removes every value, yielding them in slot order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.len = 0;
        self.free.clear();
        let slots = &mut self.slots;
        for (idx, slot) in slots.iter_mut().enumerate() {
            if slot.value.is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(idx as u32);
        }
        self.free.reverse();
        slots.iter_mut().filter_map(|slot| slot.value.take())
    }

    pub fn keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.value
                .as_ref()
                .map(|_| SlotKey::new(slot.generation, idx as u32))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.value
                .as_ref()
                .map(|value| (SlotKey::new(slot.generation, idx as u32), value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotKey, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(idx, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (SlotKey::new(generation, idx as u32), value))
        })
    }
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_eq_size!(SlotKey, Option<SlotKey>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_map_insert() {
        let mut map = SlotMap::<u8>::new();
        let key = map.insert(15);
        assert_eq!(key.generation(), 0);
        assert_eq!(key.index(), 0);
        assert_eq!(map.get(key), Some(&15));
    }

    #[test]
    fn test_slot_map_stale_key() {
        let mut map = SlotMap::<u8>::new();
        let key = map.insert(15);
        assert_eq!(map.remove(key), Some(15));
        let new_key = map.insert(45);
        assert_eq!(key.index(), new_key.index());
        assert_ne!(key.generation(), new_key.generation());
        assert_eq!(map.get(key), None);
        assert_eq!(map.remove(key), None);
        assert_eq!(map.get(new_key), Some(&45));
    }

    #[test]
    fn test_slot_map_iter_skips_removed() {
        let mut map = SlotMap::<u8>::new();
        let keys: Vec<_> = (0..100).map(|i| map.insert(i)).collect();
        map.remove(keys[0]);
        map.remove(keys[1]);
        let collected: Vec<_> = map.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected.len(), 98);
        assert_eq!(collected[0], 2);
        assert_eq!(map.len(), 98);
    }

    #[test]
    fn test_slot_map_drain() {
        let mut map = SlotMap::<u8>::new();
        let a = map.insert(1);
        let b = map.insert(2);
        let drained: Vec<_> = map.drain().collect();
        assert_eq!(drained, vec![1, 2]);
        assert!(map.is_empty());
        assert_eq!(map.get(a), None);
        assert_eq!(map.get(b), None);

        let c = map.insert(3);
        assert_eq!(c.index(), 0);
        assert_eq!(map.get(c), Some(&3));
    }
}
