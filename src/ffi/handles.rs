//! Generation-tagged handle table
//!
//! Handles are `u64`: low 32 bits are slot index + 1, high 32 bits the slot's
//! generation. A slot's generation bumps every time it is released, so a
//! stale or double-freed handle never aliases a newer object. `0` is null.
//!
//! A value can be taken out of its slot (`Moved`) while its new owner decides;
//! the slot is then either restored or released.

use crate::error::{Error, Result};

pub const NULL_HANDLE: u64 = 0;

enum Slot<T> {
    Vacant,
    Occupied(T),
    /// Ownership moved elsewhere; the handle stays valid until destroyed
    Moved,
}

struct Entry<T> {
    generation: u32,
    slot: Slot<T>,
}

/// What `remove` found behind a live handle
pub enum Removed<T> {
    Value(T),
    Moved,
}

pub struct HandleTable<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    live: usize,
}

fn encode(index: u32, generation: u32) -> u64 {
    (u64::from(generation) << 32) | (u64::from(index) + 1)
}

fn decode(handle: u64) -> Option<(usize, u32)> {
    let low = (handle & 0xFFFF_FFFF) as u32;
    let index = low.checked_sub(1)?;
    Some((index as usize, (handle >> 32) as u32))
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        HandleTable {
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Store `value`; None once the index space is exhausted
    pub fn insert(&mut self, value: T) -> Option<u64> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.entries.len()).ok().filter(|i| *i < u32::MAX)?;
                self.entries.push(Entry {
                    generation: 1,
                    slot: Slot::Vacant,
                });
                index
            }
        };
        let entry = &mut self.entries[index as usize];
        entry.slot = Slot::Occupied(value);
        self.live += 1;
        Some(encode(index, entry.generation))
    }

    fn entry(&self, handle: u64) -> Option<&Entry<T>> {
        let (index, generation) = decode(handle)?;
        self.entries.get(index).filter(|e| e.generation == generation)
    }

    fn entry_mut(&mut self, handle: u64) -> Option<&mut Entry<T>> {
        let (index, generation) = decode(handle)?;
        self.entries.get_mut(index).filter(|e| e.generation == generation)
    }

    pub fn get(&self, handle: u64) -> Result<&T> {
        match self.entry(handle) {
            Some(Entry {
                slot: Slot::Occupied(value),
                ..
            }) => Ok(value),
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    /// Move the value out, leaving the handle live but empty
    pub fn take(&mut self, handle: u64) -> Result<T> {
        let entry = self
            .entry_mut(handle)
            .filter(|e| matches!(e.slot, Slot::Occupied(_)))
            .ok_or(Error::InvalidHandle(handle))?;
        match std::mem::replace(&mut entry.slot, Slot::Moved) {
            Slot::Occupied(value) => Ok(value),
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    /// Undo a `take` whose consumer refused the value
    pub fn restore(&mut self, handle: u64, value: T) -> Result<()> {
        let entry = self
            .entry_mut(handle)
            .filter(|e| matches!(e.slot, Slot::Moved))
            .ok_or(Error::InvalidHandle(handle))?;
        entry.slot = Slot::Occupied(value);
        Ok(())
    }

    /// Retire a handle whose value was taken for good. The slot is recycled
    /// and the old handle goes stale.
    pub fn release_moved(&mut self, handle: u64) -> Result<()> {
        if !self.is_moved(handle) {
            return Err(Error::InvalidHandle(handle));
        }
        self.remove(handle).map(|_| ())
    }

    pub fn is_moved(&self, handle: u64) -> bool {
        matches!(self.entry(handle), Some(Entry { slot: Slot::Moved, .. }))
    }

    /// Release the handle; the slot is recycled under a new generation
    pub fn remove(&mut self, handle: u64) -> Result<Removed<T>> {
        let (index, _) = decode(handle).ok_or(Error::InvalidHandle(handle))?;
        let entry = self
            .entry_mut(handle)
            .filter(|e| !matches!(e.slot, Slot::Vacant))
            .ok_or(Error::InvalidHandle(handle))?;

        let removed = match std::mem::replace(&mut entry.slot, Slot::Vacant) {
            Slot::Occupied(value) => Removed::Value(value),
            _ => Removed::Moved,
        };
        entry.generation = entry.generation.wrapping_add(1).max(1);
        self.free.push(index as u32);
        self.live -= 1;
        Ok(removed)
    }

    /// Slots not yet released, moved ones included
    pub fn live(&self) -> usize {
        self.live
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get() {
        let mut table = HandleTable::new();
        let h = table.insert("x").unwrap();
        assert_ne!(h, NULL_HANDLE);
        assert_eq!(*table.get(h).unwrap(), "x");
        assert_eq!(table.live(), 1);
    }

    #[test]
    fn test_null_and_garbage() {
        let table: HandleTable<u8> = HandleTable::new();
        assert_eq!(table.get(NULL_HANDLE).err(), Some(Error::InvalidHandle(0)));
        assert!(table.get(0xdead_beef_0000_0042).is_err());
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut table = HandleTable::new();
        let first = table.insert(1).unwrap();
        assert!(matches!(table.remove(first), Ok(Removed::Value(1))));

        // Same slot, new generation
        let second = table.insert(2).unwrap();
        assert_eq!(first & 0xFFFF_FFFF, second & 0xFFFF_FFFF);
        assert_ne!(first, second);
        assert!(table.get(first).is_err());
        assert!(table.remove(first).is_err());
        assert_eq!(*table.get(second).unwrap(), 2);
    }

    #[test]
    fn test_double_remove() {
        let mut table = HandleTable::new();
        let h = table.insert(1).unwrap();
        assert!(table.remove(h).is_ok());
        assert!(table.remove(h).is_err());
        assert_eq!(table.live(), 0);
    }

    #[test]
    fn test_take_and_restore() {
        let mut table = HandleTable::new();
        let h = table.insert(String::from("col")).unwrap();

        let value = table.take(h).unwrap();
        assert!(table.is_moved(h));
        assert!(table.get(h).is_err());
        assert!(table.take(h).is_err());

        table.restore(h, value).unwrap();
        assert_eq!(table.get(h).unwrap(), "col");

        table.take(h).unwrap();
        assert!(matches!(table.remove(h), Ok(Removed::Moved)));
        assert!(table.remove(h).is_err());
    }

    #[test]
    fn test_release_moved_recycles_slot() {
        let mut table = HandleTable::new();
        let h = table.insert(7).unwrap();

        // Only a moved slot can be released this way
        assert!(table.release_moved(h).is_err());

        table.take(h).unwrap();
        table.release_moved(h).unwrap();
        assert_eq!(table.live(), 0);
        assert!(!table.is_moved(h));
        assert!(table.remove(h).is_err());
        assert!(table.release_moved(h).is_err());

        let next = table.insert(8).unwrap();
        assert_ne!(next, h);
        assert!(table.get(h).is_err());
        assert_eq!(*table.get(next).unwrap(), 8);
    }
}
