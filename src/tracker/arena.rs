//! Slot arena for track records keyed by a stable track id.

use std::collections::BTreeMap;

/// Unique, never reused, track identity.
pub type TrackId = u64;

/// Hands out monotonically increasing track ids for one tracker instance.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: TrackId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> TrackId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Track records stored in reusable slots.
///
/// Removing a record frees its slot for the next insert; the id itself is
/// never handed out again by [`IdAllocator`]. Iteration is in id order.
#[derive(Debug, Clone)]
pub struct TrackArena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    index: BTreeMap<TrackId, usize>,
}

impl<T> Default for TrackArena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<T> TrackArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record under `id`, returning the slot it landed in.
    pub fn insert(&mut self, id: TrackId, value: T) -> usize {
        if let Some(&slot) = self.index.get(&id) {
            self.slots[slot] = Some(value);
            return slot;
        }
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                slot
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        slot
    }

    pub fn remove(&mut self, id: TrackId) -> Option<T> {
        let slot = self.index.remove(&id)?;
        self.free.push(slot);
        self.slots[slot].take()
    }

    pub fn get(&self, id: TrackId) -> Option<&T> {
        self.index.get(&id).and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut T> {
        let slot = *self.index.get(&id)?;
        self.slots[slot].as_mut()
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of allocated slots, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live ids in ascending order.
    pub fn ids(&self) -> Vec<TrackId> {
        self.index.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &T)> {
        self.index
            .iter()
            .filter_map(|(&id, &slot)| self.slots[slot].as_ref().map(|value| (id, value)))
    }

    /// Visit every live record mutably, in slot order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for value in self.slots.iter_mut().flatten() {
            f(value);
        }
    }

    /// Drop every record for which `keep` returns false; returns the removed ids.
    pub fn retain(&mut self, mut keep: impl FnMut(TrackId, &T) -> bool) -> Vec<TrackId> {
        let doomed: Vec<TrackId> = self
            .iter()
            .filter(|(id, value)| !keep(*id, *value))
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.remove(id);
        }
        doomed
    }
}
