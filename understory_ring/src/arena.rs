// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage and the ring primitives built on it.

use alloc::vec::Vec;

/// Generational handle for ring entries.
///
/// A key pairs a slot index with the generation the slot had when the entry was
/// inserted. Freeing a slot makes every key that points at it stale; reusing the
/// slot bumps its generation, so stale keys never alias the new entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Slot indices are stored as 32 bits."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this key.
    pub const fn slot(self) -> u32 {
        self.0
    }

    /// Generation of this key. Starts at `1` and grows on slot reuse.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    prev: usize,
    next: usize,
    value: T,
}

/// Arena holding any number of circular doubly-linked rings.
///
/// A ring is identified by its head, an `Option<Key>` the caller stores wherever
/// it likes (for example inside the value of another entry). `None` is the empty ring.
#[derive(Clone)]
pub struct RingArena<T> {
    slots: Vec<Option<Slot<T>>>,
    generations: Vec<u32>, // last generation per slot (persists across frees)
    free_list: Vec<usize>,
}

impl<T> Default for RingArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for RingArena<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingArena")
            .field("slots_total", &self.slots.len())
            .field("slots_alive", &self.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<T> RingArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Number of live entries across all rings.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Whether the arena holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` refers to a live entry.
    pub fn is_alive(&self, key: Key) -> bool {
        self.live(key).is_some()
    }

    /// Borrow the value behind `key`.
    pub fn get(&self, key: Key) -> Option<&T> {
        self.live(key).map(|s| &s.value)
    }

    /// Mutably borrow the value behind `key`.
    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.idx())?.as_mut()?;
        if slot.generation != key.1 {
            return None;
        }
        Some(&mut slot.value)
    }

    /// Successor of `key` in its ring. A ring of one is its own successor.
    pub fn next(&self, key: Key) -> Option<Key> {
        let slot = self.live(key)?;
        Some(self.key_at(slot.next))
    }

    /// Predecessor of `key` in its ring.
    pub fn prev(&self, key: Key) -> Option<Key> {
        let slot = self.live(key)?;
        Some(self.key_at(slot.prev))
    }

    /// Insert `value` into the ring named by `head`, immediately before the head.
    ///
    /// An empty ring gets the new entry as its head. Otherwise the head is kept, so
    /// iterating from the head yields entries in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if `head` names a freed entry; that is a corrupted ring, not bad input.
    pub fn insert(&mut self, head: &mut Option<Key>, value: T) -> Key {
        let idx = self.alloc(value);
        let key = self.key_at(idx);
        let Some(h) = *head else {
            // Zero entries: the fresh slot already points at itself.
            *head = Some(key);
            return key;
        };
        assert!(self.is_alive(h), "ring head {h:?} is not alive");
        let h_idx = h.idx();
        let (h_prev, h_next) = {
            let s = self.slot(h_idx);
            (s.prev, s.next)
        };
        if h_next == h_idx || h_prev == h_idx {
            // One entry: both neighbours of the head become the new entry.
            self.set_neighbours(idx, h_idx, h_idx);
            self.set_neighbours(h_idx, idx, idx);
        } else {
            self.set_neighbours(idx, h_prev, h_idx);
            self.slot_mut(h_idx).prev = idx;
            self.slot_mut(h_prev).next = idx;
        }
        key
    }

    /// Remove `key` from the ring named by `head` and free its slot.
    ///
    /// Returns `None` when `key` is not a member of that ring; nothing changes then.
    /// Removing the head promotes its successor, and removing the sole entry empties the ring.
    pub fn unlink(&mut self, head: &mut Option<Key>, key: Key) -> Option<T> {
        let h = (*head)?;
        if !self.contains(*head, key) {
            return None;
        }
        let idx = key.idx();
        let (prev, next) = {
            let s = self.slot(idx);
            (s.prev, s.next)
        };
        if next == idx {
            *head = None;
        } else {
            if h == key {
                *head = Some(self.key_at(next));
            }
            self.slot_mut(next).prev = prev;
            self.slot_mut(prev).next = next;
        }
        Some(self.release(idx))
    }

    /// Free every entry of the ring named by `head` and return the values in ring order.
    pub fn drain(&mut self, head: &mut Option<Key>) -> Vec<T> {
        let keys = self.keys(*head);
        *head = None;
        keys.into_iter().map(|k| self.release(k.idx())).collect()
    }

    /// Iterate the ring named by `head`, starting at the head.
    pub fn iter(&self, head: Option<Key>) -> Iter<'_, T> {
        match head.filter(|h| self.is_alive(*h)) {
            Some(h) => Iter {
                arena: self,
                head: h.idx(),
                cursor: Some(h.idx()),
            },
            None => Iter {
                arena: self,
                head: 0,
                cursor: None,
            },
        }
    }

    /// Snapshot of the ring's keys in ring order.
    pub fn keys(&self, head: Option<Key>) -> Vec<Key> {
        self.iter(head).map(|(k, _)| k).collect()
    }

    /// Number of entries in the ring named by `head`.
    pub fn len_of(&self, head: Option<Key>) -> usize {
        self.iter(head).count()
    }

    /// Zero-based position of `key` counted from the head.
    pub fn position(&self, head: Option<Key>, key: Key) -> Option<usize> {
        self.iter(head).position(|(k, _)| k == key)
    }

    /// Key at position `n` counted from the head.
    pub fn nth(&self, head: Option<Key>, n: usize) -> Option<Key> {
        self.iter(head).nth(n).map(|(k, _)| k)
    }

    /// Whether `key` is a member of the ring named by `head`.
    pub fn contains(&self, head: Option<Key>, key: Key) -> bool {
        self.position(head, key).is_some()
    }

    /// Check the structure of a ring and return its size.
    ///
    /// Walking `next` from the head must come back to the head after exactly the same
    /// number of steps as walking `prev`, and every `next` must be the inverse of a `prev`.
    ///
    /// # Panics
    ///
    /// Panics on any violation. A broken ring means a primitive is wrong, so there is
    /// nothing sensible to recover.
    pub fn assert_ring(&self, head: Option<Key>) -> usize {
        let Some(h) = head else {
            return 0;
        };
        assert!(self.is_alive(h), "ring head {h:?} is not alive");
        let start = h.idx();
        let mut forward = 0;
        let mut cursor = start;
        loop {
            let next = self.slot(cursor).next;
            assert_eq!(
                self.slot(next).prev,
                cursor,
                "next/prev are not inverses at slot {cursor}"
            );
            forward += 1;
            assert!(
                forward <= self.len(),
                "ring through slot {start} never closes"
            );
            cursor = next;
            if cursor == start {
                break;
            }
        }
        let mut backward = 0;
        loop {
            cursor = self.slot(cursor).prev;
            backward += 1;
            assert!(backward <= forward, "prev walk overshoots the next walk");
            if cursor == start {
                break;
            }
        }
        assert_eq!(forward, backward, "prev and next walks disagree on ring size");
        forward
    }

    // --- internals ---

    fn live(&self, key: Key) -> Option<&Slot<T>> {
        self.slots
            .get(key.idx())?
            .as_ref()
            .filter(|s| s.generation == key.1)
    }

    fn slot(&self, idx: usize) -> &Slot<T> {
        self.slots[idx].as_ref().expect("ring links a freed slot")
    }

    fn slot_mut(&mut self, idx: usize) -> &mut Slot<T> {
        self.slots[idx].as_mut().expect("ring links a freed slot")
    }

    fn key_at(&self, idx: usize) -> Key {
        Key::new(idx, self.slot(idx).generation)
    }

    fn set_neighbours(&mut self, idx: usize, prev: usize, next: usize) {
        let s = self.slot_mut(idx);
        s.prev = prev;
        s.next = next;
    }

    fn alloc(&mut self, value: T) -> usize {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(Slot {
                generation,
                prev: idx,
                next: idx,
                value,
            });
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(Some(Slot {
                generation: 1,
                prev: idx,
                next: idx,
                value,
            }));
            self.generations.push(1);
            idx
        }
    }

    fn release(&mut self, idx: usize) -> T {
        let slot = self.slots[idx].take().expect("released slot is already free");
        self.free_list.push(idx);
        slot.value
    }
}

/// Iterator over one ring, yielding keys and values from the head onwards.
pub struct Iter<'a, T> {
    arena: &'a RingArena<T>,
    head: usize,
    cursor: Option<usize>,
}

impl<T> core::fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Iter")
            .field("head", &self.head)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Key, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let slot = self.arena.slot(idx);
        self.cursor = (slot.next != self.head).then_some(slot.next);
        Some((Key::new(idx, slot.generation), &slot.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn values(arena: &RingArena<u32>, head: Option<Key>) -> Vec<u32> {
        arena.iter(head).map(|(_, v)| *v).collect()
    }

    #[test]
    fn first_insert_becomes_self_linked_head() {
        let mut arena = RingArena::new();
        let mut head = None;
        let a = arena.insert(&mut head, 1_u32);
        assert_eq!(head, Some(a));
        assert_eq!(arena.next(a), Some(a));
        assert_eq!(arena.prev(a), Some(a));
        assert_eq!(arena.assert_ring(head), 1);
    }

    #[test]
    fn second_insert_repoints_both_neighbours() {
        let mut arena = RingArena::new();
        let mut head = None;
        let a = arena.insert(&mut head, 1_u32);
        let b = arena.insert(&mut head, 2);
        assert_eq!(head, Some(a), "head is kept on insert");
        assert_eq!(arena.next(a), Some(b));
        assert_eq!(arena.prev(a), Some(b));
        assert_eq!(arena.next(b), Some(a));
        assert_eq!(arena.prev(b), Some(a));
        assert_eq!(arena.assert_ring(head), 2);
    }

    #[test]
    fn third_insert_lands_before_head() {
        let mut arena = RingArena::new();
        let mut head = None;
        let a = arena.insert(&mut head, 1_u32);
        let b = arena.insert(&mut head, 2);
        let c = arena.insert(&mut head, 3);
        assert_eq!(arena.next(b), Some(c));
        assert_eq!(arena.next(c), Some(a));
        assert_eq!(arena.prev(a), Some(c));
        assert_eq!(values(&arena, head), vec![1, 2, 3]);
        assert_eq!(arena.assert_ring(head), 3);
    }

    #[test]
    fn unlink_head_promotes_successor() {
        let mut arena = RingArena::new();
        let mut head = None;
        let a = arena.insert(&mut head, 1_u32);
        let b = arena.insert(&mut head, 2);
        let _c = arena.insert(&mut head, 3);
        assert_eq!(arena.unlink(&mut head, a), Some(1));
        assert_eq!(head, Some(b));
        assert_eq!(values(&arena, head), vec![2, 3]);
        assert_eq!(arena.assert_ring(head), 2);
    }

    #[test]
    fn unlink_sole_entry_empties_ring() {
        let mut arena = RingArena::new();
        let mut head = None;
        let a = arena.insert(&mut head, 1_u32);
        assert_eq!(arena.unlink(&mut head, a), Some(1));
        assert_eq!(head, None);
        assert!(arena.is_empty());
        assert_eq!(arena.assert_ring(head), 0);
    }

    #[test]
    fn unlink_from_wrong_ring_is_refused() {
        let mut arena = RingArena::new();
        let mut left = None;
        let mut right = None;
        let a = arena.insert(&mut left, 1_u32);
        let _b = arena.insert(&mut right, 2);
        assert_eq!(arena.unlink(&mut right, a), None);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.assert_ring(left), 1);
        assert_eq!(arena.assert_ring(right), 1);
    }

    #[test]
    fn stale_keys_do_not_alias_reused_slots() {
        let mut arena = RingArena::new();
        let mut head = None;
        let a = arena.insert(&mut head, 1_u32);
        arena.unlink(&mut head, a);
        let b = arena.insert(&mut head, 2);
        assert_eq!(a.slot(), b.slot(), "slot is reused");
        assert!(b.generation() > a.generation());
        assert!(!arena.is_alive(a));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&2));
        assert_eq!(arena.unlink(&mut head, a), None);
    }

    #[test]
    fn drain_frees_whole_ring_in_order() {
        let mut arena = RingArena::new();
        let mut head = None;
        let mut other = None;
        for v in 0..4_u32 {
            arena.insert(&mut head, v);
        }
        arena.insert(&mut other, 99);
        assert_eq!(arena.drain(&mut head), vec![0, 1, 2, 3]);
        assert_eq!(head, None);
        assert_eq!(arena.len(), 1);
        assert_eq!(values(&arena, other), vec![99]);
    }

    #[test]
    fn position_and_nth_count_from_head() {
        let mut arena = RingArena::new();
        let mut head = None;
        let keys: Vec<Key> = (0..5_u32).map(|v| arena.insert(&mut head, v)).collect();
        assert_eq!(arena.position(head, keys[3]), Some(3));
        assert_eq!(arena.nth(head, 4), Some(keys[4]));
        assert_eq!(arena.nth(head, 5), None);
        assert_eq!(arena.len_of(head), 5);
        arena.unlink(&mut head, keys[0]);
        assert_eq!(arena.position(head, keys[3]), Some(2));
    }

    #[test]
    fn mixed_sequences_keep_rings_closed() {
        // Deterministic LCG so the sequence is reproducible without extra dependencies.
        let mut state = 0x2545_f491_u32;
        let mut step = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state >> 8
        };
        let mut arena = RingArena::new();
        let mut rings = [None; 3];
        let mut members: [Vec<Key>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for round in 0..600_u32 {
            let r = (step() % 3) as usize;
            if members[r].is_empty() || step() % 3 != 0 {
                let k = arena.insert(&mut rings[r], round);
                members[r].push(k);
            } else {
                let pick = (step() as usize) % members[r].len();
                let k = members[r].swap_remove(pick);
                assert!(arena.unlink(&mut rings[r], k).is_some());
            }
            for (ring, keys) in rings.iter().zip(members.iter()) {
                assert_eq!(arena.assert_ring(*ring), keys.len());
                for k in keys {
                    let mut cursor = *k;
                    for _ in 0..keys.len() {
                        cursor = arena.next(cursor).unwrap();
                    }
                    assert_eq!(cursor, *k, "N steps return to the start");
                    assert_eq!(arena.prev(arena.next(*k).unwrap()), Some(*k));
                }
            }
        }
    }
}
