//! Per-node-type table (§4.4 "Nodes"): key index, key column, adjacency,
//! and the deleted-slot/live-slot bookkeeping shared by the slot lifecycle
//! state machine (§4.8).

use std::collections::BTreeSet;

use bit_vec::BitVec;
use fnv::FnvHashMap;

use crate::group::Adjacency;
use crate::property::Store;

#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    keys: Vec<String>,
    key_index: FnvHashMap<String, u64>,
    adjacency: Vec<Adjacency>,
    deleted_slots: BTreeSet<u64>,
    live_slots: BitVec,
    pub properties: Store,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_id(&self, key: &str) -> Option<u64> {
        self.key_index.get(key).copied()
    }

    fn ensure_slot_len(&mut self, slot: usize) {
        if self.keys.len() <= slot {
            self.keys.resize(slot + 1, String::new());
            self.adjacency.resize_with(slot + 1, Adjacency::default);
        }
        if self.live_slots.len() <= slot {
            self.live_slots.grow(slot + 1 - self.live_slots.len(), false);
        }
    }

    /// The slot the next [`NodeTable::allocate`] call will assign, without
    /// mutating anything. Callers that need to know a node's id before it
    /// exists (the id embeds the slot) peek this first.
    pub fn peek_next_slot(&self) -> u64 {
        self.deleted_slots
            .iter()
            .next()
            .copied()
            .unwrap_or(self.keys.len() as u64)
    }

    /// Free→Live transition: reuse the minimum deleted slot, else append.
    /// Returns the allocated slot and writes `key`/`id` into the index.
    pub fn allocate(&mut self, key: &str, id: u64) -> u64 {
        let slot = if let Some(&min) = self.deleted_slots.iter().next() {
            self.deleted_slots.remove(&min);
            min
        } else {
            self.keys.len() as u64
        };
        self.ensure_slot_len(slot as usize);
        self.keys[slot as usize] = key.to_string();
        self.key_index.insert(key.to_string(), id);
        self.live_slots.set(slot as usize, true);
        self.adjacency[slot as usize] = Adjacency::default();
        slot
    }

    /// Live→Free transition: vacate the slot, clear its key, drop its
    /// adjacency, reset its properties, and add it to `deleted_slots`.
    pub fn free(&mut self, slot: u64) {
        let idx = slot as usize;
        if idx < self.keys.len() {
            let key = std::mem::take(&mut self.keys[idx]);
            self.key_index.remove(&key);
            self.adjacency[idx] = Adjacency::default();
        }
        if idx < self.live_slots.len() {
            self.live_slots.set(idx, false);
        }
        self.properties.delete_all(slot);
        self.deleted_slots.insert(slot);
    }

    pub fn is_live(&self, slot: u64) -> bool {
        self.live_slots.get(slot as usize).unwrap_or(false)
    }

    pub fn key(&self, slot: u64) -> Option<&str> {
        self.keys.get(slot as usize).map(String::as_str)
    }

    pub fn adjacency(&self, slot: u64) -> Option<&Adjacency> {
        if self.is_live(slot) {
            self.adjacency.get(slot as usize)
        } else {
            None
        }
    }

    pub fn adjacency_mut(&mut self, slot: u64) -> Option<&mut Adjacency> {
        if self.is_live(slot) {
            self.adjacency.get_mut(slot as usize)
        } else {
            None
        }
    }

    pub fn live_count(&self) -> u64 {
        self.live_slots.iter().filter(|b| *b).count() as u64
    }

    /// Live slots, in ascending slot order (stable scan order for §4.7
    /// pagination).
    pub fn live_slots_sorted(&self) -> Vec<u64> {
        self.live_slots
            .iter()
            .enumerate()
            .filter_map(|(slot, live)| live.then_some(slot as u64))
            .collect()
    }

    pub fn max_slot_assigned(&self) -> u64 {
        self.keys.len() as u64
    }

    pub fn deleted_slots(&self) -> &BTreeSet<u64> {
        &self.deleted_slots
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slot_reuse_is_minimum_first() {
        let mut table = NodeTable::new();
        let s0 = table.allocate("a", 100);
        let s1 = table.allocate("b", 101);
        table.free(s0);
        let s2 = table.allocate("c", 102);
        assert_eq!(s2, s0, "freed slot should be reused before appending");
        assert_ne!(s1, s2);
    }

    #[test]
    fn free_erases_key_index() {
        let mut table = NodeTable::new();
        let slot = table.allocate("a", 100);
        assert_eq!(table.get_id("a"), Some(100));
        table.free(slot);
        assert_eq!(table.get_id("a"), None);
        assert!(!table.is_live(slot));
    }

    #[test]
    fn live_and_deleted_partition_assigned_range() {
        let mut table = NodeTable::new();
        let s0 = table.allocate("a", 1);
        let _s1 = table.allocate("b", 2);
        table.free(s0);
        let max = table.max_slot_assigned();
        let live: std::collections::BTreeSet<_> = table.live_slots_sorted().into_iter().collect();
        let deleted = table.deleted_slots();
        let union: std::collections::BTreeSet<_> = live.union(deleted).copied().collect();
        assert_eq!(union, (0..max).collect());
        assert!(live.is_disjoint(deleted));
    }
}
