//! Per-relationship-type table (§4.4 "Relationships"): endpoint columns and
//! the same deleted-slot/live-slot bookkeeping as node tables.

use std::collections::BTreeSet;

use bit_vec::BitVec;

use crate::property::Store;

#[derive(Debug, Clone, Default)]
pub struct RelationshipTable {
    starting_id: Vec<u64>,
    ending_id: Vec<u64>,
    deleted_slots: BTreeSet<u64>,
    live_slots: BitVec,
    pub properties: Store,
}

impl RelationshipTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_slot_len(&mut self, slot: usize) {
        if self.starting_id.len() <= slot {
            self.starting_id.resize(slot + 1, 0);
            self.ending_id.resize(slot + 1, 0);
        }
        if self.live_slots.len() <= slot {
            self.live_slots.grow(slot + 1 - self.live_slots.len(), false);
        }
    }

    pub fn allocate(&mut self, starting_id: u64, ending_id: u64) -> u64 {
        let slot = if let Some(&min) = self.deleted_slots.iter().next() {
            self.deleted_slots.remove(&min);
            min
        } else {
            self.starting_id.len() as u64
        };
        self.ensure_slot_len(slot as usize);
        self.starting_id[slot as usize] = starting_id;
        self.ending_id[slot as usize] = ending_id;
        self.live_slots.set(slot as usize, true);
        slot
    }

    pub fn free(&mut self, slot: u64) {
        let idx = slot as usize;
        if idx < self.starting_id.len() {
            self.starting_id[idx] = 0;
            self.ending_id[idx] = 0;
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

    pub fn endpoints(&self, slot: u64) -> Option<(u64, u64)> {
        if self.is_live(slot) {
            Some((self.starting_id[slot as usize], self.ending_id[slot as usize]))
        } else {
            None
        }
    }

    pub fn live_count(&self) -> u64 {
        self.live_slots.iter().filter(|b| *b).count() as u64
    }

    pub fn live_slots_sorted(&self) -> Vec<u64> {
        self.live_slots
            .iter()
            .enumerate()
            .filter_map(|(slot, live)| live.then_some(slot as u64))
            .collect()
    }

    pub fn max_slot_assigned(&self) -> u64 {
        self.starting_id.len() as u64
    }

    pub fn deleted_slots(&self) -> &BTreeSet<u64> {
        &self.deleted_slots
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocate_and_endpoints() {
        let mut table = RelationshipTable::new();
        let slot = table.allocate(10, 20);
        assert_eq!(table.endpoints(slot), Some((10, 20)));
    }

    #[test]
    fn free_clears_endpoints_and_reuses_slot() {
        let mut table = RelationshipTable::new();
        let slot = table.allocate(10, 20);
        table.free(slot);
        assert_eq!(table.endpoints(slot), None);
        let reused = table.allocate(30, 40);
        assert_eq!(reused, slot);
    }
}
