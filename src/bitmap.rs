//! Compressed id sets (§2 "ID bitmap helpers"), used to dedupe neighbor
//! fan-outs without materializing a `HashSet<u64>` per request.
//!
//! Ids are sparse over the full `u64` space but dense within a given
//! `(shard, type)` pair (§3): a node's slot is a small, densely packed
//! integer. So instead of one flat bitmap we keep one [`BitVec`] per
//! `(shard, type)`, indexed by slot — the id-codec equivalent of a
//! chunked/roaring bitmap's per-container layout.

use bit_vec::BitVec;
use fnv::FnvHashMap;

use crate::id;

#[derive(Debug, Clone, Default)]
pub struct IdBitmap {
    containers: FnvHashMap<(u16, u16), BitVec>,
    len: usize,
}

impl IdBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id`. Returns `true` if it was newly added.
    pub fn insert(&mut self, external_id: u64) -> bool {
        if external_id == id::INVALID {
            return false;
        }
        let (shard, type_id, slot) = id::decode(external_id);
        let container = self.containers.entry((shard, type_id)).or_default();
        let slot = slot as usize;
        if container.len() <= slot {
            container.grow(slot + 1 - container.len(), false);
        }
        if container.get(slot) == Some(true) {
            false
        } else {
            container.set(slot, true);
            self.len += 1;
            true
        }
    }

    pub fn contains(&self, external_id: u64) -> bool {
        let (shard, type_id, slot) = id::decode(external_id);
        self.containers
            .get(&(shard, type_id))
            .map(|c| c.get(slot as usize).unwrap_or(false))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Materialize the deduplicated ids, sorted by `(shard, type, slot)`.
    pub fn to_sorted_vec(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.len);
        let mut keys: Vec<_> = self.containers.keys().copied().collect();
        keys.sort_unstable();
        for (shard, type_id) in keys {
            let container = &self.containers[&(shard, type_id)];
            for slot in 0..container.len() {
                if container.get(slot) == Some(true) {
                    out.push(id::encode(shard, type_id, slot as u64));
                }
            }
        }
        out
    }
}

impl FromIterator<u64> for IdBitmap {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut bitmap = IdBitmap::new();
        for id in iter {
            bitmap.insert(id);
        }
        bitmap
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dedupes_across_shards_and_types() {
        let mut bitmap = IdBitmap::new();
        let a = id::encode(0, 1, 5);
        let b = id::encode(1, 1, 5);
        let c = id::encode(0, 2, 5);
        assert!(bitmap.insert(a));
        assert!(bitmap.insert(b));
        assert!(bitmap.insert(c));
        assert!(!bitmap.insert(a));
        assert_eq!(bitmap.len(), 3);
        assert!(bitmap.contains(a) && bitmap.contains(b) && bitmap.contains(c));
    }

    #[test]
    fn invalid_id_never_inserted() {
        let mut bitmap = IdBitmap::new();
        assert!(!bitmap.insert(id::INVALID));
        assert!(bitmap.is_empty());
    }

    #[test]
    fn sorted_vec_is_ordered() {
        let ids: IdBitmap = [
            id::encode(1, 0, 3),
            id::encode(0, 0, 5),
            id::encode(0, 0, 1),
        ]
        .into_iter()
        .collect();
        let sorted = ids.to_sorted_vec();
        assert_eq!(
            sorted,
            vec![id::encode(0, 0, 1), id::encode(0, 0, 5), id::encode(1, 0, 3)]
        );
    }
}
