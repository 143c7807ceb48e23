//! External 64-bit id codec (§3, §4.1).
//!
//! Packs `(shard, type, slot)` into a single `u64`:
//!
//! ```text
//! bits  0..9   shard id          (10 bits, up to 1024 shards)
//! bits 10..25  type id           (16 bits, up to 65535 types per kind)
//! bits 26..63  slot              (38 bits, up to ~2.7e11 live per type)
//! ```
//!
//! Id 0 is the reserved "absent" sentinel. All of this is pure, branch-free
//! arithmetic; this is the only place the packing is known.

use std::hash::Hasher as _;

const SHARD_BITS: u32 = 10;
const TYPE_BITS: u32 = 16;
const SLOT_BITS: u32 = 38;

const SHARD_MASK: u64 = (1 << SHARD_BITS) - 1;
const TYPE_MASK: u64 = (1 << TYPE_BITS) - 1;
const SLOT_MASK: u64 = (1 << SLOT_BITS) - 1;

const TYPE_SHIFT: u32 = SHARD_BITS;
const SLOT_SHIFT: u32 = SHARD_BITS + TYPE_BITS;

pub const MAX_SHARDS: u64 = 1 << SHARD_BITS;
pub const MAX_TYPES: u64 = 1 << TYPE_BITS;
pub const MAX_SLOTS: u64 = 1 << SLOT_BITS;

/// Reserved id meaning "absent" / "invalid".
pub const INVALID: u64 = 0;

/// Pack `(shard, type, slot)` into an external id. Branch-free.
#[inline]
pub fn encode(shard: u16, type_id: u16, slot: u64) -> u64 {
    ((slot & SLOT_MASK) << SLOT_SHIFT)
        | ((type_id as u64 & TYPE_MASK) << TYPE_SHIFT)
        | (shard as u64 & SHARD_MASK)
}

/// Extract the owning shard id from an external id. Branch-free.
#[inline]
pub fn shard_of(id: u64) -> u16 {
    (id & SHARD_MASK) as u16
}

/// Extract the type id from an external id. Branch-free.
#[inline]
pub fn type_of(id: u64) -> u16 {
    ((id >> TYPE_SHIFT) & TYPE_MASK) as u16
}

/// Extract the internal slot from an external id. Branch-free.
#[inline]
pub fn slot_of(id: u64) -> u64 {
    id >> SLOT_SHIFT
}

/// Decode an id into its three components in one pass. Decoding the reserved
/// id `0` returns `(0, 0, 0)`, which callers interpret as "absent".
#[inline]
pub fn decode(id: u64) -> (u16, u16, u64) {
    (shard_of(id), type_of(id), slot_of(id))
}

/// FNV-1a, used both for the stable `(type, key)` shard-placement hash and
/// for varchar/string hashing elsewhere in the property store. Deterministic
/// across runs of the same build, which is all §4.1 requires.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

/// Determine the owning shard for a `(type, key)` pair via a multiply-high
/// bucket selection over a stable hash. Uniform over `shards` as long as the
/// hash is.
pub fn owning_shard_for(type_name: &str, key: &str, shards: u16) -> u16 {
    debug_assert!(shards > 0);
    let mut combined = Vec::with_capacity(type_name.len() + key.len() + 1);
    combined.extend_from_slice(type_name.as_bytes());
    combined.push(b'-');
    combined.extend_from_slice(key.as_bytes());
    let hash = fnv1a(&combined);
    // 64x64 -> 128 multiply-high bucket selection: uniform, no modulo bias.
    (((hash as u128) * (shards as u128)) >> 64) as u16
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        for shard in [0u16, 1, 1023] {
            for type_id in [0u16, 1, 65535] {
                for slot in [0u64, 1, (1u64 << 38) - 1] {
                    let id = encode(shard, type_id, slot);
                    assert_eq!(decode(id), (shard, type_id, slot));
                }
            }
        }
    }

    #[test]
    fn zero_is_invalid_sentinel() {
        assert_eq!(decode(INVALID), (0, 0, 0));
    }

    #[test]
    fn owning_shard_is_stable() {
        let a = owning_shard_for("Person", "alice", 16);
        let b = owning_shard_for("Person", "alice", 16);
        assert_eq!(a, b);
        assert!((a as u64) < 16);
    }

    #[test]
    fn owning_shard_distributes() {
        let mut buckets = vec![0u32; 8];
        for i in 0..10_000 {
            let key = format!("key-{i}");
            let shard = owning_shard_for("Person", &key, 8);
            buckets[shard as usize] += 1;
        }
        for count in buckets {
            assert!(count > 500, "uneven distribution: {count}");
        }
    }
}
