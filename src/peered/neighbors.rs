//! Neighbor aggregation (§4.7 "Neighbor aggregation") and the peered half
//! of relationship traversal: a node's own adjacency links are always
//! local, but the relationship records and neighbor nodes they point to
//! may live on any shard.

use std::collections::BTreeMap;

use fnv::FnvHashMap;

use crate::bitmap::IdBitmap;
use crate::cluster::Cluster;
use crate::group::Direction;
use crate::id;
use crate::node::Node;
use crate::relationship::Relationship;
use crate::Result;

/// `node_get_relationships_ids` is already shard-local (adjacency mirrors
/// live on the requesting node's own shard), so this is a single dispatch.
pub async fn relationship_ids(
    cluster: &Cluster,
    node_id: u64,
    direction: Direction,
    rel_types: Option<Vec<u16>>,
) -> Result<Vec<crate::link::Link>> {
    cluster
        .on_owner(node_id, move |shard| {
            shard.node_get_relationships_ids(node_id, direction, rel_types.as_deref())
        })
        .await
}

/// Fetch full [`Relationship`] records for a node's links, across however
/// many shards their relationship ids land on.
pub async fn relationships(
    cluster: &Cluster,
    node_id: u64,
    direction: Direction,
    rel_types: Option<Vec<u16>>,
) -> Result<Vec<Relationship>> {
    let links = relationship_ids(cluster, node_id, direction, rel_types).await?;
    let mut by_shard: FnvHashMap<u16, Vec<u64>> = FnvHashMap::default();
    for link in &links {
        by_shard.entry(id::shard_of(link.rel_id)).or_default().push(link.rel_id);
    }

    let mut shard_ids: Vec<u16> = by_shard.keys().copied().collect();
    shard_ids.sort_unstable();
    let mut out = Vec::with_capacity(links.len());
    for shard_id in shard_ids {
        let rel_ids = by_shard.remove(&shard_id).unwrap_or_default();
        let fetched = cluster
            .on_shard(shard_id, move |shard| {
                rel_ids.into_iter().map(|id| shard.relationship_get(id)).collect::<Vec<_>>()
            })
            .await?;
        out.extend(fetched);
    }
    Ok(out)
}

/// `neighbors(ids)`: for every requested node, the set of counterpart
/// nodes reachable via `direction`/`rel_types`. Follows the four-step
/// algorithm of §4.7: partition by shard, resolve to links, dedupe the
/// union of counterparts via a compressed id bitmap, fetch in a second
/// fan-out, and stitch back by source id.
pub async fn neighbors(
    cluster: &Cluster,
    ids: &[u64],
    direction: Direction,
    rel_types: Option<Vec<u16>>,
) -> Result<BTreeMap<u64, Vec<Node>>> {
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut by_shard: FnvHashMap<u16, Vec<u64>> = FnvHashMap::default();
    for &id in ids {
        by_shard.entry(id::shard_of(id)).or_default().push(id);
    }

    // Step 2: resolve each source id to its counterpart links, per shard.
    let mut per_source: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    let mut shard_ids: Vec<u16> = by_shard.keys().copied().collect();
    shard_ids.sort_unstable();
    for shard_id in shard_ids {
        let source_ids = by_shard.remove(&shard_id).unwrap_or_default();
        let rel_types = rel_types.clone();
        let resolved = cluster
            .on_shard(shard_id, move |shard| {
                source_ids
                    .into_iter()
                    .map(|src| {
                        let links = shard.node_get_relationships_ids(src, direction, rel_types.as_deref());
                        (src, links.into_iter().map(|l| l.node_id).collect::<Vec<_>>())
                    })
                    .collect::<Vec<_>>()
            })
            .await?;
        for (src, counterparts) in resolved {
            per_source.insert(src, counterparts);
        }
    }

    // Step 3: flatten and dedupe the union of counterpart ids.
    let dedup: IdBitmap = per_source.values().flatten().copied().collect();
    let unique = dedup.to_sorted_vec();

    // Step 4: fetch those nodes, one dispatch per shard they land on.
    let mut fetch_by_shard: FnvHashMap<u16, Vec<u64>> = FnvHashMap::default();
    for id in unique {
        fetch_by_shard.entry(id::shard_of(id)).or_default().push(id);
    }
    let mut by_id: FnvHashMap<u64, Node> = FnvHashMap::default();
    let mut fetch_shard_ids: Vec<u16> = fetch_by_shard.keys().copied().collect();
    fetch_shard_ids.sort_unstable();
    for shard_id in fetch_shard_ids {
        let wanted = fetch_by_shard.remove(&shard_id).unwrap_or_default();
        let fetched = cluster
            .on_shard(shard_id, move |shard| {
                wanted.into_iter().map(|id| (id, shard.node_get(id))).collect::<Vec<_>>()
            })
            .await?;
        by_id.extend(fetched);
    }

    // Step 5: stitch back into the per-source mapping.
    let mut out = BTreeMap::new();
    for (src, counterparts) in per_source {
        let nodes = counterparts
            .into_iter()
            .filter_map(|id| by_id.get(&id).cloned())
            .collect();
        out.insert(src, nodes);
    }
    Ok(out)
}
