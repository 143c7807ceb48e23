//! Peered relationship operations (§3 "Cross-shard relationship creation",
//! §6.3).

use fnv::FnvHashMap;
use tracing::warn;

use crate::cluster::Cluster;
use crate::group::Direction;
use crate::id;
use crate::relationship::Relationship;
use crate::Result;

/// Create a relationship `id1 -> id2`. Same-shard endpoints complete in one
/// dispatch; cross-shard endpoints complete in two legs. If the second leg
/// fails, the relationship is orphaned on `id1`'s side and the call returns
/// 0 — this is the documented best-effort semantics of §3, not an error.
pub async fn add(
    cluster: &Cluster,
    rel_type_name: &str,
    id1: u64,
    id2: u64,
    properties_json: Option<serde_json::Value>,
) -> Result<u64> {
    let shard1 = id::shard_of(id1);
    let shard2 = id::shard_of(id2);
    let rel_type_name = rel_type_name.to_string();

    if shard1 == shard2 {
        return cluster
            .on_owner(id1, move |shard| {
                shard.relationship_add_same_shard(&rel_type_name, id1, id2, properties_json.as_ref())
            })
            .await?;
    }

    // Both endpoints must be validated before either leg mutates state
    // (§3 step 2): check `id2` on its own shard first, since
    // `relationship_add_to_outgoing` only validates `id1`.
    let id2_valid = cluster.on_owner(id2, move |shard| shard.valid_node(id2)).await?;
    if !id2_valid {
        return Ok(id::INVALID);
    }

    let rel_type_for_leg1 = rel_type_name.clone();
    let rel_id = cluster
        .on_owner(id1, move |shard| {
            shard.relationship_add_to_outgoing(&rel_type_for_leg1, id1, id2, properties_json.as_ref())
        })
        .await??;

    if rel_id == id::INVALID {
        return Ok(id::INVALID);
    }

    let (_, rel_type_id, _) = id::decode(rel_id);
    let second_leg = cluster
        .on_owner(id2, move |shard| {
            shard.relationship_add_to_incoming(rel_type_id, rel_id, id1, id2)
        })
        .await;

    match second_leg {
        Ok(true) => Ok(rel_id),
        Ok(false) => {
            warn!(rel_id, id1, id2, "relationship orphaned: ending endpoint invalid");
            Ok(id::INVALID)
        }
        Err(e) => {
            warn!(rel_id, id1, id2, error = %e, "relationship orphaned: second leg failed");
            Ok(id::INVALID)
        }
    }
}

pub async fn get(cluster: &Cluster, rel_id: u64) -> Result<Relationship> {
    cluster.on_owner(rel_id, move |shard| shard.relationship_get(rel_id)).await
}

/// Remove a relationship (§3 "Remove (relationship)"). The ending-side
/// cleanup is best-effort, matching §7: a failure there is logged, not
/// surfaced, since the starting-side removal already committed.
pub async fn remove(cluster: &Cluster, rel_id: u64) -> Result<bool> {
    let (rel_type_id, ending_id) = cluster
        .on_owner(rel_id, move |shard| shard.relationship_remove_get_incoming(rel_id))
        .await??;

    if let Err(e) = cluster
        .on_owner(ending_id, move |shard| {
            shard.relationship_remove_incoming(rel_type_id, rel_id, ending_id)
        })
        .await
    {
        warn!(rel_id, ending_id, error = %e, "relationship removal left an incoming residual");
    }
    Ok(true)
}

/// Relationships directly connecting `id1` and `id2` (either direction,
/// optionally narrowed by `rel_types`). `id1`'s adjacency links are always
/// local to `id1`'s shard, so resolving them is a single dispatch; the
/// matched relationship ids can still land on any shard (an incoming link
/// was created on `id2`'s shard), so fetching the full records is a second
/// fan-out keyed by whichever shards those ids land on.
pub async fn between(
    cluster: &Cluster,
    id1: u64,
    id2: u64,
    direction: Direction,
    rel_types: Option<Vec<u16>>,
) -> Result<Vec<Relationship>> {
    let links = cluster
        .on_owner(id1, move |shard| {
            shard.node_get_relationships_ids_to(id1, id2, direction, rel_types.as_deref())
        })
        .await?;

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

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ShardConfig;
    use crate::peered::nodes;

    #[tokio::test]
    async fn same_shard_add_and_get() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 1,
            ..ShardConfig::default()
        });
        let a = nodes::add(&cluster, "Person", "a", None).await.unwrap();
        let b = nodes::add(&cluster, "Person", "b", None).await.unwrap();
        let rel = add(&cluster, "KNOWS", a, b, None).await.unwrap();
        assert_ne!(rel, id::INVALID);
        let fetched = get(&cluster, rel).await.unwrap();
        assert_eq!(fetched.starting_id, a);
        assert_eq!(fetched.ending_id, b);
    }

    #[tokio::test]
    async fn cross_shard_add_and_remove() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 4,
            ..ShardConfig::default()
        });
        // Find two keys landing on different shards.
        let mut x = None;
        let mut y = None;
        for i in 0.. {
            let key = format!("k{i}");
            let shard = id::owning_shard_for("Node", &key, 4);
            if x.is_none() {
                x = Some((shard, key));
            } else if x.as_ref().unwrap().0 != shard && y.is_none() {
                y = Some((shard, key));
                break;
            }
        }
        let (_, kx) = x.unwrap();
        let (_, ky) = y.unwrap();
        let xid = nodes::add(&cluster, "Node", &kx, None).await.unwrap();
        let yid = nodes::add(&cluster, "Node", &ky, None).await.unwrap();
        assert_ne!(id::shard_of(xid), id::shard_of(yid));

        let rel = add(&cluster, "KNOWS", xid, yid, None).await.unwrap();
        assert_ne!(rel, id::INVALID);

        assert!(remove(&cluster, rel).await.unwrap());
        let gone = get(&cluster, rel).await.unwrap();
        assert!(gone.is_empty());
    }

    #[tokio::test]
    async fn invalid_endpoint_returns_zero_and_no_state_change() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 1,
            ..ShardConfig::default()
        });
        let a = nodes::add(&cluster, "Person", "a", None).await.unwrap();
        let rel = add(&cluster, "KNOWS", a, id::INVALID, None).await.unwrap();
        assert_eq!(rel, id::INVALID);
        assert_eq!(nodes::get(&cluster, a).await.unwrap().key, "a");
    }

    #[tokio::test]
    async fn invalid_endpoint_on_other_shard_returns_zero_and_no_state_change() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 4,
            ..ShardConfig::default()
        });

        let mut kx = None;
        for i in 0.. {
            let key = format!("k{i}");
            if id::owning_shard_for("Person", &key, 4) == 0 {
                kx = Some(key);
                break;
            }
        }
        let xid = nodes::add(&cluster, "Person", &kx.unwrap(), None).await.unwrap();
        assert_eq!(id::shard_of(xid), 0);

        let type_id = crate::types::snapshot().node_type_id("Person").unwrap();
        // A well-formed id on a different shard whose slot was never allocated.
        let bogus = id::encode(1, type_id, 9_999);
        assert_ne!(id::shard_of(xid), id::shard_of(bogus));

        let rel = add(&cluster, "KNOWS", xid, bogus, None).await.unwrap();
        assert_eq!(rel, id::INVALID);

        let out_degree = cluster
            .on_owner(xid, move |shard| {
                shard.node_get_degree(xid, crate::group::Direction::Out, None)
            })
            .await
            .unwrap();
        assert_eq!(out_degree, 0, "no orphaned outgoing link on id1's shard");
    }

    #[tokio::test]
    async fn between_finds_same_shard_connection() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 1,
            ..ShardConfig::default()
        });
        let a = nodes::add(&cluster, "Person", "a", None).await.unwrap();
        let b = nodes::add(&cluster, "Person", "b", None).await.unwrap();
        let c = nodes::add(&cluster, "Person", "c", None).await.unwrap();
        let rel = add(&cluster, "KNOWS", a, b, None).await.unwrap();
        add(&cluster, "KNOWS", a, c, None).await.unwrap();

        let found = between(&cluster, a, b, Direction::Out, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, rel);

        let none = between(&cluster, a, c, Direction::In, None).await.unwrap();
        assert!(none.is_empty(), "wrong direction yields no match");
    }

    #[tokio::test]
    async fn between_finds_cross_shard_connection_from_either_side() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 4,
            ..ShardConfig::default()
        });
        let mut x = None;
        let mut y = None;
        for i in 0.. {
            let key = format!("k{i}");
            let shard = id::owning_shard_for("Node", &key, 4);
            if x.is_none() {
                x = Some((shard, key));
            } else if x.as_ref().unwrap().0 != shard && y.is_none() {
                y = Some((shard, key));
                break;
            }
        }
        let (_, kx) = x.unwrap();
        let (_, ky) = y.unwrap();
        let xid = nodes::add(&cluster, "Node", &kx, None).await.unwrap();
        let yid = nodes::add(&cluster, "Node", &ky, None).await.unwrap();

        let rel = add(&cluster, "KNOWS", xid, yid, None).await.unwrap();

        let from_x = between(&cluster, xid, yid, Direction::Out, None).await.unwrap();
        assert_eq!(from_x.len(), 1);
        assert_eq!(from_x[0].id, rel);

        let from_y = between(&cluster, yid, xid, Direction::In, None).await.unwrap();
        assert_eq!(from_y.len(), 1);
        assert_eq!(from_y[0].id, rel);
    }
}
