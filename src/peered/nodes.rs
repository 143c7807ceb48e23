//! Peered node operations (§6.2).

use tracing::warn;

use crate::cluster::Cluster;
use crate::id;
use crate::node::Node;
use crate::shard::RemoteCleanup;
use crate::Result;

/// Create a node with no properties. The owning shard is computed locally
/// from `(type_name, key)` (§4.1) — no dispatch is needed to find it.
pub async fn add_empty(cluster: &Cluster, type_name: &str, key: &str) -> Result<u64> {
    let owner = id::owning_shard_for(type_name, key, cluster.shard_count());
    let type_name = type_name.to_string();
    let key = key.to_string();
    cluster
        .on_shard(owner, move |shard| shard.node_add_empty(&type_name, &key))
        .await
}

/// Create a node, applying `properties_json` if given.
pub async fn add(
    cluster: &Cluster,
    type_name: &str,
    key: &str,
    properties_json: Option<serde_json::Value>,
) -> Result<u64> {
    let owner = id::owning_shard_for(type_name, key, cluster.shard_count());
    let type_name = type_name.to_string();
    let key = key.to_string();
    cluster
        .on_shard(owner, move |shard| shard.node_add(&type_name, &key, properties_json.as_ref()))
        .await?
}

pub async fn get(cluster: &Cluster, id: u64) -> Result<Node> {
    cluster.on_owner(id, move |shard| shard.node_get(id)).await
}

pub async fn get_by_key(cluster: &Cluster, type_name: &str, key: &str) -> Result<Node> {
    let owner = id::owning_shard_for(type_name, key, cluster.shard_count());
    let type_name = type_name.to_string();
    let key = key.to_string();
    cluster
        .on_shard(owner, move |shard| {
            let id = shard.node_get_id(&type_name, &key);
            shard.node_get(id)
        })
        .await
}

/// Remove a node. Severs local adjacency on the owning shard, then
/// dispatches the reported remote cleanups (§3 "Remove (node)"). A remote
/// cleanup failing is best-effort: the residual is logged, not surfaced,
/// matching §7's documented best-effort semantics for removal cascades.
pub async fn remove(cluster: &Cluster, id: u64) -> Result<bool> {
    let removal = cluster.on_owner(id, move |shard| shard.node_remove(id)).await?;
    if !removal.removed {
        return Ok(false);
    }
    for cleanup in removal.cleanups {
        let target_shard = match cleanup {
            RemoteCleanup::Incoming { shard, .. } => shard,
            RemoteCleanup::Outgoing { shard, .. } => shard,
        };
        if let Err(e) = cluster
            .shard(target_shard)?
            .dispatch(move |shard| shard.apply_remote_cleanup(cleanup))
            .await
        {
            warn!(node_id = id, target_shard, error = %e, "node removal cleanup left a residual");
        }
    }
    Ok(true)
}

pub async fn get_degree(
    cluster: &Cluster,
    id: u64,
    direction: crate::group::Direction,
    rel_types: Option<Vec<u16>>,
) -> Result<u64> {
    cluster
        .on_owner(id, move |shard| shard.node_get_degree(id, direction, rel_types.as_deref()))
        .await
}
