//! Paginated full scans (§4.7 "Pagination"): `all_nodes`/`all_relationships`
//! walk shards in ascending id order, asking each contributing shard only
//! for the slice of `skip`/`limit` it actually owns, so a stable total
//! ordering emerges without ever materializing the whole type.

use crate::cluster::Cluster;
use crate::node::Node;
use crate::relationship::Relationship;
use crate::Result;

/// Total live count of `type_name` across every shard.
pub async fn node_count(cluster: &Cluster, type_name: &str) -> Result<u64> {
    let type_name = type_name.to_string();
    let counts = cluster
        .on_all(move |shard| shard.node_type_get_count(&type_name))
        .await;
    counts.into_iter().collect::<Result<Vec<_>>>().map(|v| v.iter().sum())
}

pub async fn relationship_count(cluster: &Cluster, type_name: &str) -> Result<u64> {
    let type_name = type_name.to_string();
    let counts = cluster
        .on_all(move |shard| shard.relationship_type_get_count(&type_name))
        .await;
    counts.into_iter().collect::<Result<Vec<_>>>().map(|v| v.iter().sum())
}

/// Per-shard `(skip, limit)` windows for a page starting at `skip` of size
/// `limit` over `counts` (shard 0's count, shard 1's count, ...). Shards
/// with nothing left to contribute are omitted.
fn windows(counts: &[u64], skip: usize, limit: usize) -> Vec<(u16, usize, usize)> {
    let mut remaining_skip = skip;
    let mut remaining_limit = limit;
    let mut out = Vec::new();
    for (shard_id, &count) in counts.iter().enumerate() {
        if remaining_limit == 0 {
            break;
        }
        let count = count as usize;
        if remaining_skip >= count {
            remaining_skip -= count;
            continue;
        }
        let local_skip = remaining_skip;
        let local_limit = remaining_limit.min(count - local_skip);
        out.push((shard_id as u16, local_skip, local_limit));
        remaining_skip = 0;
        remaining_limit -= local_limit;
    }
    out
}

pub async fn all_nodes(cluster: &Cluster, type_name: &str, skip: usize, limit: usize) -> Result<Vec<Node>> {
    let counts: Vec<u64> = {
        let type_name = type_name.to_string();
        cluster
            .on_all(move |shard| shard.node_type_get_count(&type_name))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?
    };

    let mut out = Vec::with_capacity(limit.min(counts.iter().sum::<u64>() as usize));
    for (shard_id, local_skip, local_limit) in windows(&counts, skip, limit) {
        let type_name = type_name.to_string();
        let page = cluster
            .on_shard(shard_id, move |shard| shard.all_nodes(&type_name, local_skip, local_limit))
            .await?;
        out.extend(page);
    }
    Ok(out)
}

pub async fn all_relationships(
    cluster: &Cluster,
    type_name: &str,
    skip: usize,
    limit: usize,
) -> Result<Vec<Relationship>> {
    let counts: Vec<u64> = {
        let type_name = type_name.to_string();
        cluster
            .on_all(move |shard| shard.relationship_type_get_count(&type_name))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?
    };

    let mut out = Vec::with_capacity(limit.min(counts.iter().sum::<u64>() as usize));
    for (shard_id, local_skip, local_limit) in windows(&counts, skip, limit) {
        let type_name = type_name.to_string();
        let page = cluster
            .on_shard(shard_id, move |shard| {
                shard.all_relationships(&type_name, local_skip, local_limit)
            })
            .await?;
        out.extend(page);
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ShardConfig;
    use crate::peered::nodes;

    #[tokio::test]
    async fn pagination_is_stable_across_shards() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 4,
            ..ShardConfig::default()
        });
        for i in 0..50 {
            nodes::add(&cluster, "Person", &format!("p{i}"), None).await.unwrap();
        }
        assert_eq!(node_count(&cluster, "Person").await.unwrap(), 50);

        let mut seen = std::collections::HashSet::new();
        let mut skip = 0;
        loop {
            let page = all_nodes(&cluster, "Person", skip, 7).await.unwrap();
            if page.is_empty() {
                break;
            }
            for node in &page {
                assert!(seen.insert(node.id), "duplicate id across pages");
            }
            skip += page.len();
        }
        assert_eq!(seen.len(), 50);
    }

    #[tokio::test]
    async fn empty_type_yields_no_pages() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 2,
            ..ShardConfig::default()
        });
        let page = all_nodes(&cluster, "Nonexistent", 0, 10).await.unwrap();
        assert!(page.is_empty());
    }
}
