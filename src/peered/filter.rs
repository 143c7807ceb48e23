//! Peered filtering and set algebra (§4.7 "Set algebra", §6.7). A filter
//! over an explicit id list partitions those ids by shard, asks each shard
//! to evaluate the predicate against only the ids it owns, and merges.

use fnv::FnvHashMap;

use crate::cluster::Cluster;
use crate::id;
use crate::node::Node;
use crate::property::{Operator, Sort, Value};
use crate::relationship::Relationship;
use crate::set_algebra;
use crate::types;
use crate::{Error, Result};

fn partition_by_shard(ids: &[u64]) -> Vec<(u16, Vec<u64>)> {
    let mut by_shard: FnvHashMap<u16, Vec<u64>> = FnvHashMap::default();
    for &id in ids {
        by_shard.entry(id::shard_of(id)).or_default().push(id);
    }
    let mut out: Vec<_> = by_shard.into_iter().collect();
    out.sort_by_key(|(shard, _)| *shard);
    out
}

pub async fn count_nodes(
    cluster: &Cluster,
    ids: &[u64],
    type_name: &str,
    name: &str,
    op: Operator,
    value: Value,
) -> Result<usize> {
    let type_id = types::snapshot().node_type_id(type_name).ok_or(Error::NotFound)?;
    let name = name.to_string();
    let mut total = 0;
    for (shard_id, shard_ids) in partition_by_shard(ids) {
        let value = value.clone();
        let name = name.clone();
        total += cluster
            .on_shard(shard_id, move |shard| {
                shard.filter_count_nodes(&shard_ids, type_id, &name, op, &value)
            })
            .await?;
    }
    Ok(total)
}

/// Matching node ids across the given `ids`, globally sorted, skipped and
/// limited. A per-shard pass does the (type, property, operator)
/// evaluation; the merge step re-sorts centrally since no single shard's
/// local sort order is globally meaningful.
#[allow(clippy::too_many_arguments)]
pub async fn ids_nodes(
    cluster: &Cluster,
    ids: &[u64],
    type_name: &str,
    name: &str,
    op: Operator,
    value: Value,
    skip: usize,
    limit: usize,
    sort: Sort,
) -> Result<Vec<u64>> {
    let type_id = types::snapshot().node_type_id(type_name).ok_or(Error::NotFound)?;
    let prop_name = name.to_string();

    let mut matched = Vec::new();
    for (shard_id, shard_ids) in partition_by_shard(ids) {
        let value = value.clone();
        let prop_name = prop_name.clone();
        let page = cluster
            .on_shard(shard_id, move |shard| {
                shard.filter_ids_nodes(&shard_ids, type_id, &prop_name, op, &value, 0, usize::MAX, Sort::None)
            })
            .await?;
        matched.extend(page);
    }

    if sort == Sort::None {
        return Ok(matched.into_iter().skip(skip).take(limit).collect());
    }

    let mut by_shard = partition_by_shard(&matched);
    let mut values: FnvHashMap<u64, Value> = FnvHashMap::default();
    for (shard_id, shard_ids) in by_shard.drain(..) {
        let prop_name = prop_name.clone();
        let fetched = cluster
            .on_shard(shard_id, move |shard| {
                shard_ids
                    .into_iter()
                    .filter_map(|id| shard.node_property_get(id, &prop_name).ok().map(|v| (id, v)))
                    .collect::<Vec<_>>()
            })
            .await?;
        values.extend(fetched);
    }
    matched.sort_by(|a, b| {
        let cmp = compare_values(values.get(a), values.get(b));
        if sort == Sort::Descending {
            cmp.reverse()
        } else {
            cmp
        }
    });
    Ok(matched.into_iter().skip(skip).take(limit).collect())
}

pub async fn count_relationships(
    cluster: &Cluster,
    ids: &[u64],
    type_name: &str,
    name: &str,
    op: Operator,
    value: Value,
) -> Result<usize> {
    let type_id = types::snapshot().relationship_type_id(type_name).ok_or(Error::NotFound)?;
    let mut total = 0;
    for (shard_id, shard_ids) in partition_by_shard(ids) {
        let value = value.clone();
        let name = name.to_string();
        total += cluster
            .on_shard(shard_id, move |shard| {
                shard.filter_count_relationships(&shard_ids, type_id, &name, op, &value)
            })
            .await?;
    }
    Ok(total)
}

#[allow(clippy::too_many_arguments)]
pub async fn ids_relationships(
    cluster: &Cluster,
    ids: &[u64],
    type_name: &str,
    name: &str,
    op: Operator,
    value: Value,
    skip: usize,
    limit: usize,
    sort: Sort,
) -> Result<Vec<u64>> {
    let type_id = types::snapshot().relationship_type_id(type_name).ok_or(Error::NotFound)?;
    let prop_name = name.to_string();

    let mut matched = Vec::new();
    for (shard_id, shard_ids) in partition_by_shard(ids) {
        let value = value.clone();
        let prop_name = prop_name.clone();
        let page = cluster
            .on_shard(shard_id, move |shard| {
                shard.filter_ids_relationships(&shard_ids, type_id, &prop_name, op, &value, 0, usize::MAX, Sort::None)
            })
            .await?;
        matched.extend(page);
    }

    if sort == Sort::None {
        return Ok(matched.into_iter().skip(skip).take(limit).collect());
    }

    let mut by_shard = partition_by_shard(&matched);
    let mut values: FnvHashMap<u64, Value> = FnvHashMap::default();
    for (shard_id, shard_ids) in by_shard.drain(..) {
        let prop_name = prop_name.clone();
        let fetched = cluster
            .on_shard(shard_id, move |shard| {
                shard_ids
                    .into_iter()
                    .filter_map(|id| shard.relationship_property_get(id, &prop_name).ok().map(|v| (id, v)))
                    .collect::<Vec<_>>()
            })
            .await?;
        values.extend(fetched);
    }
    matched.sort_by(|a, b| {
        let cmp = compare_values(values.get(a), values.get(b));
        if sort == Sort::Descending {
            cmp.reverse()
        } else {
            cmp
        }
    });
    Ok(matched.into_iter().skip(skip).take(limit).collect())
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::I64(x)), Some(Value::I64(y))) => x.cmp(y),
        (Some(Value::F64(x)), Some(Value::F64(y))) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Boolean(x)), Some(Value::Boolean(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Intersect two sorted id lists (§6.7 "intersect").
pub fn intersect(a: &[u64], b: &[u64]) -> Vec<u64> {
    set_algebra::intersect(a, b)
}

/// Difference `a \ b` over two sorted id lists (§6.7 "difference").
pub fn difference(a: &[u64], b: &[u64]) -> Vec<u64> {
    set_algebra::difference(a, b)
}

/// Fetch full [`Node`] records for an explicit id list, fanning out only to
/// the shards those ids actually land on.
pub async fn nodes_for_ids(cluster: &Cluster, ids: &[u64]) -> Result<Vec<Node>> {
    let mut by_id: FnvHashMap<u64, Node> = FnvHashMap::default();
    for (shard_id, shard_ids) in partition_by_shard(ids) {
        let fetched = cluster
            .on_shard(shard_id, move |shard| {
                shard_ids.into_iter().map(|id| (id, shard.node_get(id))).collect::<Vec<_>>()
            })
            .await?;
        by_id.extend(fetched);
    }
    Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
}

pub async fn relationships_for_ids(cluster: &Cluster, ids: &[u64]) -> Result<Vec<Relationship>> {
    let mut by_id: FnvHashMap<u64, Relationship> = FnvHashMap::default();
    for (shard_id, shard_ids) in partition_by_shard(ids) {
        let fetched = cluster
            .on_shard(shard_id, move |shard| {
                shard_ids
                    .into_iter()
                    .map(|id| (id, shard.relationship_get(id)))
                    .collect::<Vec<_>>()
            })
            .await?;
        by_id.extend(fetched);
    }
    Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
}
