//! Bulk CSV import (original_source `graph/peered/LoadCSV.cpp`), carried in
//! as the wire contract named by spec.md §6.8: schema must already exist,
//! `:` separates a column name from its role, `key`/`<name>:key` names the
//! key column, `<name>:IGNORE` drops a column, and `start_key:<NodeType>` /
//! `end_key:<NodeType>` mark a relationship file's endpoints.

use fnv::FnvHashMap;
use serde_json::{Map, Value as Json};

use crate::cluster::Cluster;
use crate::config;
use crate::id;
use crate::Result;

/// A parsed CSV document: header names in column order, then each row as
/// the same number of string fields. Uses `csv-core`'s byte-level reader
/// directly since this crate has no use for a full `csv::Reader` on top.
fn parse(text: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv_core::Reader::new();
    let mut rows = Vec::new();
    let mut input = text.as_bytes();
    let mut field_buf = [0u8; 4096];

    loop {
        let mut record = Vec::new();
        let mut done = false;
        loop {
            let (result, consumed_in, consumed_out) = reader.read_field(input, &mut field_buf);
            input = &input[consumed_in..];
            record.push(String::from_utf8_lossy(&field_buf[..consumed_out]).into_owned());
            match result {
                csv_core::ReadFieldResult::Field { record_end } => {
                    if record_end {
                        break;
                    }
                }
                csv_core::ReadFieldResult::End => {
                    done = true;
                    break;
                }
                csv_core::ReadFieldResult::InputEmpty => {
                    if input.is_empty() {
                        done = true;
                        break;
                    }
                }
                csv_core::ReadFieldResult::OutputFull => {
                    // A field wider than the scratch buffer: truncate silently,
                    // consistent with this importer's fixed-width scratch space.
                }
            }
        }
        let is_blank = record.len() == 1 && record[0].is_empty();
        if !is_blank {
            rows.push(record);
        }
        if done {
            break;
        }
    }

    if rows.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let headers = rows.remove(0);
    (headers, rows)
}

struct Columns {
    key_index: Option<usize>,
    key_is_property: Option<String>,
    property_indices: Vec<(usize, String)>,
}

fn plan_node_columns(headers: &[String]) -> Columns {
    let mut key_index = None;
    let mut key_is_property = None;
    for (i, h) in headers.iter().enumerate() {
        if h == "key" {
            key_index = Some(i);
        } else if let Some(name) = h.strip_suffix(":key") {
            key_index = Some(i);
            key_is_property = Some(name.to_string());
        }
    }
    let property_indices = headers
        .iter()
        .enumerate()
        .filter(|&(i, h)| Some(i) != key_index && !h.ends_with(":IGNORE"))
        .map(|(i, h)| (i, h.clone()))
        .collect();
    Columns {
        key_index,
        key_is_property,
        property_indices,
    }
}

fn row_properties(row: &[String], columns: &Columns) -> Json {
    let mut map = Map::new();
    for (i, name) in &columns.property_indices {
        if let Some(value) = row.get(*i) {
            map.insert(name.clone(), Json::String(value.clone()));
        }
    }
    if let (Some(idx), Some(name)) = (columns.key_index, &columns.key_is_property) {
        if let Some(value) = row.get(idx) {
            map.insert(name.clone(), Json::String(value.clone()));
        }
    }
    Json::Object(map)
}

/// Load nodes of `type_name` from `csv_text`, returning the number created.
/// Rows with no key column use their row index (stringified) as the key,
/// matching `original_source`'s `PartitionNodesInCSV` fallback.
pub async fn load_nodes(cluster: &Cluster, type_name: &str, csv_text: &str) -> Result<u64> {
    let (headers, rows) = parse(csv_text);
    if rows.is_empty() {
        return Ok(0);
    }
    let columns = plan_node_columns(&headers);

    let mut by_shard: FnvHashMap<u16, Vec<(String, Json)>> = FnvHashMap::default();
    for (row_index, row) in rows.iter().enumerate() {
        let key = match columns.key_index {
            Some(idx) => row.get(idx).cloned().unwrap_or_default(),
            None => row_index.to_string(),
        };
        let owner = id::owning_shard_for(type_name, &key, cluster.shard_count());
        by_shard
            .entry(owner)
            .or_default()
            .push((key, row_properties(row, &columns)));
    }

    let batch_size = config::config().csv_batch_size;
    let mut total = 0u64;
    for (shard_id, entries) in by_shard {
        for chunk in entries.chunks(batch_size) {
            let type_name = type_name.to_string();
            let chunk = chunk.to_vec();
            let added = cluster
                .on_shard(shard_id, move |shard| {
                    chunk
                        .into_iter()
                        .filter(|(key, props)| shard.node_add(&type_name, key, Some(props)).is_ok())
                        .count()
                })
                .await?;
            total += added as u64;
        }
    }
    Ok(total)
}

struct RelColumns {
    start_index: usize,
    start_type: String,
    end_index: usize,
    end_type: String,
    property_indices: Vec<(usize, String)>,
}

fn plan_relationship_columns(headers: &[String]) -> Option<RelColumns> {
    let start = headers.iter().enumerate().find_map(|(i, h)| {
        h.strip_prefix("start_key:").map(|t| (i, t.to_string()))
    })?;
    let end = headers.iter().enumerate().find_map(|(i, h)| {
        h.strip_prefix("end_key:").map(|t| (i, t.to_string()))
    })?;
    let property_indices = headers
        .iter()
        .enumerate()
        .filter(|&(i, h)| i != start.0 && i != end.0 && !h.ends_with(":IGNORE"))
        .map(|(i, h)| (i, h.clone()))
        .collect();
    Some(RelColumns {
        start_index: start.0,
        start_type: start.1,
        end_index: end.0,
        end_type: end.1,
        property_indices,
    })
}

fn relationship_row_properties(row: &[String], columns: &RelColumns) -> Json {
    let mut map = Map::new();
    for (i, name) in &columns.property_indices {
        if let Some(value) = row.get(*i) {
            map.insert(name.clone(), Json::String(value.clone()));
        }
    }
    Json::Object(map)
}

/// Load relationships of `rel_type_name` from `csv_text`. Mirrors
/// `original_source`'s two-phase design: resolve every distinct end key to
/// its node id first (one fan-out), then create each relationship's
/// outgoing leg on the start node's shard and its incoming mirror on the
/// end node's shard (a second fan-out, batched per shard).
pub async fn load_relationships(cluster: &Cluster, rel_type_name: &str, csv_text: &str) -> Result<u64> {
    let (headers, rows) = parse(csv_text);
    if rows.is_empty() {
        return Ok(0);
    }
    let Some(columns) = plan_relationship_columns(&headers) else {
        return Ok(0);
    };

    let mut end_keys: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get(columns.end_index).cloned())
        .collect();
    end_keys.sort();
    end_keys.dedup();
    let end_ids = resolve_ids(cluster, &columns.end_type, &end_keys).await?;

    let mut by_start_shard: FnvHashMap<u16, Vec<(String, u64, Json)>> = FnvHashMap::default();
    for row in &rows {
        let Some(start_key) = row.get(columns.start_index) else {
            continue;
        };
        let Some(end_key) = row.get(columns.end_index) else {
            continue;
        };
        let Some(&end_id) = end_ids.get(end_key.as_str()) else {
            continue;
        };
        let owner = id::owning_shard_for(&columns.start_type, start_key, cluster.shard_count());
        by_start_shard
            .entry(owner)
            .or_default()
            .push((start_key.clone(), end_id, relationship_row_properties(row, &columns)));
    }

    let mut second_leg: FnvHashMap<u16, Vec<(u16, u64, u64, u64)>> = FnvHashMap::default();
    let mut total = 0u64;
    let batch_size = config::config().csv_batch_size;
    for (shard_id, entries) in by_start_shard {
        for chunk in entries.chunks(batch_size) {
            let start_type = columns.start_type.clone();
            let rel_type_name = rel_type_name.to_string();
            let chunk = chunk.to_vec();
            let created = cluster
                .on_shard(shard_id, move |shard| {
                    chunk
                        .into_iter()
                        .filter_map(|(start_key, end_id, props)| {
                            let start_id = shard.node_get_id(&start_type, &start_key);
                            if start_id == id::INVALID {
                                return None;
                            }
                            let rel_id = shard
                                .relationship_add_to_outgoing(&rel_type_name, start_id, end_id, Some(&props))
                                .ok()?;
                            (rel_id != id::INVALID).then(|| {
                                let (_, rel_type_id, _) = id::decode(rel_id);
                                (rel_type_id, rel_id, start_id, end_id)
                            })
                        })
                        .collect::<Vec<_>>()
                })
                .await?;
            for (rel_type_id, rel_id, start_id, end_id) in created {
                total += 1;
                second_leg
                    .entry(id::shard_of(end_id))
                    .or_default()
                    .push((rel_type_id, rel_id, start_id, end_id));
            }
        }
    }

    for (shard_id, entries) in second_leg {
        for chunk in entries.chunks(batch_size) {
            let chunk = chunk.to_vec();
            cluster
                .on_shard(shard_id, move |shard| {
                    for (rel_type_id, rel_id, start_id, end_id) in chunk {
                        shard.relationship_add_to_incoming(rel_type_id, rel_id, start_id, end_id);
                    }
                })
                .await?;
        }
    }

    Ok(total)
}

/// Resolve `keys` of node type `type_name` to their ids, one dispatch per
/// shard the keys land on (`original_source`'s `NodesGetIdsPeered`).
async fn resolve_ids(
    cluster: &Cluster,
    type_name: &str,
    keys: &[String],
) -> Result<FnvHashMap<String, u64>> {
    let mut by_shard: FnvHashMap<u16, Vec<String>> = FnvHashMap::default();
    for key in keys {
        let owner = id::owning_shard_for(type_name, key, cluster.shard_count());
        by_shard.entry(owner).or_default().push(key.clone());
    }

    let mut out = FnvHashMap::default();
    for (shard_id, shard_keys) in by_shard {
        let type_name = type_name.to_string();
        let resolved = cluster
            .on_shard(shard_id, move |shard| {
                shard_keys
                    .into_iter()
                    .map(|key| {
                        let id = shard.node_get_id(&type_name, &key);
                        (key, id)
                    })
                    .collect::<Vec<_>>()
            })
            .await?;
        out.extend(resolved.into_iter().filter(|(_, id)| *id != id::INVALID));
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ShardConfig;
    use crate::peered::nodes;

    #[tokio::test]
    async fn loads_nodes_with_key_property_column() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 2,
            ..ShardConfig::default()
        });
        let csv = "product_id:key,name\n3,Chocolate\n4,Milk\n";
        let count = load_nodes(&cluster, "Product", csv).await.unwrap();
        assert_eq!(count, 2);
        let node = nodes::get_by_key(&cluster, "Product", "3").await.unwrap();
        assert_eq!(node.properties.get("name").unwrap(), "Chocolate");
        assert_eq!(node.properties.get("product_id").unwrap(), "3");
    }

    #[tokio::test]
    async fn loads_nodes_without_key_column_uses_row_index() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 1,
            ..ShardConfig::default()
        });
        let csv = "name\nChocolate\nMilk\n";
        let count = load_nodes(&cluster, "Product", csv).await.unwrap();
        assert_eq!(count, 2);
        let node = nodes::get_by_key(&cluster, "Product", "0").await.unwrap();
        assert_eq!(node.properties.get("name").unwrap(), "Chocolate");
    }
}
