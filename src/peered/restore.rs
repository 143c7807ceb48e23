//! Replay-log restore (`original_source/src/graph/peered/Restore.cpp`).
//!
//! The original tails a `.restore` file of recorded HTTP requests and
//! replays each one against the live HTTP surface, logging (not aborting
//! on) any request that fails. That HTTP surface is outside this crate's
//! scope (§C non-goals), so what's carried here is the shape: an ordered
//! sequence of already-peered-API operations, replayed one at a time
//! through the same dispatch path live traffic uses, with a failure on one
//! entry logged and skipped rather than stopping the replay.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cluster::Cluster;
use crate::peered::{nodes, relationships};

/// One entry of a restore log, already resolved to the peered operation it
/// names — the equivalent of one parsed line of the original's HTTP
/// replay, minus the HTTP envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    AddNode {
        type_name: String,
        key: String,
        properties: Option<serde_json::Value>,
    },
    RemoveNode {
        id: u64,
    },
    AddRelationship {
        rel_type: String,
        starting_id: u64,
        ending_id: u64,
        properties: Option<serde_json::Value>,
    },
    RemoveRelationship {
        id: u64,
    },
}

/// Outcome of replaying one log entry.
pub struct Outcome {
    pub index: usize,
    pub ok: bool,
}

/// Replay `log` against `cluster` in order. A failing entry is logged and
/// the replay continues, matching the original's per-line try/catch.
pub async fn restore(cluster: &Cluster, log: &[Operation]) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(log.len());
    for (index, op) in log.iter().enumerate() {
        let ok = apply(cluster, op).await;
        if !ok {
            warn!(index, "restore entry failed, continuing replay");
        }
        outcomes.push(Outcome { index, ok });
    }
    outcomes
}

async fn apply(cluster: &Cluster, op: &Operation) -> bool {
    match op {
        Operation::AddNode {
            type_name,
            key,
            properties,
        } => nodes::add(cluster, type_name, key, properties.clone())
            .await
            .map(|id| id != crate::id::INVALID)
            .unwrap_or(false),
        Operation::RemoveNode { id } => nodes::remove(cluster, *id).await.unwrap_or(false),
        Operation::AddRelationship {
            rel_type,
            starting_id,
            ending_id,
            properties,
        } => relationships::add(cluster, rel_type, *starting_id, *ending_id, properties.clone())
            .await
            .map(|id| id != crate::id::INVALID)
            .unwrap_or(false),
        Operation::RemoveRelationship { id } => relationships::remove(cluster, *id).await.unwrap_or(false),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ShardConfig;

    #[tokio::test]
    async fn replays_log_in_order() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 1,
            ..ShardConfig::default()
        });
        let a = nodes::add(&cluster, "Person", "a", None).await.unwrap();
        let b = nodes::add(&cluster, "Person", "b", None).await.unwrap();
        let log = vec![
            Operation::AddNode {
                type_name: "Person".to_string(),
                key: "c".to_string(),
                properties: None,
            },
            Operation::AddRelationship {
                rel_type: "KNOWS".to_string(),
                starting_id: a,
                ending_id: b,
                properties: None,
            },
        ];
        let outcomes = restore(&cluster, &log).await;
        assert!(outcomes.iter().all(|o| o.ok));
    }

    #[tokio::test]
    async fn failing_entry_is_logged_and_replay_continues() {
        crate::types::reset_for_test();
        let cluster = Cluster::new(&ShardConfig {
            shards: 1,
            ..ShardConfig::default()
        });
        let log = vec![
            Operation::RemoveNode { id: crate::id::INVALID },
            Operation::AddNode {
                type_name: "Person".to_string(),
                key: "a".to_string(),
                properties: None,
            },
        ];
        let outcomes = restore(&cluster, &log).await;
        assert!(!outcomes[0].ok);
        assert!(outcomes[1].ok);
    }
}
