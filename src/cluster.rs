//! Holds every shard's executor handle and routes dispatches to the right
//! one (§4.1 "owning shard", §5). Grounded on the teacher's
//! `backend::pool::Cluster`, which plays the identical role of owning every
//! per-database shard and routing requests to them.

use std::sync::Arc;

use futures::future::join_all;

use crate::config::ShardConfig;
use crate::executor::Executor;
use crate::id;
use crate::shard::Shard;
use crate::{Error, Result};

#[derive(Clone)]
pub struct Cluster {
    executors: Arc<Vec<Executor>>,
}

impl Cluster {
    /// Spin up `cfg.shards` executors, each owning an empty [`Shard`].
    pub fn new(cfg: &ShardConfig) -> Self {
        let executors = (0..cfg.shards)
            .map(|shard_id| Executor::spawn(Shard::new(shard_id, cfg.shards), cfg.inbox_capacity))
            .collect();
        Self {
            executors: Arc::new(executors),
        }
    }

    pub fn shard_count(&self) -> u16 {
        self.executors.len() as u16
    }

    pub fn shard(&self, shard_id: u16) -> Result<&Executor> {
        self.executors.get(shard_id as usize).ok_or(Error::ShardGone)
    }

    /// Run `f` on the shard that owns external id `id`.
    pub async fn on_owner<F, T>(&self, id: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut Shard) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.shard(id::shard_of(id))?.dispatch(f).await
    }

    /// Run `f` on a specific shard id directly, for callers (node creation,
    /// CSV import) that already computed the owning shard from `(type, key)`
    /// rather than from an existing external id.
    pub async fn on_shard<F, T>(&self, shard_id: u16, f: F) -> Result<T>
    where
        F: FnOnce(&mut Shard) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.shard(shard_id)?.dispatch(f).await
    }

    /// Run `f` on every shard concurrently, one dispatch each (§4.7 "never
    /// one sub-call per id"), returning results in ascending shard order.
    pub async fn on_all<F, T>(&self, f: F) -> Vec<Result<T>>
    where
        F: Fn(&mut Shard) -> T + Send + Sync + 'static,
        T: Send + 'static,
    {
        let f = Arc::new(f);
        let futures = self.executors.iter().map(|executor| {
            let f = f.clone();
            executor.dispatch(move |shard| f(shard))
        });
        join_all(futures).await
    }

    /// Run `f` on exactly the shards in `shard_ids`, concurrently.
    pub async fn on_shards<F, T>(&self, shard_ids: impl IntoIterator<Item = u16>, f: F) -> Vec<Result<T>>
    where
        F: Fn(&mut Shard) -> T + Send + Sync + 'static,
        T: Send + 'static,
    {
        let f = Arc::new(f);
        let futures: Vec<_> = shard_ids
            .into_iter()
            .filter_map(|shard_id| self.shard(shard_id).ok())
            .map(|executor| {
                let f = f.clone();
                executor.dispatch(move |shard| f(shard))
            })
            .collect();
        join_all(futures).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ShardConfig;

    #[tokio::test]
    async fn routes_to_owning_shard() {
        let cluster = Cluster::new(&ShardConfig {
            shards: 4,
            ..ShardConfig::default()
        });
        let id = cluster
            .on_owner(id::encode(2, 0, 0), |shard| shard.id())
            .await
            .unwrap();
        assert_eq!(id, 2);
    }

    #[tokio::test]
    async fn on_all_covers_every_shard() {
        let cluster = Cluster::new(&ShardConfig {
            shards: 3,
            ..ShardConfig::default()
        });
        let ids: Vec<u16> = cluster
            .on_all(|shard| shard.id())
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
