//! Peered health check (`original_source/src/main/handlers/HealthCheck.cpp`):
//! fan out the shard-local liveness probe to every shard and report which,
//! if any, failed to answer.

use crate::cluster::Cluster;
use crate::Result;

/// Ask every shard to report in. `Err` entries name the shard that didn't
/// answer (overloaded inbox or a dead executor task), everything else
/// returns that shard's probe string.
pub async fn check_all(cluster: &Cluster) -> Vec<Result<String>> {
    cluster.on_all(|shard| shard.health_check()).await
}

/// `true` only if every shard answered.
pub async fn all_healthy(cluster: &Cluster) -> bool {
    check_all(cluster).await.iter().all(Result::is_ok)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ShardConfig;

    #[tokio::test]
    async fn every_shard_reports_healthy() {
        let cluster = Cluster::new(&ShardConfig {
            shards: 3,
            ..ShardConfig::default()
        });
        assert!(all_healthy(&cluster).await);
        let reports = check_all(&cluster).await;
        assert_eq!(reports.len(), 3);
        for (i, report) in reports.into_iter().enumerate() {
            assert_eq!(report.unwrap(), format!("shard {i} ok"));
        }
    }
}
