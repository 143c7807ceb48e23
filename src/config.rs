//! Process configuration (SPEC_FULL §A.3): loaded once at startup from TOML,
//! published behind an `ArcSwap` the same way the schema registry publishes
//! its snapshots, so every shard and every admin call reads a consistent
//! point-in-time view without taking a lock.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShardConfig {
    /// Number of shards, `S` throughout the spec. Fixed for the process
    /// lifetime: changing it would invalidate every id already handed out.
    pub shards: u16,
    /// Bounded inbox capacity per shard executor (§5). A dispatch beyond
    /// this depth fails fast with `Error::Overloaded` instead of queuing
    /// unboundedly.
    pub inbox_capacity: usize,
    /// Row batch size for CSV bulk import (SPEC_FULL §B.3).
    pub csv_batch_size: usize,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            shards: 4,
            inbox_capacity: 4096,
            csv_batch_size: 1024,
        }
    }
}

static CONFIG: Lazy<ArcSwap<ShardConfig>> = Lazy::new(|| ArcSwap::from_pointee(ShardConfig::default()));

/// A lock-free, point-in-time view of the running configuration.
pub fn config() -> Arc<ShardConfig> {
    CONFIG.load_full()
}

/// Replace the running configuration wholesale. Intended for startup and
/// for tests; there is no notion of a partial config update.
pub fn set_config(cfg: ShardConfig) {
    CONFIG.store(Arc::new(cfg));
}

/// Parse and install a TOML config file, mirroring the shape of the
/// teacher's `config::core::Config::load`.
pub fn load(path: impl AsRef<Path>) -> Result<ShardConfig> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        crate::Error::InvalidArgument(format!("reading {}: {e}", path.as_ref().display()))
    })?;
    let cfg: ShardConfig = toml::from_str(&text)
        .map_err(|e| crate::Error::InvalidArgument(format!("parsing config: {e}")))?;
    set_config(cfg.clone());
    Ok(cfg)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let cfg = ShardConfig::default();
        assert!(cfg.shards > 0);
        assert!(cfg.inbox_capacity > 0);
    }

    #[test]
    fn load_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragedb.toml");
        std::fs::write(&path, "shards = 8\ninbox_capacity = 256\ncsv_batch_size = 32\n").unwrap();
        let cfg = load(&path).unwrap();
        assert_eq!(cfg.shards, 8);
        assert_eq!(cfg.inbox_capacity, 256);
        assert_eq!(config().shards, 8);
    }
}
