/*!
 * Synchronization Configuration
 *
 * Runtime tuning for critical sections and the named-semaphore registry
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment overrides understood by [`SyncConfig::from_env`]
pub const ENV_SPIN_LIMIT: &str = "VSTOOLS_SPIN_LIMIT";
pub const ENV_REGISTRY_SHARDS: &str = "VSTOOLS_REGISTRY_SHARDS";
pub const ENV_DEFAULT_WAIT_MS: &str = "VSTOOLS_DEFAULT_WAIT_MS";

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Spin/yield iterations a contended `enter` performs before parking
    pub spin_limit: u32,
    /// Shard count of the semaphore registry map (power of 2)
    pub registry_shards: usize,
    /// Timeout used by the `*_default` acquisition helpers (`None` = forever)
    pub default_wait: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            spin_limit: 40,
            registry_shards: default_shards(),
            default_wait: None,
        }
    }
}

impl SyncConfig {
    /// Guards expected to be held for well under a microsecond
    pub fn low_latency() -> Self {
        Self {
            spin_limit: 200,
            ..Self::default()
        }
    }

    /// Guards that may be held across slower work: park almost immediately
    pub fn long_wait() -> Self {
        Self {
            spin_limit: 4,
            ..Self::default()
        }
    }

    /// Default configuration overlaid with `VSTOOLS_*` environment variables
    ///
    /// Malformed values are ignored and logged.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(spins) = env_parse::<u32>(ENV_SPIN_LIMIT) {
            config.spin_limit = spins;
        }
        if let Some(shards) = env_parse::<usize>(ENV_REGISTRY_SHARDS) {
            config.registry_shards = shards;
        }
        if let Some(ms) = env_parse::<u64>(ENV_DEFAULT_WAIT_MS) {
            config.default_wait = Some(Duration::from_millis(ms));
        }

        config.normalized()
    }

    /// Clamp shard count to a power of two in `[2, 512]` (the map needs more than one shard)
    pub fn normalized(mut self) -> Self {
        self.registry_shards = self.registry_shards.clamp(2, 512).next_power_of_two();
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring malformed sync configuration value");
            None
        }
    }
}

/// CPU-proportional shard count (power of 2, at least 4)
fn default_shards() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8);
    (cpus * 4).next_power_of_two().clamp(4, 512)
}
