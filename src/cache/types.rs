use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the offline cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum messages held per peer
    pub max_messages_per_peer: usize,

    /// How long a message may stay cached
    pub retention: Duration,

    /// How often the hub sweeps expired messages while active
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_messages_per_peer: 50,
            retention: Duration::from_secs(24 * 60 * 60), // 24 hours
            sweep_interval: Duration::from_secs(15 * 60),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Messages currently cached across all peers
    pub cached_messages: u64,

    /// Peers with a non-empty mailbox
    pub peers: u64,

    /// Total insertions (after deduplication)
    pub total_cached: u64,

    /// Messages evicted by the per-peer bound
    pub total_evicted: u64,

    /// Messages removed by the retention sweep
    pub total_expired: u64,

    /// Messages handed out by drains
    pub total_drained: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} messages for {} peers ({} evicted, {} expired, {} drained)",
            self.cached_messages,
            self.peers,
            self.total_evicted,
            self.total_expired,
            self.total_drained
        )
    }
}
