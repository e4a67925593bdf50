//! Relay types and configuration

use serde::{Deserialize, Serialize};

/// Configuration for the relay amplifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplifierConfig {
    /// Content markers (matched case-insensitively) that make a message eligible
    pub urgent_markers: Vec<String>,

    /// Maximum broadcasts per second (0 = unlimited)
    pub max_relays_per_second: u32,

    /// How many recently relayed message ids are remembered
    pub dedup_capacity: usize,
}

impl Default for AmplifierConfig {
    fn default() -> Self {
        Self {
            urgent_markers: vec!["URGENT".into(), "PRESENCE".into()],
            max_relays_per_second: 20,
            dedup_capacity: 1024,
        }
    }
}

/// Result of a relay attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Handed to the transport with one hop consumed
    Relayed { remaining_ttl: u8 },

    /// Hop budget already spent
    TtlExhausted,

    /// Same message id was relayed before
    Duplicate,

    /// Broadcast rate limit reached
    Throttled,

    /// Transport reported a failure
    Failed(String),
}

impl RelayOutcome {
    pub fn is_relayed(&self) -> bool {
        matches!(self, RelayOutcome::Relayed { .. })
    }

    /// Metric label for this outcome
    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Relayed { .. } => "relayed",
            RelayOutcome::TtlExhausted => "ttl_exhausted",
            RelayOutcome::Duplicate => "duplicate",
            RelayOutcome::Throttled => "throttled",
            RelayOutcome::Failed(_) => "failed",
        }
    }
}

/// Statistics for the relay amplifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStats {
    pub relayed: u64,
    pub ttl_exhausted: u64,
    pub duplicates: u64,
    pub throttled: u64,
    pub failed: u64,
}

impl RelayStats {
    /// Share of relay attempts that reached the transport successfully
    pub fn success_rate(&self) -> f64 {
        let total = self.relayed + self.failed;
        if total == 0 {
            return 100.0;
        }
        self.relayed as f64 / total as f64 * 100.0
    }
}

impl std::fmt::Display for RelayStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Relay: {} relayed, {} failed ({:.1}% success), {} exhausted, {} duplicate, {} throttled",
            self.relayed,
            self.failed,
            self.success_rate(),
            self.ttl_exhausted,
            self.duplicates,
            self.throttled
        )
    }
}
