use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification windows for presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Peers seen within this window count as connected
    pub connected_window: Duration,

    /// Peers not seen within this window count as offline
    pub offline_window: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            connected_window: Duration::from_secs(60),
            offline_window: Duration::from_secs(5 * 60),
        }
    }
}
