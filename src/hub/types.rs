use serde::{Deserialize, Serialize};

/// Lifecycle state of the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HubState {
    Disabled,
    /// Authorized but not relaying
    Enabled,
    /// Authorized and relaying/caching
    Active,
}

impl HubState {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, HubState::Disabled)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, HubState::Active)
    }
}

impl std::fmt::Display for HubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HubState::Disabled => "disabled",
            HubState::Enabled => "enabled",
            HubState::Active => "active",
        };
        f.write_str(name)
    }
}

/// Lifecycle requests handled by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HubEvent {
    Enable,
    Disable,
    Activate,
    Deactivate,
}

/// Read-only snapshot of the hub for observers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStatus {
    pub enabled: bool,
    pub active: bool,
    pub connected_peer_count: usize,
    pub cached_message_count: usize,
    pub pending_gateway_sync_count: usize,
}

impl std::fmt::Display for HubStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.active {
            "active"
        } else if self.enabled {
            "enabled"
        } else {
            "disabled"
        };
        write!(
            f,
            "Hub {}: {} peers connected, {} cached, {} pending gateway sync",
            state,
            self.connected_peer_count,
            self.cached_message_count,
            self.pending_gateway_sync_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_flags() {
        assert!(!HubState::Disabled.is_enabled());
        assert!(HubState::Enabled.is_enabled());
        assert!(!HubState::Enabled.is_active());
        assert!(HubState::Active.is_enabled());
        assert!(HubState::Active.is_active());
    }

    #[test]
    fn test_status_display() {
        let status = HubStatus {
            enabled: true,
            active: true,
            connected_peer_count: 3,
            cached_message_count: 7,
            pending_gateway_sync_count: 1,
        };

        assert_eq!(
            status.to_string(),
            "Hub active: 3 peers connected, 7 cached, 1 pending gateway sync"
        );
    }
}
