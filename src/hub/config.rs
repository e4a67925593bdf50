use crate::cache::CacheConfig;
use crate::gateway::SyncConfig;
use crate::hub::error::{HubError, HubResult};
use crate::presence::PresenceConfig;
use crate::relay::AmplifierConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the hub and its components
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub presence: PresenceConfig,
    pub cache: CacheConfig,
    pub relay: AmplifierConfig,
    pub gateway: SyncConfig,
}

impl HubConfig {
    /// Parse a JSON document, defaulting any missing field
    pub fn from_json(json: &str) -> HubResult<Self> {
        let config: HubConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HubResult<()> {
        if self.cache.max_messages_per_peer == 0 {
            return Err(HubError::InvalidConfig(
                "cache.max_messages_per_peer must be at least 1".into(),
            ));
        }

        if self.cache.sweep_interval == Duration::ZERO {
            return Err(HubError::InvalidConfig(
                "cache.sweep_interval must be non-zero".into(),
            ));
        }

        if self.presence.offline_window < self.presence.connected_window {
            return Err(HubError::InvalidConfig(format!(
                "presence.offline_window ({:?}) is shorter than presence.connected_window ({:?})",
                self.presence.offline_window, self.presence.connected_window
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HubConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.max_messages_per_peer, 50);
        assert_eq!(config.presence.connected_window, Duration::from_secs(60));
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let config = HubConfig::from_json(
            r#"{ "cache": { "max_messages_per_peer": 10 }, "gateway": { "max_attempts": 3 } }"#,
        )
        .unwrap();

        assert_eq!(config.cache.max_messages_per_peer, 10);
        assert_eq!(config.cache.retention, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.gateway.max_attempts, Some(3));
        assert_eq!(config.relay, AmplifierConfig::default());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let zero_bound = HubConfig::from_json(r#"{ "cache": { "max_messages_per_peer": 0 } }"#);
        assert!(matches!(zero_bound, Err(HubError::InvalidConfig(_))));

        let malformed = HubConfig::from_json("{ not json");
        assert!(matches!(malformed, Err(HubError::Config(_))));
    }

    #[test]
    fn test_inverted_windows_rejected() {
        let mut config = HubConfig::default();
        config.presence.offline_window = Duration::from_secs(30);

        assert!(matches!(
            config.validate(),
            Err(HubError::InvalidConfig(_))
        ));
    }
}
