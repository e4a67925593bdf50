use crate::presence::types::PresenceConfig;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use std::time::Duration;

/// Last-seen bookkeeping for mesh peers
///
/// Records are never deleted. A peer can be neither connected nor offline
/// while it sits between the two windows.
pub struct PresenceTracker {
    last_seen: DashMap<String, DateTime<Utc>>,
    config: PresenceConfig,
}

impl PresenceTracker {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            last_seen: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Record an observation of `peer_id`
    pub fn observe(&self, peer_id: &str, timestamp: DateTime<Utc>) {
        // Late-arriving observations never move last-seen backwards
        self.last_seen
            .entry(peer_id.to_string())
            .and_modify(|seen| {
                if timestamp > *seen {
                    *seen = timestamp;
                }
            })
            .or_insert(timestamp);
    }

    pub fn last_seen(&self, peer_id: &str) -> Option<DateTime<Utc>> {
        self.last_seen.get(peer_id).map(|seen| *seen)
    }

    /// Check if `peer_id` was observed within the connected window
    pub fn is_connected(&self, peer_id: &str, now: DateTime<Utc>) -> bool {
        self.since_last_seen(peer_id, now)
            .map(|elapsed| elapsed < self.config.connected_window)
            .unwrap_or(false)
    }

    /// Check if `peer_id` has not been observed within the offline window
    ///
    /// A peer that was never observed is offline.
    pub fn is_offline(&self, peer_id: &str, now: DateTime<Utc>) -> bool {
        self.since_last_seen(peer_id, now)
            .map(|elapsed| elapsed > self.config.offline_window)
            .unwrap_or(true)
    }

    /// Peers currently classified connected
    pub fn snapshot_connected(&self, now: DateTime<Utc>) -> HashSet<String> {
        self.last_seen
            .iter()
            .filter(|entry| elapsed(*entry.value(), now) < self.config.connected_window)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Peers currently classified offline
    pub fn snapshot_offline(&self, now: DateTime<Utc>) -> Vec<String> {
        self.last_seen
            .iter()
            .filter(|entry| elapsed(*entry.value(), now) > self.config.offline_window)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn connected_count(&self, now: DateTime<Utc>) -> usize {
        self.last_seen
            .iter()
            .filter(|entry| elapsed(*entry.value(), now) < self.config.connected_window)
            .count()
    }

    /// Every peer ever observed
    pub fn known_peers(&self) -> Vec<String> {
        self.last_seen.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    fn since_last_seen(&self, peer_id: &str, now: DateTime<Utc>) -> Option<Duration> {
        self.last_seen(peer_id).map(|seen| elapsed(seen, now))
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(PresenceConfig::default())
    }
}

fn elapsed(seen: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - seen).to_std().unwrap_or_default()
}
