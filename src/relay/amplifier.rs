//! Relay amplifier implementation

use crate::collab::Transport;
use crate::message::Message;
use crate::relay::types::{AmplifierConfig, RelayOutcome, RelayStats};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct RelayStatsInner {
    relayed: AtomicU64,
    ttl_exhausted: AtomicU64,
    duplicates: AtomicU64,
    throttled: AtomicU64,
    failed: AtomicU64,
}

/// Re-broadcasts eligible messages to extend mesh reach
pub struct RelayAmplifier {
    transport: Arc<dyn Transport>,
    markers: Vec<String>,
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    recently_relayed: Mutex<LruCache<String, ()>>,
    stats: RelayStatsInner,
}

impl RelayAmplifier {
    pub fn new(transport: Arc<dyn Transport>, config: &AmplifierConfig) -> Self {
        let limiter = NonZeroU32::new(config.max_relays_per_second)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));
        let capacity = NonZeroUsize::new(config.dedup_capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            transport,
            markers: config
                .urgent_markers
                .iter()
                .map(|marker| marker.to_lowercase())
                .collect(),
            limiter,
            recently_relayed: Mutex::new(LruCache::new(capacity)),
            stats: RelayStatsInner::default(),
        }
    }

    /// Check if a message deserves amplification
    ///
    /// True for content carrying an urgent/presence marker, and always for
    /// traffic sent by the hub operator.
    pub fn should_amplify(&self, message: &Message, owner_id: &str) -> bool {
        if message.sender_id == owner_id {
            return true;
        }

        let content = message.content.to_lowercase();
        self.markers
            .iter()
            .any(|marker| content.contains(marker.as_str()))
    }

    /// Re-broadcast `message` to every peer except `exclude_peer_id`
    ///
    /// The broadcast copy carries one hop less than `message`. Transport
    /// failures are logged and reported, never retried.
    pub async fn relay(&self, message: &Message, exclude_peer_id: Option<&str>) -> RelayOutcome {
        let outcome = self.try_relay(message, exclude_peer_id).await;

        let counter = match &outcome {
            RelayOutcome::Relayed { .. } => &self.stats.relayed,
            RelayOutcome::TtlExhausted => &self.stats.ttl_exhausted,
            RelayOutcome::Duplicate => &self.stats.duplicates,
            RelayOutcome::Throttled => &self.stats.throttled,
            RelayOutcome::Failed(_) => &self.stats.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_relay(outcome.label());

        outcome
    }

    async fn try_relay(&self, message: &Message, exclude_peer_id: Option<&str>) -> RelayOutcome {
        if message.ttl_exhausted() {
            tracing::debug!(message_id = %message.id, "Relay skipped, TTL exhausted");
            return RelayOutcome::TtlExhausted;
        }

        let seen_before = self
            .recently_relayed
            .lock()
            .put(message.id.clone(), ())
            .is_some();
        if seen_before {
            tracing::debug!(message_id = %message.id, "Relay skipped, already relayed");
            return RelayOutcome::Duplicate;
        }

        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                // A throttled message may still be relayed by a later copy
                self.recently_relayed.lock().pop(&message.id);
                tracing::debug!(message_id = %message.id, "Relay throttled");
                return RelayOutcome::Throttled;
            }
        }

        let hop = message.next_hop();
        match self.transport.broadcast(&hop, exclude_peer_id).await {
            Ok(()) => {
                tracing::debug!(
                    message_id = %message.id,
                    remaining_ttl = hop.ttl,
                    "Relayed message"
                );
                RelayOutcome::Relayed {
                    remaining_ttl: hop.ttl,
                }
            }
            Err(e) => {
                tracing::warn!(message_id = %message.id, error = %e, "Relay broadcast failed");
                RelayOutcome::Failed(e.to_string())
            }
        }
    }

    /// Get current statistics
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            relayed: self.stats.relayed.load(Ordering::Relaxed),
            ttl_exhausted: self.stats.ttl_exhausted.load(Ordering::Relaxed),
            duplicates: self.stats.duplicates.load(Ordering::Relaxed),
            throttled: self.stats.throttled.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::InMemoryTransport;
    use crate::message::MessageBuilder;

    fn create_amplifier(config: AmplifierConfig) -> (RelayAmplifier, InMemoryTransport) {
        let transport = InMemoryTransport::new();
        let amplifier = RelayAmplifier::new(Arc::new(transport.clone()), &config);
        (amplifier, transport)
    }

    #[test]
    fn test_should_amplify() {
        let (amplifier, _) = create_amplifier(AmplifierConfig::default());

        let urgent = MessageBuilder::new("bob").content("urgent: need water").build();
        let presence = MessageBuilder::new("bob").content("[PRESENCE] bob here").build();
        let chatter = MessageBuilder::new("bob").content("lunch?").build();
        let own = MessageBuilder::new("operator").content("lunch?").build();

        assert!(amplifier.should_amplify(&urgent, "operator"));
        assert!(amplifier.should_amplify(&presence, "operator"));
        assert!(!amplifier.should_amplify(&chatter, "operator"));
        assert!(amplifier.should_amplify(&own, "operator"));
    }

    #[tokio::test]
    async fn test_relay_decrements_ttl() {
        let (amplifier, transport) = create_amplifier(AmplifierConfig::default());
        let message = MessageBuilder::new("bob").content("URGENT").ttl(3).build();

        let outcome = amplifier.relay(&message, Some("bob")).await;

        assert_eq!(outcome, RelayOutcome::Relayed { remaining_ttl: 2 });
        let broadcasts = transport.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].message.ttl, 2);
        assert_eq!(broadcasts[0].excluded.as_deref(), Some("bob"));
        assert_eq!(message.ttl, 3);
    }

    #[tokio::test]
    async fn test_ttl_exhausted_never_broadcast() {
        let (amplifier, transport) = create_amplifier(AmplifierConfig::default());
        let message = MessageBuilder::new("bob").content("URGENT").ttl(0).build();

        let outcome = amplifier.relay(&message, None).await;

        assert_eq!(outcome, RelayOutcome::TtlExhausted);
        assert!(transport.broadcasts().is_empty());
        assert_eq!(amplifier.stats().ttl_exhausted, 1);
    }

    #[tokio::test]
    async fn test_duplicate_relay_suppressed() {
        let (amplifier, transport) = create_amplifier(AmplifierConfig::default());
        let message = MessageBuilder::new("bob").content("URGENT").build();

        amplifier.relay(&message, None).await;
        let second = amplifier.relay(&message, None).await;

        assert_eq!(second, RelayOutcome::Duplicate);
        assert_eq!(transport.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_throttle() {
        let (amplifier, transport) = create_amplifier(AmplifierConfig {
            max_relays_per_second: 1,
            ..Default::default()
        });

        let first = MessageBuilder::new("bob").content("URGENT 1").build();
        let second = MessageBuilder::new("bob").content("URGENT 2").build();

        assert!(amplifier.relay(&first, None).await.is_relayed());
        assert_eq!(amplifier.relay(&second, None).await, RelayOutcome::Throttled);
        assert_eq!(transport.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let (amplifier, transport) = create_amplifier(AmplifierConfig::default());
        transport.fail_broadcasts(true);
        let message = MessageBuilder::new("bob").content("URGENT").build();

        let outcome = amplifier.relay(&message, None).await;

        assert!(matches!(outcome, RelayOutcome::Failed(_)));
        assert_eq!(amplifier.stats().failed, 1);
    }
}
