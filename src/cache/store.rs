use crate::cache::types::{CacheConfig, CacheStats};
use crate::message::Message;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct CacheCounters {
    cached: AtomicU64,
    evicted: AtomicU64,
    expired: AtomicU64,
    drained: AtomicU64,
}

/// Per-peer mailboxes of messages awaiting delivery
///
/// Each mailbox lives under its own map shard lock, so insertions for
/// unrelated peers do not contend and insertions for one peer apply in
/// call order.
pub struct OfflineCache {
    entries: DashMap<String, VecDeque<Arc<Message>>>,
    max_per_peer: usize,
    counters: CacheCounters,
}

impl OfflineCache {
    pub fn new(max_per_peer: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_per_peer: max_per_peer.max(1),
            counters: CacheCounters::default(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_messages_per_peer)
    }

    /// Check if a message is worth caching
    ///
    /// Channel and direct messages are; control frames carrying neither a
    /// channel nor a recipient are not.
    pub fn should_cache(message: &Message) -> bool {
        !message.channel_id.is_empty() || message.recipient_id.is_some()
    }

    /// Append `message` to the mailbox of every target except `exclude_peer_id`
    ///
    /// Returns the number of mailboxes the message was added to.
    pub fn cache_for_offline_peers<'a, I>(
        &self,
        message: &Arc<Message>,
        exclude_peer_id: &str,
        targets: I,
    ) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.cache_for_peers_where(message, exclude_peer_id, targets, |_| true)
    }

    /// Like [`cache_for_offline_peers`](Self::cache_for_offline_peers), but
    /// skips targets for which `still_offline` returns false
    ///
    /// The check runs while the peer's mailbox is locked, so a concurrent
    /// [`drain`](Self::drain) for a peer that just came back either sees the
    /// message or the message is never stored.
    pub fn cache_for_peers_where<'a, I, P>(
        &self,
        message: &Arc<Message>,
        exclude_peer_id: &str,
        targets: I,
        still_offline: P,
    ) -> usize
    where
        I: IntoIterator<Item = &'a str>,
        P: Fn(&str) -> bool,
    {
        let mut inserted = 0;

        for peer_id in targets {
            if peer_id == exclude_peer_id {
                continue;
            }

            let entry = self.entries.entry(peer_id.to_string());
            if !still_offline(peer_id) {
                continue;
            }
            let mut mailbox = entry.or_default();

            if mailbox.iter().any(|cached| cached.id == message.id) {
                continue;
            }

            mailbox.push_back(Arc::clone(message));
            inserted += 1;

            while mailbox.len() > self.max_per_peer {
                if let Some(evicted) = mailbox.pop_front() {
                    tracing::debug!(
                        peer_id,
                        message_id = %evicted.id,
                        "Evicted oldest cached message"
                    );
                    self.counters.evicted.fetch_add(1, Ordering::Relaxed);
                    crate::metrics::record_cache_evicted();
                }
            }
        }

        if inserted > 0 {
            self.counters
                .cached
                .fetch_add(inserted as u64, Ordering::Relaxed);
            crate::metrics::record_messages_cached(inserted);
        }

        inserted
    }

    /// Remove and return every message cached for `peer_id`, oldest first
    pub fn drain(&self, peer_id: &str) -> Vec<Arc<Message>> {
        match self.entries.remove(peer_id) {
            Some((_, mailbox)) => {
                self.counters
                    .drained
                    .fetch_add(mailbox.len() as u64, Ordering::Relaxed);
                mailbox.into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    /// Messages cached for `peer_id`, without removing them
    pub fn peek(&self, peer_id: &str) -> Vec<Arc<Message>> {
        self.entries
            .get(peer_id)
            .map(|mailbox| mailbox.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop messages older than `retention`, then drop emptied mailboxes
    ///
    /// Returns the number of messages removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let mut removed = 0;

        self.entries.retain(|peer_id, mailbox| {
            let before = mailbox.len();
            mailbox.retain(|message| message.age(now) <= retention);
            let expired = before - mailbox.len();
            if expired > 0 {
                tracing::debug!(peer_id = %peer_id, expired, "Swept expired cached messages");
            }
            removed += expired;
            !mailbox.is_empty()
        });

        if removed > 0 {
            self.counters
                .expired
                .fetch_add(removed as u64, Ordering::Relaxed);
            crate::metrics::record_cache_expired(removed);
        }

        removed
    }

    /// Sum of all mailbox sizes
    pub fn total_cached_count(&self) -> usize {
        self.entries.iter().map(|mailbox| mailbox.len()).sum()
    }

    pub fn cached_count(&self, peer_id: &str) -> usize {
        self.entries
            .get(peer_id)
            .map(|mailbox| mailbox.len())
            .unwrap_or(0)
    }

    /// Peers that currently have a mailbox
    pub fn peers(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn max_per_peer(&self) -> usize {
        self.max_per_peer
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cached_messages: self.total_cached_count() as u64,
            peers: self.entries.len() as u64,
            total_cached: self.counters.cached.load(Ordering::Relaxed),
            total_evicted: self.counters.evicted.load(Ordering::Relaxed),
            total_expired: self.counters.expired.load(Ordering::Relaxed),
            total_drained: self.counters.drained.load(Ordering::Relaxed),
        }
    }
}

impl Default for OfflineCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBuilder;
    use chrono::Duration as ChronoDuration;

    fn channel_message(id: &str) -> Arc<Message> {
        Arc::new(
            MessageBuilder::new("alice")
                .id(id)
                .channel("general")
                .content(format!("message {id}"))
                .build(),
        )
    }

    #[test]
    fn test_should_cache() {
        let channel = MessageBuilder::new("alice").channel("general").build();
        let direct = MessageBuilder::new("alice").recipient("bob").build();
        let control = MessageBuilder::new("alice").content("ping").build();

        assert!(OfflineCache::should_cache(&channel));
        assert!(OfflineCache::should_cache(&direct));
        assert!(!OfflineCache::should_cache(&control));
    }

    #[test]
    fn test_cache_skips_excluded_peer() {
        let cache = OfflineCache::default();
        let message = channel_message("m1");

        let inserted = cache.cache_for_offline_peers(&message, "alice", ["alice", "bob", "carol"]);

        assert_eq!(inserted, 2);
        assert_eq!(cache.cached_count("alice"), 0);
        assert_eq!(cache.cached_count("bob"), 1);
        assert_eq!(cache.cached_count("carol"), 1);
        assert_eq!(cache.total_cached_count(), 2);
    }

    #[test]
    fn test_deduplication() {
        let cache = OfflineCache::default();
        let message = channel_message("m1");

        cache.cache_for_offline_peers(&message, "alice", ["bob"]);
        let inserted = cache.cache_for_offline_peers(&message, "alice", ["bob"]);

        assert_eq!(inserted, 0);
        assert_eq!(cache.cached_count("bob"), 1);
    }

    #[test]
    fn test_cache_skips_peers_back_online() {
        let cache = OfflineCache::default();
        let message = channel_message("m1");

        let inserted =
            cache.cache_for_peers_where(&message, "alice", ["bob", "carol"], |peer| peer != "bob");

        assert_eq!(inserted, 1);
        assert_eq!(cache.cached_count("bob"), 0);
        assert_eq!(cache.cached_count("carol"), 1);
        assert_eq!(cache.peers(), vec!["carol".to_string()]);
    }

    #[test]
    fn test_bound_evicts_oldest() {
        let cache = OfflineCache::new(3);

        for i in 0..4 {
            cache.cache_for_offline_peers(
                &channel_message(&format!("m{i}")),
                "alice",
                ["bob"],
            );
        }

        let ids: Vec<_> = cache.peek("bob").iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(cache.stats().total_evicted, 1);
    }

    #[test]
    fn test_default_bound() {
        let cache = OfflineCache::default();

        for i in 0..51 {
            cache.cache_for_offline_peers(
                &channel_message(&format!("m{i}")),
                "alice",
                ["bob"],
            );
        }

        let cached = cache.peek("bob");
        assert_eq!(cached.len(), 50);
        assert_eq!(cached[0].id, "m1");
    }

    #[test]
    fn test_drain_is_idempotent() {
        let cache = OfflineCache::default();
        cache.cache_for_offline_peers(&channel_message("m1"), "alice", ["bob"]);
        cache.cache_for_offline_peers(&channel_message("m2"), "alice", ["bob"]);

        let first = cache.drain("bob");
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, "m1");

        assert!(cache.drain("bob").is_empty());
        assert!(cache.peers().is_empty());
        assert!(cache.drain("nobody").is_empty());
    }

    #[test]
    fn test_sweep_expired() {
        let cache = OfflineCache::default();
        let now = Utc::now();
        let retention = Duration::from_secs(24 * 60 * 60);

        let old = Arc::new(
            MessageBuilder::new("alice")
                .id("old")
                .channel("general")
                .created_at(now - ChronoDuration::hours(25))
                .build(),
        );
        let fresh = Arc::new(
            MessageBuilder::new("alice")
                .id("fresh")
                .channel("general")
                .created_at(now - ChronoDuration::hours(1))
                .build(),
        );

        cache.cache_for_offline_peers(&old, "alice", ["bob", "carol"]);
        cache.cache_for_offline_peers(&fresh, "alice", ["bob"]);

        let removed = cache.sweep_expired(now, retention);

        assert_eq!(removed, 2);
        let bob: Vec<_> = cache.peek("bob").iter().map(|m| m.id.clone()).collect();
        assert_eq!(bob, vec!["fresh"]);
        // Carol's mailbox was emptied and removed
        assert!(!cache.peers().contains(&"carol".to_string()));
        assert_eq!(cache.stats().total_expired, 2);
    }

    #[test]
    fn test_stats_display() {
        let cache = OfflineCache::default();
        cache.cache_for_offline_peers(&channel_message("m1"), "alice", ["bob", "carol"]);

        let stats = cache.stats();
        assert_eq!(stats.cached_messages, 2);
        assert_eq!(stats.peers, 2);
        assert!(stats.to_string().contains("2 messages for 2 peers"));
    }
}
