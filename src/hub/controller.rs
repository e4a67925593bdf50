use crate::cache::OfflineCache;
use crate::collab::{Authorization, GatewayClient, Transport};
use crate::gateway::GatewaySyncQueue;
use crate::hub::config::HubConfig;
use crate::hub::error::{HubError, HubResult};
use crate::hub::state_machine::HubStateMachine;
use crate::hub::tasks::TaskScope;
use crate::hub::types::{HubEvent, HubState, HubStatus};
use crate::message::Message;
use crate::presence::PresenceTracker;
use crate::relay::RelayAmplifier;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Store-and-forward hub for one elevated node on the mesh
///
/// Cheap to clone; every clone drives the same hub. Background work
/// (relays, cache redelivery, gateway sync) runs on the tokio runtime
/// and is aborted once the last handle is dropped.
#[derive(Clone)]
pub struct HubController {
    inner: Arc<HubInner>,
}

struct HubInner {
    owner_id: String,
    config: HubConfig,
    state: HubStateMachine,
    presence: Arc<PresenceTracker>,
    cache: Arc<OfflineCache>,
    amplifier: Arc<RelayAmplifier>,
    sync_queue: Arc<GatewaySyncQueue>,
    transport: Arc<dyn Transport>,
    gateway: Arc<dyn GatewayClient>,
    authorization: Arc<dyn Authorization>,
    tasks: TaskScope,
}

impl HubController {
    pub fn builder(owner_id: impl Into<String>) -> HubControllerBuilder {
        HubControllerBuilder::new(owner_id)
    }

    pub fn owner_id(&self) -> &str {
        &self.inner.owner_id
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn state(&self) -> HubState {
        self.inner.state.current_state()
    }

    /// Receiver notified on every lifecycle transition
    pub fn subscribe_state(&self) -> watch::Receiver<HubState> {
        self.inner.state.subscribe()
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.inner.presence
    }

    pub fn cache(&self) -> &OfflineCache {
        &self.inner.cache
    }

    pub fn amplifier(&self) -> &RelayAmplifier {
        &self.inner.amplifier
    }

    pub fn sync_queue(&self) -> &GatewaySyncQueue {
        &self.inner.sync_queue
    }

    // ============== Lifecycle ==============

    /// `Disabled -> Enabled`, provided the operator holds the required role
    pub fn enable_hub_mode(&self) -> HubResult<HubState> {
        if !self.inner.authorization.has_required_role() {
            tracing::warn!(owner_id = %self.inner.owner_id, "Hub mode refused, missing role");
            return Err(HubError::Unauthorized);
        }

        let state = self.inner.state.transition(HubEvent::Enable)?;
        tracing::info!(owner_id = %self.inner.owner_id, %state, "Hub mode enabled");
        Ok(state)
    }

    /// Any state `-> Disabled`
    pub fn disable_hub_mode(&self) -> HubResult<HubState> {
        let state = self.inner.state.transition(HubEvent::Disable)?;
        self.inner.tasks.stop_sweeper();
        tracing::info!(owner_id = %self.inner.owner_id, "Hub mode disabled");
        Ok(state)
    }

    /// `Enabled -> Active`; sweeps expired cache entries right away
    pub fn activate(&self) -> HubResult<HubState> {
        let state = self.inner.state.transition(HubEvent::Activate).map_err(|e| {
            tracing::warn!(error = %e, "Hub activation rejected");
            e
        })?;

        let removed = self
            .inner
            .cache
            .sweep_expired(Utc::now(), self.inner.config.cache.retention);
        crate::metrics::set_cached_messages(self.inner.cache.total_cached_count());
        self.start_sweeper();

        tracing::info!(owner_id = %self.inner.owner_id, expired = removed, "Hub activated");
        Ok(state)
    }

    /// `Active -> Enabled`
    ///
    /// In-flight background work finishes; nothing new is started.
    pub fn deactivate(&self) -> HubResult<HubState> {
        let state = self.inner.state.transition(HubEvent::Deactivate)?;
        self.inner.tasks.stop_sweeper();
        tracing::info!(owner_id = %self.inner.owner_id, "Hub deactivated");
        Ok(state)
    }

    fn start_sweeper(&self) {
        let cache = Arc::clone(&self.inner.cache);
        let retention = self.inner.config.cache.retention;
        let interval = self.inner.config.cache.sweep_interval;
        let state_rx = self.inner.state.subscribe();

        self.inner.tasks.start_sweeper(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately; activation already swept
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let active = state_rx.borrow().is_active();
                if !active {
                    break;
                }

                let removed = cache.sweep_expired(Utc::now(), retention);
                if removed > 0 {
                    tracing::info!(expired = removed, "Periodic cache sweep");
                }
                crate::metrics::set_cached_messages(cache.total_cached_count());
            }
        });
    }

    // ============== Events ==============

    /// Inbound mesh message from `from_peer_id`
    ///
    /// Presence is refreshed whenever hub mode is enabled. While active the
    /// message is independently cached for offline peers, relayed, and
    /// queued for the gateway.
    pub fn on_message_received(&self, message: Message, from_peer_id: &str) {
        let state = self.inner.state.current_state();
        if !state.is_enabled() {
            return;
        }

        let now = Utc::now();
        self.inner.presence.observe(from_peer_id, now);

        if !state.is_active() {
            return;
        }

        crate::metrics::record_message_received();
        let message = Arc::new(message);

        if OfflineCache::should_cache(&message) {
            let targets = self.cache_targets(&message, from_peer_id, now);
            if !targets.is_empty() {
                let presence = &self.inner.presence;
                let cached = self.inner.cache.cache_for_peers_where(
                    &message,
                    from_peer_id,
                    targets.iter().map(String::as_str),
                    |peer| presence.is_offline(peer, now),
                );
                tracing::debug!(
                    message_id = %message.id,
                    peers = cached,
                    "Cached message for offline peers"
                );
                crate::metrics::set_cached_messages(self.inner.cache.total_cached_count());
            }
        }

        if self
            .inner
            .amplifier
            .should_amplify(&message, &self.inner.owner_id)
        {
            let amplifier = Arc::clone(&self.inner.amplifier);
            let relayed = Arc::clone(&message);
            let exclude = from_peer_id.to_string();
            self.inner.tasks.spawn("relay", async move {
                amplifier.relay(&relayed, Some(&exclude)).await;
            });
        }

        if GatewaySyncQueue::should_queue(&message, self.inner.gateway.is_connected()) {
            self.inner.sync_queue.enqueue(Arc::clone(&message));
        }
    }

    /// Offline peers a message should wait for
    ///
    /// Direct messages wait only for their recipient; channel messages for
    /// every known offline peer. Neither the sender nor the operator is
    /// ever a target. Presence is checked again when the message is stored,
    /// so a peer reconnecting in between is not left with a stale mailbox.
    fn cache_targets(
        &self,
        message: &Message,
        from_peer_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let presence = &self.inner.presence;
        let candidates: Vec<String> = if message.is_direct() {
            message.recipient_id.iter().cloned().collect()
        } else {
            presence.known_peers()
        };

        candidates
            .into_iter()
            .filter(|peer| peer != from_peer_id && *peer != self.inner.owner_id)
            .filter(|peer| presence.is_offline(peer, now))
            .collect()
    }

    /// A peer (re)connected; redeliver whatever was cached for it
    ///
    /// Redelivery is best-effort: a message whose send fails is dropped.
    pub fn on_peer_connected(&self, peer_id: &str) {
        let state = self.inner.state.current_state();
        if !state.is_enabled() {
            return;
        }

        self.inner.presence.observe(peer_id, Utc::now());

        if !state.is_active() {
            return;
        }

        if !self.inner.tasks.has_runtime() {
            tracing::warn!(peer_id, "No tokio runtime available, keeping cached messages");
            return;
        }

        let pending = self.inner.cache.drain(peer_id);
        if pending.is_empty() {
            return;
        }

        tracing::info!(peer_id, count = pending.len(), "Redelivering cached messages");
        crate::metrics::set_cached_messages(self.inner.cache.total_cached_count());

        let transport = Arc::clone(&self.inner.transport);
        let peer_id = peer_id.to_string();
        self.inner.tasks.spawn("redelivery", async move {
            for message in pending {
                match transport.send_direct(&message, &peer_id).await {
                    Ok(()) => crate::metrics::record_redelivery(true),
                    Err(e) => {
                        tracing::warn!(
                            peer_id = %peer_id,
                            message_id = %message.id,
                            error = %e,
                            "Cached message redelivery failed, dropping"
                        );
                        crate::metrics::record_redelivery(false);
                    }
                }
            }
        });
    }

    /// A peer link dropped
    ///
    /// Only a hint: radio links flap, so classification keeps relying on
    /// the time since the peer was last observed.
    pub fn on_peer_disconnected(&self, peer_id: &str) {
        tracing::debug!(peer_id, "Peer disconnect reported");
    }

    /// Gateway connectivity restored; replay the pending sync queue
    pub fn on_gateway_connected(&self) {
        if !self.inner.state.current_state().is_active() {
            return;
        }

        let pending = self.inner.sync_queue.pending_count();
        if pending == 0 {
            return;
        }

        tracing::info!(pending, "Gateway connected, syncing queued messages");

        let queue = Arc::clone(&self.inner.sync_queue);
        let gateway = Arc::clone(&self.inner.gateway);
        self.inner.tasks.spawn("gateway-sync", async move {
            let report = queue
                .drain_and_sync(|message| {
                    let gateway = Arc::clone(&gateway);
                    async move { gateway.send(&message).await }
                })
                .await;
            tracing::info!(
                synced = report.synced,
                requeued = report.requeued,
                dropped = report.dropped,
                "Gateway sync finished"
            );
        });
    }

    // ============== Observation ==============

    /// Snapshot of the hub; safe to call in any state
    pub fn status(&self) -> HubStatus {
        let state = self.inner.state.current_state();

        HubStatus {
            enabled: state.is_enabled(),
            active: state.is_active(),
            connected_peer_count: self.inner.presence.connected_count(Utc::now()),
            cached_message_count: self.inner.cache.total_cached_count(),
            pending_gateway_sync_count: self.inner.sync_queue.pending_count(),
        }
    }

    /// Wait until every in-flight relay, redelivery and sync task finished
    pub async fn settle(&self) {
        self.inner.tasks.settle().await;
    }

    /// Number of fire-and-forget tasks still running
    pub fn background_tasks(&self) -> usize {
        self.inner.tasks.in_flight()
    }
}

/// Builder for hub controllers
pub struct HubControllerBuilder {
    owner_id: String,
    config: HubConfig,
    transport: Option<Arc<dyn Transport>>,
    gateway: Option<Arc<dyn GatewayClient>>,
    authorization: Option<Arc<dyn Authorization>>,
    runtime: Option<Handle>,
}

impl HubControllerBuilder {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            config: HubConfig::default(),
            transport: None,
            gateway: None,
            authorization: None,
            runtime: None,
        }
    }

    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn GatewayClient>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn authorization(mut self, authorization: Arc<dyn Authorization>) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Runtime background work is spawned on
    ///
    /// Defaults to the runtime `build` is called from, if any. Needed when
    /// events are delivered from threads outside the runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> HubResult<HubController> {
        if self.owner_id.is_empty() {
            return Err(HubError::InvalidConfig("owner id must not be empty".into()));
        }
        self.config.validate()?;

        let transport = self
            .transport
            .ok_or_else(|| HubError::InvalidConfig("a transport is required".into()))?;
        let gateway = self
            .gateway
            .ok_or_else(|| HubError::InvalidConfig("a gateway client is required".into()))?;
        let authorization = self
            .authorization
            .ok_or_else(|| HubError::InvalidConfig("an authorization check is required".into()))?;

        let config = self.config;
        let runtime = self.runtime.or_else(|| Handle::try_current().ok());

        Ok(HubController {
            inner: Arc::new(HubInner {
                owner_id: self.owner_id,
                state: HubStateMachine::new(),
                presence: Arc::new(PresenceTracker::new(config.presence.clone())),
                cache: Arc::new(OfflineCache::from_config(&config.cache)),
                amplifier: Arc::new(RelayAmplifier::new(Arc::clone(&transport), &config.relay)),
                sync_queue: Arc::new(GatewaySyncQueue::new(&config.gateway)),
                transport,
                gateway,
                authorization,
                tasks: TaskScope::new(runtime),
                config,
            }),
        })
    }
}
