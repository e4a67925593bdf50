//! In-memory collaborators
//!
//! Record every call so a host (or a test) can inspect what the hub asked
//! the outside world to do. Failures can be injected per peer or per
//! message id.

use crate::collab::error::{GatewayError, GatewayResult, TransportError, TransportResult};
use crate::collab::traits::{Authorization, GatewayClient, Transport};
use crate::message::Message;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A broadcast recorded by [`InMemoryTransport`]
#[derive(Debug, Clone)]
pub struct BroadcastRecord {
    pub message: Message,
    pub excluded: Option<String>,
}

#[derive(Default)]
struct TransportLog {
    direct: Vec<(String, Message)>,
    broadcasts: Vec<BroadcastRecord>,
}

/// Loopback transport that records sends
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    log: Arc<RwLock<TransportLog>>,
    unreachable: Arc<RwLock<HashSet<String>>>,
    fail_broadcasts: Arc<AtomicBool>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make direct sends to `peer_id` fail
    pub fn set_unreachable(&self, peer_id: impl Into<String>) {
        self.unreachable.write().insert(peer_id.into());
    }

    pub fn set_reachable(&self, peer_id: &str) {
        self.unreachable.write().remove(peer_id);
    }

    pub fn fail_broadcasts(&self, fail: bool) {
        self.fail_broadcasts.store(fail, Ordering::SeqCst);
    }

    /// Messages delivered directly, as `(peer_id, message)`
    pub fn direct_sends(&self) -> Vec<(String, Message)> {
        self.log.read().direct.clone()
    }

    /// Messages delivered directly to one peer
    pub fn delivered_to(&self, peer_id: &str) -> Vec<Message> {
        self.log
            .read()
            .direct
            .iter()
            .filter(|(peer, _)| peer == peer_id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<BroadcastRecord> {
        self.log.read().broadcasts.clone()
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send_direct(&self, message: &Message, peer_id: &str) -> TransportResult<()> {
        if self.unreachable.read().contains(peer_id) {
            return Err(TransportError::Unreachable(peer_id.to_string()));
        }
        self.log
            .write()
            .direct
            .push((peer_id.to_string(), message.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        message: &Message,
        exclude_peer_id: Option<&str>,
    ) -> TransportResult<()> {
        if self.fail_broadcasts.load(Ordering::SeqCst) {
            return Err(TransportError::Send("broadcast disabled".into()));
        }
        self.log.write().broadcasts.push(BroadcastRecord {
            message: message.clone(),
            excluded: exclude_peer_id.map(str::to_string),
        });
        Ok(())
    }
}

/// Gateway client backed by a vector of accepted messages
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    connected: Arc<AtomicBool>,
    accepted: Arc<RwLock<Vec<Message>>>,
    rejected_ids: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryGateway {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(connected)),
            ..Self::default()
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make every send of `message_id` fail until [`Self::accept`] is called
    pub fn reject(&self, message_id: impl Into<String>) {
        self.rejected_ids.write().insert(message_id.into());
    }

    pub fn accept(&self, message_id: &str) {
        self.rejected_ids.write().remove(message_id);
    }

    pub fn accepted(&self) -> Vec<Message> {
        self.accepted.read().clone()
    }
}

#[async_trait::async_trait]
impl GatewayClient for InMemoryGateway {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, message: &Message) -> GatewayResult<()> {
        if !self.is_connected() {
            return Err(GatewayError::Disconnected);
        }
        if self.rejected_ids.read().contains(&message.id) {
            return Err(GatewayError::Rejected(message.id.clone()));
        }
        self.accepted.write().push(message.clone());
        Ok(())
    }
}

/// Fixed answer to the role check
#[derive(Debug, Clone, Copy)]
pub struct StaticAuthorization(pub bool);

impl Authorization for StaticAuthorization {
    fn has_required_role(&self) -> bool {
        self.0
    }
}
