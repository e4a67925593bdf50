use crate::collab::error::{GatewayResult, TransportResult};
use crate::message::Message;

/// Peer-to-peer mesh transport
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a message to a single peer
    async fn send_direct(&self, message: &Message, peer_id: &str) -> TransportResult<()>;

    /// Broadcast a message to every reachable peer except `exclude_peer_id`
    async fn broadcast(&self, message: &Message, exclude_peer_id: Option<&str>)
        -> TransportResult<()>;
}

/// Authenticated client for the backend gateway
#[async_trait::async_trait]
pub trait GatewayClient: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn send(&self, message: &Message) -> GatewayResult<()>;
}

/// Role check consulted when enabling hub mode
pub trait Authorization: Send + Sync {
    fn has_required_role(&self) -> bool;
}

impl<F> Authorization for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn has_required_role(&self) -> bool {
        self()
    }
}
