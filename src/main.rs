//! Runs the hub against in-memory collaborators and logs what it does.

use chrono::{Duration, Utc};
use meshhub::collab::{InMemoryGateway, InMemoryTransport, StaticAuthorization};
use meshhub::{HubController, Message};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    meshhub::metrics::init_metrics();

    let transport = InMemoryTransport::new();
    let gateway = InMemoryGateway::new(false);

    let hub = HubController::builder("operator")
        .transport(Arc::new(transport.clone()))
        .gateway(Arc::new(gateway.clone()))
        .authorization(Arc::new(StaticAuthorization(true)))
        .build()?;

    hub.enable_hub_mode()?;
    hub.activate()?;
    tracing::info!(status = %hub.status(), "Hub ready");

    // Offline peer scenario: bob was last heard from ten minutes ago
    hub.presence().observe("bob", Utc::now() - Duration::minutes(10));
    hub.on_message_received(Message::channel("alice", "general", "meet at the bridge"), "alice");
    hub.on_message_received(Message::channel("alice", "general", "URGENT: road closed"), "alice");
    tracing::info!(status = %hub.status(), "Messages received while bob and the gateway are away");

    hub.on_peer_connected("bob");
    hub.settle().await;
    tracing::info!(
        delivered = transport.delivered_to("bob").len(),
        relayed = transport.broadcasts().len(),
        "Bob reconnected"
    );

    // Gateway scenario: connectivity comes back
    gateway.set_connected(true);
    hub.on_gateway_connected();
    hub.settle().await;
    tracing::info!(
        synced = gateway.accepted().len(),
        status = %hub.status(),
        "Gateway reconnected"
    );

    tracing::info!(stats = %hub.cache().stats(), "Cache");
    tracing::info!(stats = %hub.amplifier().stats(), "Relay");

    hub.deactivate()?;
    hub.disable_hub_mode()?;

    Ok(())
}
