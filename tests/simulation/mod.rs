//! Shared fixture for hub scenarios
//!
//! Wires a hub to in-memory collaborators and offers helpers to age peers
//! out of presence.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use meshhub::collab::{InMemoryGateway, InMemoryTransport, StaticAuthorization};
use meshhub::{HubConfig, HubController};
use std::sync::Arc;

pub const OPERATOR: &str = "operator";

pub struct MeshFixture {
    pub hub: HubController,
    pub transport: InMemoryTransport,
    pub gateway: InMemoryGateway,
}

impl MeshFixture {
    pub fn new(config: HubConfig, authorized: bool, gateway_connected: bool) -> Self {
        let transport = InMemoryTransport::new();
        let gateway = InMemoryGateway::new(gateway_connected);

        let hub = HubController::builder(OPERATOR)
            .config(config)
            .transport(Arc::new(transport.clone()))
            .gateway(Arc::new(gateway.clone()))
            .authorization(Arc::new(StaticAuthorization(authorized)))
            .build()
            .expect("fixture hub");

        Self {
            hub,
            transport,
            gateway,
        }
    }

    /// Hub that is enabled and active with default configuration
    pub fn active(gateway_connected: bool) -> Self {
        let fixture = Self::new(HubConfig::default(), true, gateway_connected);
        fixture.hub.enable_hub_mode().expect("enable");
        fixture.hub.activate().expect("activate");
        fixture
    }

    /// Record that `peer_id` was last heard from `minutes_ago`
    pub fn last_seen(&self, peer_id: &str, minutes_ago: i64) {
        self.hub
            .presence()
            .observe(peer_id, Utc::now() - Duration::minutes(minutes_ago));
    }
}
