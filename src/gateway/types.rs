use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Configuration for gateway resynchronization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Failed attempts after which a message is dropped (None = retry forever)
    pub max_attempts: Option<u32>,
}

/// A message waiting for the gateway
#[derive(Debug, Clone)]
pub struct PendingSync {
    pub message: Arc<Message>,
    pub enqueued_at: Instant,
    /// Failed sync attempts so far
    pub attempts: u32,
}

impl PendingSync {
    pub fn new(message: Arc<Message>) -> Self {
        Self {
            message,
            enqueued_at: Instant::now(),
            attempts: 0,
        }
    }

    pub fn wait_time(&self) -> std::time::Duration {
        self.enqueued_at.elapsed()
    }
}

/// Outcome of one drain-and-sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Messages the gateway accepted
    pub synced: usize,

    /// Messages put back for the next reconnect
    pub requeued: usize,

    /// Messages dropped after exhausting their attempts
    pub dropped: usize,
}

impl SyncReport {
    pub fn attempted(&self) -> usize {
        self.synced + self.requeued + self.dropped
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Gateway sync: {} synced, {} requeued, {} dropped",
            self.synced, self.requeued, self.dropped
        )
    }
}
