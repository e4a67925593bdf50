use crate::gateway::types::{PendingSync, SyncConfig, SyncReport};
use crate::message::Message;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

/// Messages waiting to reach the backend gateway, keyed by message id
pub struct GatewaySyncQueue {
    pending: Mutex<HashMap<String, PendingSync>>,
    max_attempts: Option<u32>,
}

impl GatewaySyncQueue {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            max_attempts: config.max_attempts,
        }
    }

    /// Check if a message must be buffered for the gateway
    ///
    /// Only channel messages are gateway-synced; direct messages never are.
    pub fn should_queue(message: &Message, gateway_connected: bool) -> bool {
        !gateway_connected && !message.channel_id.is_empty()
    }

    /// Insert or replace the entry for this message id
    pub fn enqueue(&self, message: Arc<Message>) {
        let id = message.id.clone();
        let pending_count = {
            let mut pending = self.pending.lock();
            pending.insert(id.clone(), PendingSync::new(message));
            pending.len()
        };

        tracing::debug!(
            message_id = %id,
            pending = pending_count,
            "Queued message for gateway sync"
        );
        crate::metrics::set_pending_gateway_sync(pending_count);
    }

    /// Snapshot and clear the queue, then try `send` for every message
    ///
    /// Messages whose send fails go back into the queue; one failure does
    /// not stop the remaining messages from being attempted.
    pub async fn drain_and_sync<F, Fut, E>(&self, send: F) -> SyncReport
    where
        F: Fn(Arc<Message>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let batch: Vec<PendingSync> = {
            let mut pending = self.pending.lock();
            pending.drain().map(|(_, entry)| entry).collect()
        };

        let mut report = SyncReport::default();

        for mut entry in batch {
            match send(Arc::clone(&entry.message)).await {
                Ok(()) => {
                    tracing::debug!(message_id = %entry.message.id, "Synced message to gateway");
                    report.synced += 1;
                }
                Err(e) => {
                    entry.attempts += 1;

                    if self
                        .max_attempts
                        .is_some_and(|max_attempts| entry.attempts >= max_attempts)
                    {
                        tracing::warn!(
                            message_id = %entry.message.id,
                            attempts = entry.attempts,
                            error = %e,
                            "Dropping message after exhausting gateway sync attempts"
                        );
                        report.dropped += 1;
                        continue;
                    }

                    tracing::warn!(
                        message_id = %entry.message.id,
                        attempts = entry.attempts,
                        error = %e,
                        "Gateway sync failed, requeueing"
                    );
                    self.requeue(entry);
                    report.requeued += 1;
                }
            }
        }

        crate::metrics::record_gateway_sync(report.synced, report.requeued);
        if report.dropped > 0 {
            crate::metrics::record_gateway_dropped(report.dropped);
        }
        crate::metrics::set_pending_gateway_sync(self.pending_count());

        report
    }

    fn requeue(&self, entry: PendingSync) {
        let mut pending = self.pending.lock();
        // A fresh copy enqueued during the sync pass wins over the failed one
        pending.entry(entry.message.id.clone()).or_insert(entry);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.pending.lock().contains_key(message_id)
    }

    /// Failed attempts recorded for a pending message
    pub fn attempts(&self, message_id: &str) -> Option<u32> {
        self.pending.lock().get(message_id).map(|entry| entry.attempts)
    }
}

impl Default for GatewaySyncQueue {
    fn default() -> Self {
        Self::new(&SyncConfig::default())
    }
}
