//! Metrics recorder for hub operations

use metrics::{counter, describe_counter, describe_gauge, gauge};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!(
        "meshhub_messages_received_total",
        "Messages processed while the hub was active"
    );
    describe_counter!(
        "meshhub_messages_cached_total",
        "Mailbox insertions for offline peers"
    );
    describe_counter!(
        "meshhub_cache_evicted_total",
        "Cached messages evicted by the per-peer bound"
    );
    describe_counter!(
        "meshhub_cache_expired_total",
        "Cached messages removed by the retention sweep"
    );
    describe_counter!("meshhub_relays_total", "Relay decisions by outcome");
    describe_counter!(
        "meshhub_redeliveries_total",
        "Cached message redeliveries by outcome"
    );
    describe_counter!(
        "meshhub_gateway_synced_total",
        "Messages synced to the gateway"
    );
    describe_counter!(
        "meshhub_gateway_requeued_total",
        "Gateway sync failures put back in the queue"
    );
    describe_counter!(
        "meshhub_gateway_dropped_total",
        "Messages dropped after exhausting sync attempts"
    );

    describe_gauge!("meshhub_cached_messages", "Messages currently cached");
    describe_gauge!(
        "meshhub_pending_gateway_sync",
        "Messages waiting for gateway connectivity"
    );
}

// ============== Cache ==============

pub fn record_message_received() {
    counter!("meshhub_messages_received_total").increment(1);
}

pub fn record_messages_cached(count: usize) {
    counter!("meshhub_messages_cached_total").increment(count as u64);
}

pub fn record_cache_evicted() {
    counter!("meshhub_cache_evicted_total").increment(1);
}

pub fn record_cache_expired(count: usize) {
    counter!("meshhub_cache_expired_total").increment(count as u64);
}

pub fn set_cached_messages(count: usize) {
    gauge!("meshhub_cached_messages").set(count as f64);
}

// ============== Relay ==============

/// Record a relay decision, labelled by outcome
pub fn record_relay(outcome: &'static str) {
    counter!("meshhub_relays_total", "outcome" => outcome).increment(1);
}

pub fn record_redelivery(delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    counter!("meshhub_redeliveries_total", "outcome" => outcome).increment(1);
}

// ============== Gateway ==============

pub fn record_gateway_sync(synced: usize, requeued: usize) {
    counter!("meshhub_gateway_synced_total").increment(synced as u64);
    counter!("meshhub_gateway_requeued_total").increment(requeued as u64);
}

pub fn record_gateway_dropped(count: usize) {
    counter!("meshhub_gateway_dropped_total").increment(count as u64);
}

pub fn set_pending_gateway_sync(count: usize) {
    gauge!("meshhub_pending_gateway_sync").set(count as f64);
}
