//! Metrics module
//!
//! Hub activity is reported through the `metrics` facade. Installing an
//! exporter is left to the host application; without one every call is a
//! no-op.
//!
//! Key metrics exposed:
//! - Messages received, cached, evicted and expired
//! - Relay outcomes and cache redeliveries
//! - Gateway sync results and queue depth

pub mod recorder;

pub use recorder::{
    init_metrics, record_cache_evicted, record_cache_expired, record_gateway_dropped,
    record_gateway_sync, record_message_received, record_messages_cached, record_redelivery,
    record_relay, set_cached_messages, set_pending_gateway_sync,
};
