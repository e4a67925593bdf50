//! Offline Message Cache
//!
//! Bounded, deduplicated per-peer mailboxes for peers that are currently
//! unreachable. Entries are drained when the peer reconnects and swept
//! once they outlive the retention period.
//!
//! Key features:
//! - Per-peer FIFO bound (oldest message evicted first)
//! - Deduplication by message identifier within a mailbox
//! - TTL sweep that drops emptied mailboxes

pub mod store;
pub mod types;

pub use store::OfflineCache;
pub use types::{CacheConfig, CacheStats};
