//! Peer presence tracking
//!
//! Presence is inferred from recency of communication: every inbound
//! message or connect event refreshes a peer's last-seen timestamp, and
//! the connected/offline classifications are derived from time windows
//! rather than stored.

pub mod tracker;
pub mod types;

pub use tracker::PresenceTracker;
pub use types::PresenceConfig;
