//! Gateway Sync Queue
//!
//! Buffers channel messages that arrived while the backend gateway was
//! unreachable and replays them when connectivity returns. A failed
//! send goes back into the queue for the next reconnect.

pub mod queue;
pub mod types;

pub use queue::GatewaySyncQueue;
pub use types::{PendingSync, SyncConfig, SyncReport};
