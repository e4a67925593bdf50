//! Message model consumed by the hub
//!
//! The hub reasons about a handful of envelope fields only; content is
//! opaque text apart from amplification markers.

pub mod types;

pub use types::{Message, MessageBuilder, DEFAULT_RELAY_TTL};
