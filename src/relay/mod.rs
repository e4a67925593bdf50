//! Relay Amplifier
//!
//! Decides whether a received message deserves extra reach and asks the
//! mesh transport to re-broadcast it.
//!
//! Key features:
//! - Content-based eligibility (urgent/presence markers, operator traffic)
//! - Hop budget (TTL) decremented on every relay
//! - Loop guard remembering recently relayed message ids
//! - Broadcast throttle

pub mod amplifier;
pub mod types;

pub use amplifier::RelayAmplifier;
pub use types::{AmplifierConfig, RelayOutcome, RelayStats};
