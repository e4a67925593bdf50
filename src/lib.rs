//! Local mesh relay and offline-cache hub
//!
//! Lets one elevated node on a peer-to-peer mesh act as a store-and-forward
//! relay: it caches messages for peers that are currently unreachable,
//! re-broadcasts high-priority traffic, and buffers channel messages for
//! the backend gateway until it becomes reachable again.
//!
//! The radio transport, gateway client and role check are supplied by the
//! host application through the traits in [`collab`].

pub mod cache;
pub mod collab;
pub mod gateway;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod relay;

pub use hub::{HubConfig, HubController, HubError, HubResult, HubState, HubStatus};
pub use message::Message;
