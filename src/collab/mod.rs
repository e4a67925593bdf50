//! External collaborators of the hub
//!
//! The hub never talks to the radio or the backend directly; the host
//! application plugs in implementations of these traits.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{GatewayError, GatewayResult, TransportError, TransportResult};
pub use memory::{InMemoryGateway, InMemoryTransport, StaticAuthorization};
pub use traits::{Authorization, GatewayClient, Transport};
