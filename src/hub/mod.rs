//! Hub Controller
//!
//! Owns the hub lifecycle and routes mesh, presence and gateway events
//! through the presence tracker, offline cache, relay amplifier and
//! gateway sync queue.

pub mod config;
pub mod controller;
pub mod error;
pub mod state_machine;
pub(crate) mod tasks;
pub mod types;

pub use config::HubConfig;
pub use controller::{HubController, HubControllerBuilder};
pub use error::{HubError, HubResult};
pub use state_machine::HubStateMachine;
pub use types::{HubEvent, HubState, HubStatus};
