use crate::hub::types::{HubEvent, HubState};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Hub mode requires an authorized role")]
    Unauthorized,

    #[error("Cannot handle {event:?} in state {state:?}")]
    InvalidStateTransition { state: HubState, event: HubEvent },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type HubResult<T> = Result<T, HubError>;
