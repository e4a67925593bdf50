use thiserror::Error;

/// Failures reported by the mesh transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Peer unreachable: {0}")]
    Unreachable(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Transport closed")]
    Closed,
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Failures reported by the backend gateway client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Gateway disconnected")]
    Disconnected,

    #[error("Gateway rejected message: {0}")]
    Rejected(String),

    #[error("Gateway request failed: {0}")]
    Request(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
