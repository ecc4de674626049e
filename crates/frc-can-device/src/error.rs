//! Error types for the device core.

use frc_can_protocol::ProtocolError;
use thiserror::Error;

use crate::transport::BusState;

/// Errors surfaced by the device core.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Frame or identifier could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A route handler failed.
    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    /// The transport refused an operation.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Startup configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Error returned by a route handler.
///
/// The router hands it back to its caller unchanged.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Building a reply failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The message content was not what the handler expects.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Any other handler failure.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Create an invalid message error.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        HandlerError::InvalidMessage(message.into())
    }

    /// Create a generic handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Errors reported by a bus transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The bus is not in a state that allows transmission.
    #[error("CAN bus is not active (state: {0})")]
    BusInactive(BusState),

    /// More acceptance filters than the transceiver has slots for.
    #[error("too many acceptance filters: {requested} requested, {available} available")]
    TooManyFilters {
        /// Filters requested.
        requested: usize,
        /// Filter slots available.
        available: usize,
    },

    /// The transceiver rejected the frame.
    #[error("send rejected: {0}")]
    Rejected(String),
}

/// Errors in the startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured address does not fit the identifier layout.
    #[error("invalid device address: {0}")]
    InvalidAddress(#[source] ProtocolError),
}

/// Result type alias for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
