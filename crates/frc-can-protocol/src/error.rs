//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding FRC CAN frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A field does not fit its bit width.
    #[error("{field} out of range: {value} exceeds maximum {max}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied by the caller.
        value: u32,
        /// Largest value the field can hold.
        max: u32,
    },

    /// Payload has the wrong length for its decoder.
    #[error("malformed payload: expected {expected} bytes, got {actual}")]
    MalformedPayload {
        /// Required length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// A frame violated a precondition of its message category.
    #[error("malformed frame 0x{id:08X}: expected {expected} payload bytes, got {actual}")]
    MalformedFrame {
        /// Raw extended identifier of the frame.
        id: u32,
        /// Required payload length.
        expected: usize,
        /// Actual payload length.
        actual: usize,
    },
}

impl ProtocolError {
    /// Create an out-of-range error for a named field.
    pub fn out_of_range(field: &'static str, value: impl Into<u32>, max: impl Into<u32>) -> Self {
        ProtocolError::OutOfRange {
            field,
            value: value.into(),
            max: max.into(),
        }
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
