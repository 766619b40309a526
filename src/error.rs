//! Error handling for the decoder library.
//!
//! This module defines the error types that can occur during decoding,
//! providing detailed information for debugging and error recovery.

#![allow(missing_docs)]

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Error type for decoder operations
#[derive(Error, Debug)]
pub enum CodecError {
    /// Invalid decoder configuration
    #[error("Invalid codec configuration: {details}")]
    InvalidConfig { details: String },

    /// Invalid frame size
    #[error("Invalid frame size: expected {expected}, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    /// Decoding operation failed
    #[error("Decoding failed: {reason}")]
    DecodingFailed { reason: String },

    /// Output buffer too small for one frame
    #[error("Buffer too small: need {needed} samples, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// Invalid payload data
    #[error("Invalid payload data: {details}")]
    InvalidPayload { details: String },

    /// Codec reset failed
    #[error("Codec reset failed: {reason}")]
    ResetFailed { reason: String },

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {message} (this is a bug, please report it)")]
    InternalError { message: String },
}

impl CodecError {
    /// Create a new invalid configuration error
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a new decoding failed error
    pub fn decoding_failed(reason: impl Into<String>) -> Self {
        Self::DecodingFailed {
            reason: reason.into(),
        }
    }

    /// Create a new invalid payload error
    pub fn invalid_payload(details: impl Into<String>) -> Self {
        Self::InvalidPayload {
            details: details.into(),
        }
    }

    /// Create a new internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Configuration errors are not recoverable
            Self::InvalidConfig { .. }
            | Self::ResetFailed { .. }
            | Self::InternalError { .. } => false,

            // Operational errors may be recoverable by feeding the next
            // packet or a larger buffer
            Self::InvalidFrameSize { .. }
            | Self::DecodingFailed { .. }
            | Self::BufferTooSmall { .. }
            | Self::InvalidPayload { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CodecError::invalid_config("test message");
        assert!(matches!(err, CodecError::InvalidConfig { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_recoverability() {
        let recoverable = CodecError::decoding_failed("test");
        assert!(recoverable.is_recoverable());

        let non_recoverable = CodecError::internal_error("test");
        assert!(!non_recoverable.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = CodecError::BufferTooSmall {
            needed: 240,
            actual: 120,
        };
        let display = format!("{}", err);
        assert!(display.contains("need 240"));
        assert!(display.contains("got 120"));
    }
}
