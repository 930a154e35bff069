//! Error types for the Gibson client
//!
//! Provides a unified error type for all operations, plus the decode error
//! reported to a single request when its reply payload cannot be interpreted.

use bytes::Bytes;
use thiserror::Error;

/// Result type alias using GibsonError
pub type Result<T> = std::result::Result<T, GibsonError>;

/// Unified error type for Gibson client operations
#[derive(Debug, Error)]
pub enum GibsonError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Reply Errors (delivered to a single request)
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The server answered with an error reply code.
    #[error("Server error {code}: {message}")]
    Server {
        code: u16,
        message: &'static str,
        payload: Bytes,
    },

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    /// A reply arrived with no request waiting for it.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timed out waiting for reply")]
    Timeout,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GibsonError {
    /// True for errors after which the connection cannot be used anymore.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GibsonError::Io(_)
                | GibsonError::ProtocolViolation(_)
                | GibsonError::NotConnected
                | GibsonError::ConnectionClosed
        )
    }
}

/// Failure to interpret a reply payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown encoding 0x{0:02x}")]
    UnknownEncoding(u8),

    #[error("unknown error code {0}")]
    UnknownErrorCode(u16),

    /// A length field points past the end of the payload.
    #[error("truncated {field}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },
}
