//! Error types for EmberKV
//!
//! Provides a unified error type for all operations.
//!
//! Command-level failures (wrong arity, unknown command, bad integer argument)
//! are not represented here: they travel back to the client in-band as
//! [`Value::Error`](crate::protocol::Value) replies.

use thiserror::Error;

/// Result type alias using EmberError
pub type Result<T> = std::result::Result<T, EmberError>;

/// Unified error type for EmberKV operations
#[derive(Debug, Error)]
pub enum EmberError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// A frame could not be decoded. Fatal to the connection that sent it.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// A well-formed value that is not a request (array of bulk strings).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // -------------------------------------------------------------------------
    // Persistence Errors
    // -------------------------------------------------------------------------
    /// A log record failed to decode during replay. Fatal to startup.
    #[error("AOF corruption at byte {offset}: {reason}")]
    CorruptLog { offset: u64, reason: String },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EmberError {
    /// True when the error only means the peer went away.
    ///
    /// Used by the connection loop to tell a client hanging up apart from a
    /// real failure worth a warning.
    pub fn is_disconnect(&self) -> bool {
        match self {
            EmberError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// True when a socket read or write hit its configured timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            // Windows reports TimedOut where unix reports WouldBlock
            EmberError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
