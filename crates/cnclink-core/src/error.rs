//! Error handling for CncLink
//!
//! Provides error types for the session layer:
//! - Connection errors (transport related)
//! - Session errors (channel names, correlated replies)
//!
//! Expected no-ops such as issuing a command without an open port are not
//! errors and never surface here. All error types use `thiserror`.

use thiserror::Error;

/// Connection error type
///
/// Represents failures reported by the underlying transport while opening,
/// authenticating, or using the shared event channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Transport is not connected
    #[error("Transport not connected")]
    NotConnected,

    /// Session token was rejected or missing
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed {
        /// The reason the token was rejected.
        reason: String,
    },

    /// Connection attempt timed out
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Reconnection attempts were exhausted
    #[error("Reconnection failed after {attempts} attempts")]
    ReconnectFailed {
        /// Number of attempts made by the transport.
        attempts: u32,
    },

    /// Generic transport error
    #[error("Transport error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Session error type
///
/// Represents misuse of a session (unknown channel names) and failures of
/// correlated request/response exchanges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Channel name is not part of the fixed catalog
    #[error("Unknown event channel: {name}")]
    UnknownChannel {
        /// The name that was rejected.
        name: String,
    },

    /// No reply arrived before the deadline
    #[error("No reply to '{event}' within {timeout_ms}ms")]
    ReplyTimeout {
        /// The event name the reply was expected on.
        event: String,
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The pending reply was cancelled before it arrived
    #[error("Reply to '{event}' was cancelled")]
    ReplyCancelled {
        /// The event name the reply was expected on.
        event: String,
    },

    /// Transport failure
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Main error type for CncLink
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Payload (de)serialization error
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Session(SessionError::ReplyTimeout { .. })
                | Error::Connection(ConnectionError::ConnectionTimeout { .. })
                | Error::Session(SessionError::Connection(
                    ConnectionError::ConnectionTimeout { .. }
                ))
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Session(SessionError::Connection(_))
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
