//! Error types for peerwire.

use thiserror::Error;

/// Main error type for all peerwire operations.
#[derive(Debug, Error)]
pub enum PeerwireError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (stdout event sink only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (bad length header, oversized frame, invalid UTF-8).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection closed by the peer.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Reply arrived but carries fewer fields than the verb requires.
    #[error("Reply too short: expected at least {expected} fields, got {actual}")]
    ShortReply {
        /// Minimum field count required by the verb.
        expected: usize,
        /// Field count actually received.
        actual: usize,
    },

    /// Reply fields could not be parsed into the expected record.
    #[error("Hydration failed: {0}")]
    Hydration(String),

    /// Peer sent more notifications than the configured drain limit.
    #[error("Notification limit exceeded: drained {0} notifications without a reply")]
    NotificationFlood(usize),

    /// Reply did not arrive within the configured deadline.
    #[error("Reply timeout")]
    ReplyTimeout,

    /// An earlier exchange ended before its reply was read, so the next
    /// frame on the stream cannot be trusted to answer a new request.
    #[error("Connection out of step with peer")]
    OutOfStep,
}

impl PeerwireError {
    /// Whether this error means the transport itself is unusable.
    ///
    /// Short replies and hydration failures leave the connection intact.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            PeerwireError::Io(_)
                | PeerwireError::Protocol(_)
                | PeerwireError::ConnectionClosed
                | PeerwireError::OutOfStep
        )
    }
}

/// Result type alias using PeerwireError.
pub type Result<T> = std::result::Result<T, PeerwireError>;
