/*
[INPUT]:  Error sources (transport, parsing, credentials, lifecycle)
[OUTPUT]: Structured error types for the feed client
[POS]:    Error handling layer - unified error type for the entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Main error type for the GDAX feed client
#[derive(Error, Debug)]
pub enum StreamError {
    /// Websocket transport failed
    #[error("websocket transport error: {0}")]
    Transport(#[from] WsError),

    /// Inbound frame was not valid JSON
    #[error("malformed feed message: {0}")]
    Parse(#[from] serde_json::Error),

    /// The peer ended the stream without a local close
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// `start` was called while a previous worker is still active
    #[error("stream worker already running")]
    AlreadyRunning,

    /// Credential material could not be used for signing
    #[error("invalid credential: {0}")]
    Credential(String),
}

impl StreamError {
    /// Check whether the error only says the connection is already closed.
    ///
    /// Distinguished so disconnect can suppress it while surfacing every
    /// other close-time failure.
    pub fn is_connection_closed(&self) -> bool {
        matches!(
            self,
            StreamError::ConnectionClosed
                | StreamError::Transport(WsError::ConnectionClosed)
                | StreamError::Transport(WsError::AlreadyClosed)
        )
    }

    /// Check whether the error came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StreamError::Transport(_) | StreamError::ConnectionClosed
        )
    }
}

/// Result type alias for feed operations
pub type Result<T> = std::result::Result<T, StreamError>;
