/*
[INPUT]:  Lifecycle events and inbound feed messages
[OUTPUT]: Caller-defined side effects at each lifecycle point
[POS]:    WebSocket layer - hook surface for the stream worker
[UPDATE]: When adding hooks or changing invocation guarantees
*/

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::StreamError;

/// Lifecycle hooks invoked by the stream worker.
///
/// Hooks run on the worker task, so implementations must not block
/// indefinitely or they stall the receive loop and the keepalive. Every
/// default logs through `tracing` and does nothing else.
#[async_trait]
pub trait StreamHandler: Send + Sync {
    /// Called once the transport is open, before the subscribe handshake
    /// goes out.
    async fn on_open(&self) {
        info!("feed subscribed");
    }

    /// Called for every successfully parsed inbound message
    async fn on_message(&self, message: Value) {
        debug!(%message, "feed message");
    }

    /// Called for every recovered error; `raw` carries the offending frame
    /// when one exists. The error is also recorded as the client's last
    /// error.
    async fn on_error(&self, error: &StreamError, raw: Option<&str>) {
        match raw {
            Some(raw) => error!(%error, raw, "feed error"),
            None => error!(%error, "feed error"),
        }
    }

    /// Called exactly once when the worker shuts down
    async fn on_close(&self) {
        info!("feed socket closed");
    }
}

/// Handler that keeps all the default logging hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHandler;

#[async_trait]
impl StreamHandler for LogHandler {}
