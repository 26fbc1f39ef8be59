/*
[INPUT]:  Stream configuration, handler hooks, and a transport connector
[OUTPUT]: Background worker streaming feed messages into the hooks
[POS]:    WebSocket layer - connection lifecycle state machine
[UPDATE]: When changing handshake, keepalive, or shutdown semantics
*/

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, StreamError};
use crate::ws::config::StreamConfig;
use crate::ws::handler::StreamHandler;
use crate::ws::message::{AuthFields, HeartbeatRequest, SubscribeRequest};
use crate::ws::transport::{Connect, TransportSink, TransportStream, WsConnect};

const KEEPALIVE_PAYLOAD: &[u8] = b"keepalive";

/// Streaming client for the GDAX websocket feed.
///
/// Owns one background worker per [`start`](Self::start) call. The worker
/// connects, sends the subscribe handshake, and routes every inbound frame
/// to the injected [`StreamHandler`] until [`close`](Self::close) is
/// called or the transport is judged dead.
pub struct StreamClient {
    config: StreamConfig,
    handler: Arc<dyn StreamHandler>,
    connector: Arc<dyn Connect>,
    cancel: CancellationToken,
    last_error: Arc<Mutex<Option<StreamError>>>,
    worker_handle: Option<JoinHandle<()>>,
}

impl StreamClient {
    /// Create a client with the production websocket connector
    pub fn new(config: StreamConfig, handler: Arc<dyn StreamHandler>) -> Self {
        Self::with_connector(config, handler, Arc::new(WsConnect))
    }

    /// Create a client with a custom transport connector
    pub fn with_connector(
        config: StreamConfig,
        handler: Arc<dyn StreamHandler>,
        connector: Arc<dyn Connect>,
    ) -> Self {
        Self {
            config,
            handler,
            connector,
            cancel: CancellationToken::new(),
            last_error: Arc::new(Mutex::new(None)),
            worker_handle: None,
        }
    }

    /// Spawn the background worker: connect, stream, disconnect.
    ///
    /// Returns immediately; connection progress is reported through the
    /// handler hooks. Run state (stop signal, last error) is reset on each
    /// call.
    ///
    /// # Errors
    ///
    /// Fails with [`StreamError::AlreadyRunning`] while a previous worker
    /// is still active. A finished worker is cleaned up and the client can
    /// be started again.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(StreamError::AlreadyRunning);
        }
        self.worker_handle = None;

        self.cancel = CancellationToken::new();
        *lock_slot(&self.last_error) = None;

        let worker = StreamWorker {
            config: self.config.clone(),
            handler: Arc::clone(&self.handler),
            connector: Arc::clone(&self.connector),
            cancel: self.cancel.clone(),
            last_error: Arc::clone(&self.last_error),
        };

        self.worker_handle = Some(tokio::spawn(worker.run()));
        Ok(())
    }

    /// Request shutdown and wait for the worker to finish.
    ///
    /// This is the single join barrier: by the time it returns, connect,
    /// receive loop, and disconnect have all completed and the on-close
    /// hook has run. Calling it before `start`, or again after the worker
    /// exited, is a no-op.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.worker_handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "stream worker join failed");
            }
        }
    }

    /// Take the last error recovered by the worker, clearing the slot.
    ///
    /// Errors absorbed by the receive loop are observable here after
    /// [`close`](Self::close) returns.
    pub fn take_last_error(&self) -> Option<StreamError> {
        lock_slot(&self.last_error).take()
    }

    /// Whether a worker is currently active
    pub fn is_running(&self) -> bool {
        self.worker_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(StreamClient))
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

// A poisoned slot only means a hook panicked mid-write; the value is still
// a plain Option and safe to reuse.
fn lock_slot(slot: &Mutex<Option<StreamError>>) -> MutexGuard<'_, Option<StreamError>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Background worker owning the transport from connect to disconnect
struct StreamWorker {
    config: StreamConfig,
    handler: Arc<dyn StreamHandler>,
    connector: Arc<dyn Connect>,
    cancel: CancellationToken,
    last_error: Arc<Mutex<Option<StreamError>>>,
}

impl StreamWorker {
    async fn run(self) {
        let url = self.config.endpoint.url();
        let (mut sink, mut stream) = match self.connector.connect(url).await {
            Ok(halves) => halves,
            Err(err) => {
                warn!(url, error = %err, "feed connect failed");
                self.report(err, None).await;
                self.disconnect(None).await;
                return;
            }
        };

        match self.handshake(sink.as_mut()).await {
            Ok(()) => self.listen(sink.as_mut(), stream.as_mut()).await,
            Err(err) => self.report(err, None).await,
        }

        self.disconnect(Some(sink)).await;
    }

    /// Send the subscribe handshake (and the heartbeat-on frame when
    /// configured).
    async fn handshake(&self, sink: &mut dyn TransportSink) -> Result<()> {
        let products = self.config.effective_products();
        let mut subscribe = SubscribeRequest::new(products, self.config.channels.clone());
        if let Some(credential) = &self.config.credential {
            subscribe = subscribe.with_auth(AuthFields::sign(credential)?);
        }

        // The open hook runs before the subscribe frame goes out; config is
        // immutable at this point, so the frame cannot be affected by it.
        self.handler.on_open().await;

        sink.send(serde_json::to_string(&subscribe)?).await?;
        info!(
            products = ?subscribe.product_ids,
            channels = ?subscribe.channels,
            authenticated = subscribe.auth.is_some(),
            "subscribe handshake sent"
        );

        if self.config.heartbeat {
            sink.send(serde_json::to_string(&HeartbeatRequest::new(true))?)
                .await?;
        }

        Ok(())
    }

    /// Receive loop: runs until stop is requested or the transport is
    /// judged dead. One bad frame never terminates the loop.
    async fn listen(&self, sink: &mut dyn TransportSink, stream: &mut dyn TransportStream) {
        let mut keepalive = time::interval_at(
            time::Instant::now() + self.config.keepalive_interval,
            self.config.keepalive_interval,
        );
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut consecutive_errors: u32 = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("stop requested, leaving receive loop");
                    return;
                }
                _ = keepalive.tick() => {
                    debug!("sending keepalive ping");
                    if let Err(err) = sink.ping(KEEPALIVE_PAYLOAD.to_vec()).await {
                        consecutive_errors += 1;
                        self.report(err, None).await;
                        if self.transport_gave_up(consecutive_errors) {
                            return;
                        }
                    }
                }
                frame = stream.recv() => {
                    match frame {
                        Ok(Some(raw)) => {
                            consecutive_errors = 0;
                            match serde_json::from_str::<Value>(&raw) {
                                Ok(message) => self.handler.on_message(message).await,
                                Err(err) => {
                                    self.report(StreamError::Parse(err), Some(&raw)).await;
                                }
                            }
                        }
                        Ok(None) => {
                            info!("feed stream ended by peer");
                            self.report(StreamError::ConnectionClosed, None).await;
                            return;
                        }
                        Err(err) => {
                            consecutive_errors += 1;
                            self.report(err, None).await;
                            if self.transport_gave_up(consecutive_errors) {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Orderly shutdown: heartbeat-off when configured, close the
    /// transport, and fire the close hook exactly once.
    async fn disconnect(&self, sink: Option<Box<dyn TransportSink>>) {
        if let Some(mut sink) = sink {
            if self.config.heartbeat {
                // Best-effort: the transport may already be gone.
                if let Ok(frame) = serde_json::to_string(&HeartbeatRequest::new(false)) {
                    let _ = sink.send(frame).await;
                }
            }

            match sink.close().await {
                Ok(()) => {}
                Err(err) if err.is_connection_closed() => {
                    debug!("transport already closed");
                }
                Err(err) => self.report(err, None).await,
            }
        }

        self.handler.on_close().await;
        debug!("stream worker finished");
    }

    /// Surface a recovered error through the hook and the last-error slot
    async fn report(&self, error: StreamError, raw: Option<&str>) {
        self.handler.on_error(&error, raw).await;
        *lock_slot(&self.last_error) = Some(error);
    }

    fn transport_gave_up(&self, consecutive_errors: u32) -> bool {
        if consecutive_errors >= self.config.max_consecutive_errors {
            warn!(
                consecutive_errors,
                limit = self.config.max_consecutive_errors,
                "transport failing repeatedly, stopping stream"
            );
            true
        } else {
            false
        }
    }
}
