/*
[INPUT]:  Scripted transport events and handler expectations
[OUTPUT]: Shared mock transport, connector, and recording handler
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for gdax-feed tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Error as WsError;

use gdax_feed::{Connect, StreamError, StreamHandler, TransportSink, TransportStream};

/// One scripted inbound event: a frame, an end-of-stream, or an error
pub type ScriptEvent = gdax_feed::Result<Option<String>>;

/// A transport error for scripting receive failures
pub fn transport_error(message: &str) -> StreamError {
    StreamError::Transport(WsError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        message.to_string(),
    )))
}

/// Shared view over everything the client wrote to the mock transport
pub struct MockFeed {
    pub connector: Arc<MockConnect>,
    pub sent: Arc<Mutex<Vec<String>>>,
    pub pings: Arc<AtomicUsize>,
    pub sink_closes: Arc<AtomicUsize>,
}

impl MockFeed {
    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().expect("sent frames lock").clone()
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::Relaxed)
    }

    pub fn sink_close_count(&self) -> usize {
        self.sink_closes.load(Ordering::Relaxed)
    }
}

/// Build a mock feed; each inner script is one scripted connection.
///
/// A connection's stream replays its script in order and then stays silent
/// forever (a quiet peer), so the worker blocks in receive until stopped.
pub fn scripted_feed(scripts: Vec<Vec<ScriptEvent>>) -> MockFeed {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let pings = Arc::new(AtomicUsize::new(0));
    let sink_closes = Arc::new(AtomicUsize::new(0));

    let connections = scripts
        .into_iter()
        .map(|script| {
            let sink: Box<dyn TransportSink> = Box::new(MockSink {
                sent: Arc::clone(&sent),
                pings: Arc::clone(&pings),
                closes: Arc::clone(&sink_closes),
            });
            let stream: Box<dyn TransportStream> = Box::new(MockStream {
                script: script.into_iter().collect(),
            });
            (sink, stream)
        })
        .collect();

    MockFeed {
        connector: Arc::new(MockConnect {
            connections: Mutex::new(connections),
        }),
        sent,
        pings,
        sink_closes,
    }
}

/// Connector handing out scripted connections; refuses once exhausted
pub struct MockConnect {
    connections: Mutex<VecDeque<(Box<dyn TransportSink>, Box<dyn TransportStream>)>>,
}

#[async_trait]
impl Connect for MockConnect {
    async fn connect(
        &self,
        _url: &str,
    ) -> gdax_feed::Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
        self.connections
            .lock()
            .expect("connections lock")
            .pop_front()
            .ok_or_else(|| {
                StreamError::Transport(WsError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "mock connect refused",
                )))
            })
    }
}

struct MockSink {
    sent: Arc<Mutex<Vec<String>>>,
    pings: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl TransportSink for MockSink {
    async fn send(&mut self, text: String) -> gdax_feed::Result<()> {
        self.sent.lock().expect("sent frames lock").push(text);
        Ok(())
    }

    async fn ping(&mut self, _payload: Vec<u8>) -> gdax_feed::Result<()> {
        self.pings.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&mut self) -> gdax_feed::Result<()> {
        self.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

struct MockStream {
    script: VecDeque<ScriptEvent>,
}

#[async_trait]
impl TransportStream for MockStream {
    async fn recv(&mut self) -> gdax_feed::Result<Option<String>> {
        match self.script.pop_front() {
            Some(event) => event,
            // Script exhausted: behave like a peer that went quiet.
            None => std::future::pending().await,
        }
    }
}

/// Handler that counts lifecycle hooks and forwards messages and errors
pub struct RecordingHandler {
    opens: AtomicUsize,
    closes: AtomicUsize,
    msg_tx: mpsc::UnboundedSender<Value>,
    err_tx: mpsc::UnboundedSender<String>,
}

impl RecordingHandler {
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StreamHandler for RecordingHandler {
    async fn on_open(&self) {
        self.opens.fetch_add(1, Ordering::Relaxed);
    }

    async fn on_message(&self, message: Value) {
        let _ = self.msg_tx.send(message);
    }

    async fn on_error(&self, error: &StreamError, _raw: Option<&str>) {
        let _ = self.err_tx.send(error.to_string());
    }

    async fn on_close(&self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Receiving ends for everything a [`RecordingHandler`] observed
pub struct RecordedEvents {
    pub messages: mpsc::UnboundedReceiver<Value>,
    pub errors: mpsc::UnboundedReceiver<String>,
}

pub fn recording_handler() -> (Arc<RecordingHandler>, RecordedEvents) {
    let (msg_tx, messages) = mpsc::unbounded_channel();
    let (err_tx, errors) = mpsc::unbounded_channel();

    let handler = Arc::new(RecordingHandler {
        opens: AtomicUsize::new(0),
        closes: AtomicUsize::new(0),
        msg_tx,
        err_tx,
    });

    (handler, RecordedEvents { messages, errors })
}

/// Await one event from a recorded channel, failing fast on a stall
pub async fn next_event<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}
