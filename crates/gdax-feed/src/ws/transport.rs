/*
[INPUT]:  Feed endpoint URL
[OUTPUT]: Split duplex transport (sink + stream) over a websocket
[POS]:    WebSocket layer - transport abstraction and tungstenite adapter
[UPDATE]: When changing the transport stack or frame mapping
*/

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::error::{Result, StreamError};

/// Write half of a feed transport
#[async_trait]
pub trait TransportSink: Send {
    /// Send one text frame
    async fn send(&mut self, text: String) -> Result<()>;

    /// Send a transport-level ping frame
    async fn ping(&mut self, payload: Vec<u8>) -> Result<()>;

    /// Close the transport.
    ///
    /// Fails with an error for which
    /// [`is_connection_closed`](StreamError::is_connection_closed) is true
    /// when the connection was already gone.
    async fn close(&mut self) -> Result<()>;
}

/// Read half of a feed transport.
///
/// `recv` resolves to `Ok(None)` when the peer ends the stream.
#[async_trait]
pub trait TransportStream: Send {
    async fn recv(&mut self) -> Result<Option<String>>;
}

/// Opens transports for a feed endpoint
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)>;
}

/// Production connector backed by tokio-tungstenite
#[derive(Debug, Default)]
pub struct WsConnect;

#[async_trait]
impl Connect for WsConnect {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
        let (ws_stream, _response) = connect_async(url).await?;
        let (write, read) = ws_stream.split();
        Ok((Box::new(WsSink { write }), Box::new(WsStream { read })))
    }
}

type WsDuplex = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WsSink {
    write: SplitSink<WsDuplex, WsMessage>,
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, text: String) -> Result<()> {
        self.write.send(WsMessage::Text(text.into())).await?;
        Ok(())
    }

    async fn ping(&mut self, payload: Vec<u8>) -> Result<()> {
        self.write.send(WsMessage::Ping(payload.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        match self.write.send(WsMessage::Close(None)).await {
            Ok(()) => Ok(()),
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                Err(StreamError::ConnectionClosed)
            }
            Err(err) => Err(err.into()),
        }
    }
}

struct WsStream {
    read: SplitStream<WsDuplex>,
}

#[async_trait]
impl TransportStream for WsStream {
    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            match self.read.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => {
                        debug!(bytes = bytes.len(), "skipping non-UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
                // Ping/Pong bookkeeping is handled by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => return Ok(None),
                Some(Err(err)) => return Err(err.into()),
            }
        }
    }
}
