/*
[INPUT]:  Stream configuration and handler hooks
[OUTPUT]: Real-time feed messages routed through the hooks
[POS]:    WebSocket layer - connection lifecycle and data stream
[UPDATE]: When adding modules or changing connection logic
*/

pub mod client;
pub mod config;
pub mod handler;
pub mod message;
pub mod transport;

pub use client::StreamClient;
pub use config::{DEFAULT_PRODUCT, Endpoint, StreamConfig};
pub use handler::{LogHandler, StreamHandler};
pub use message::{AuthFields, HeartbeatRequest, SubscribeRequest};
pub use transport::{Connect, TransportSink, TransportStream, WsConnect};
