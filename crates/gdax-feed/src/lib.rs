/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public GDAX feed client surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod error;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::ApiCredential;

// Re-export error types
pub use error::{Result, StreamError};

// Re-export commonly used types from ws
pub use ws::{
    Connect,
    Endpoint,
    LogHandler,
    StreamClient,
    StreamConfig,
    StreamHandler,
    TransportSink,
    TransportStream,
    WsConnect,
};
