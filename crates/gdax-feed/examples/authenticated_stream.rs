/*
[INPUT]:  API credentials from the environment
[OUTPUT]: Authenticated feed session against the sandbox
[POS]:    Examples - signed subscribe handshake
[UPDATE]: When the auth flow changes
*/

use std::sync::Arc;
use std::time::Duration;

use gdax_feed::{ApiCredential, Endpoint, LogHandler, StreamClient, StreamConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(credential) = ApiCredential::from_env() else {
        eprintln!("set GDAX_API_KEY, GDAX_API_SECRET, and GDAX_API_PASSPHRASE first");
        std::process::exit(1);
    };

    let config = StreamConfig::new()
        .product("BTC-USD")
        .channels(["user", "heartbeat"])
        .endpoint(Endpoint::Sandbox)
        .credential(credential);

    let mut client = StreamClient::new(config, Arc::new(LogHandler));
    if let Err(err) = client.start() {
        eprintln!("failed to start stream: {err}");
        std::process::exit(1);
    }

    // Stream for a short while, then shut down cleanly.
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = tokio::time::sleep(Duration::from_secs(30)) => {}
    }

    client.close().await;

    if let Some(err) = client.take_last_error() {
        eprintln!("stream ended with error: {err}");
        std::process::exit(1);
    }
}
