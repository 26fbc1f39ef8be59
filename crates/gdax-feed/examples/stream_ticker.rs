/*
[INPUT]:  Feed endpoint and product list
[OUTPUT]: Live ticker messages printed with a running count
[POS]:    Examples - basic feed streaming
[UPDATE]: When the client API changes
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gdax_feed::{StreamClient, StreamConfig, StreamHandler};
use serde_json::Value;

/// Example: count ticker messages from the production feed
struct CountingHandler {
    message_count: AtomicUsize,
}

#[async_trait]
impl StreamHandler for CountingHandler {
    async fn on_open(&self) {
        println!("Let's count the messages!");
    }

    async fn on_message(&self, message: Value) {
        println!("{message:#}");
        self.message_count.fetch_add(1, Ordering::Relaxed);
    }

    async fn on_close(&self) {
        println!("-- Goodbye! --");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let handler = Arc::new(CountingHandler {
        message_count: AtomicUsize::new(0),
    });

    let config = StreamConfig::new()
        .products(["BTC-USD", "ETH-USD"])
        .channels(["ticker"]);

    let mut client = StreamClient::new(config, handler.clone());
    if let Err(err) = client.start() {
        eprintln!("failed to start stream: {err}");
        std::process::exit(1);
    }

    // Print a running count until interrupted.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                println!(
                    "MessageCount = {}",
                    handler.message_count.load(Ordering::Relaxed)
                );
            }
        }
    }

    client.close().await;

    if let Some(err) = client.take_last_error() {
        eprintln!("stream ended with error: {err}");
        std::process::exit(1);
    }
}
