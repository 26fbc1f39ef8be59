/*
[INPUT]:  Endpoint selection, products, channels, and auth options
[OUTPUT]: Immutable stream configuration consumed by the worker
[POS]:    WebSocket layer - client configuration
[UPDATE]: When adding connection options or changing defaults
*/

use std::time::Duration;

use crate::auth::ApiCredential;

/// Feed URLs for the GDAX websocket endpoints
const PRODUCTION_URL: &str = "wss://ws-feed.gdax.com";
const SANDBOX_URL: &str = "wss://ws-feed-public.sandbox.gdax.com";

/// Product subscribed when none is configured
pub const DEFAULT_PRODUCT: &str = "BTC-USD";

const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Feed endpoint selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    /// Live production feed
    #[default]
    Production,
    /// Public sandbox feed
    Sandbox,
}

impl Endpoint {
    /// Websocket URL for this endpoint
    pub fn url(&self) -> &'static str {
        match self {
            Endpoint::Production => PRODUCTION_URL,
            Endpoint::Sandbox => SANDBOX_URL,
        }
    }
}

/// Stream client configuration.
///
/// Built before [`StreamClient::start`](crate::ws::StreamClient::start) and
/// immutable afterwards; the worker reads its own copy.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub products: Vec<String>,
    pub channels: Option<Vec<String>>,
    pub credential: Option<ApiCredential>,
    pub endpoint: Endpoint,
    /// Send server-side heartbeat toggle frames around the session
    pub heartbeat: bool,
    pub keepalive_interval: Duration,
    /// Consecutive transport failures tolerated before the worker gives up
    pub max_consecutive_errors: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            channels: None,
            credential: None,
            endpoint: Endpoint::default(),
            heartbeat: false,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

impl StreamConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single product identifier to the subscription
    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.products.push(product.into());
        self
    }

    /// Replace the product list
    pub fn products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = products.into_iter().map(Into::into).collect();
        self
    }

    /// Set the channel names to subscribe to
    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = Some(channels.into_iter().map(Into::into).collect());
        self
    }

    /// Attach credentials for the authenticated handshake
    pub fn credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Select the feed endpoint
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Enable the server-side heartbeat toggle frames
    pub fn heartbeat(mut self, enabled: bool) -> Self {
        self.heartbeat = enabled;
        self
    }

    /// Override the keepalive ping interval
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Override how many consecutive transport failures end the stream
    pub fn max_consecutive_errors(mut self, limit: u32) -> Self {
        self.max_consecutive_errors = limit;
        self
    }

    /// Product list actually subscribed: the configured products, or the
    /// built-in default when none were set.
    pub(crate) fn effective_products(&self) -> Vec<String> {
        if self.products.is_empty() {
            vec![DEFAULT_PRODUCT.to_string()]
        } else {
            self.products.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::new();

        assert!(config.products.is_empty());
        assert!(config.channels.is_none());
        assert!(config.credential.is_none());
        assert_eq!(config.endpoint, Endpoint::Production);
        assert!(!config.heartbeat);
        assert_eq!(config.keepalive_interval, Duration::from_secs(30));
        assert_eq!(config.max_consecutive_errors, 5);
    }

    #[test]
    fn test_empty_products_default_to_builtin() {
        let config = StreamConfig::new();
        assert_eq!(config.effective_products(), vec![DEFAULT_PRODUCT]);
    }

    #[test]
    fn test_single_product_becomes_one_element_list() {
        let config = StreamConfig::new().product("ETH-USD");
        assert_eq!(config.effective_products(), vec!["ETH-USD"]);
    }

    #[test]
    fn test_products_replace_the_list() {
        let config = StreamConfig::new()
            .product("ETH-USD")
            .products(["BTC-USD", "LTC-USD"]);
        assert_eq!(config.effective_products(), vec!["BTC-USD", "LTC-USD"]);
    }

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(Endpoint::Production.url(), "wss://ws-feed.gdax.com");
        assert_eq!(
            Endpoint::Sandbox.url(),
            "wss://ws-feed-public.sandbox.gdax.com"
        );
    }
}
