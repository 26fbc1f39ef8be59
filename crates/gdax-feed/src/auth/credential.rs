/*
[INPUT]:  API key, base64-encoded secret, and passphrase
[OUTPUT]: HMAC-SHA256 signatures for the authenticated handshake
[POS]:    Auth layer - credential storage and request signing
[UPDATE]: When changing signing algorithm or credential sources
*/

use std::fmt::Debug;

use aws_lc_rs::hmac;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use zeroize::ZeroizeOnDrop;

use crate::error::{Result, StreamError};

/// Request path signed for the websocket authentication handshake
pub const WS_VERIFY_PATH: &str = "/users/self/verify";

const ENV_API_KEY: &str = "GDAX_API_KEY";
const ENV_API_SECRET: &str = "GDAX_API_SECRET";
const ENV_API_PASSPHRASE: &str = "GDAX_API_PASSPHRASE";

/// GDAX API credentials for signing the subscribe handshake.
///
/// The secret is the base64 string issued by the exchange; it is used only
/// as HMAC key material after decoding and never transmitted. Secret and
/// passphrase are zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct ApiCredential {
    #[zeroize(skip)]
    api_key: String,
    api_secret: Box<[u8]>,
    passphrase: String,
}

impl Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ApiCredential))
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl ApiCredential {
    /// Create a new [`ApiCredential`] instance
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret: api_secret.into_bytes().into_boxed_slice(),
            passphrase,
        }
    }

    /// Load credentials from `GDAX_API_KEY`, `GDAX_API_SECRET`, and
    /// `GDAX_API_PASSPHRASE`.
    ///
    /// Returns `None` if any of the three variables is not set.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var(ENV_API_KEY).ok()?;
        let secret = std::env::var(ENV_API_SECRET).ok()?;
        let passphrase = std::env::var(ENV_API_PASSPHRASE).ok()?;
        Some(Self::new(key, secret, passphrase))
    }

    /// Resolve credentials from provided values or the environment.
    ///
    /// All three provided uses those; none provided falls back to
    /// [`from_env`](Self::from_env).
    ///
    /// # Errors
    ///
    /// Returns an error if only part of the triple is provided, so a typo
    /// never silently falls through to environment variables.
    pub fn resolve(
        api_key: Option<String>,
        api_secret: Option<String>,
        passphrase: Option<String>,
    ) -> Result<Option<Self>> {
        match (api_key, api_secret, passphrase) {
            (Some(key), Some(secret), Some(passphrase)) => {
                Ok(Some(Self::new(key, secret, passphrase)))
            }
            (None, None, None) => Ok(Self::from_env()),
            _ => Err(StreamError::Credential(
                "api key, secret, and passphrase must be provided together".to_string(),
            )),
        }
    }

    /// Returns the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the passphrase
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Sign `timestamp + method + path + body` with HMAC-SHA256 keyed by
    /// the base64-decoded secret, returning the base64-encoded digest.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Credential`] when the secret is not valid
    /// base64.
    pub fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> Result<String> {
        let key_material = BASE64.decode(&self.api_secret).map_err(|err| {
            StreamError::Credential(format!("api secret is not valid base64: {err}"))
        })?;

        let key = hmac::Key::new(hmac::HMAC_SHA256, &key_material);
        let message = format!("{timestamp}{method}{path}{body}");
        let tag = hmac::sign(&key, message.as_bytes());
        Ok(BASE64.encode(tag.as_ref()))
    }
}
