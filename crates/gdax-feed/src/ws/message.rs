/*
[INPUT]:  Subscription targets and optional signed credentials
[OUTPUT]: Typed outbound frames for the feed handshake
[POS]:    WebSocket layer - wire message construction
[UPDATE]: When the handshake format or auth fields change
*/

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::ApiCredential;
use crate::auth::credential::WS_VERIFY_PATH;
use crate::error::Result;

/// Authentication fields attached to the subscribe handshake.
///
/// Carries the signature and its inputs; the raw secret never appears here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFields {
    pub signature: String,
    pub key: String,
    pub passphrase: String,
    pub timestamp: String,
}

impl AuthFields {
    /// Sign the verify path with a fresh wall-clock timestamp.
    ///
    /// The timestamp is whole seconds since the epoch, generated fresh for
    /// each connect.
    pub fn sign(credential: &ApiCredential) -> Result<Self> {
        Self::sign_at(credential, Utc::now().timestamp().to_string())
    }

    /// Sign the verify path with an explicit timestamp
    pub fn sign_at(credential: &ApiCredential, timestamp: String) -> Result<Self> {
        let signature = credential.sign(&timestamp, "GET", WS_VERIFY_PATH, "")?;
        Ok(Self {
            signature,
            key: credential.api_key().to_string(),
            passphrase: credential.passphrase().to_string(),
            timestamp,
        })
    }
}

/// Subscribe handshake declaring which products and channels to receive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub message_type: String,
    pub product_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    #[serde(flatten)]
    pub auth: Option<AuthFields>,
}

impl SubscribeRequest {
    /// Build the subscribe handshake for the given products and channels
    pub fn new(product_ids: Vec<String>, channels: Option<Vec<String>>) -> Self {
        Self {
            message_type: "subscribe".to_string(),
            product_ids,
            channels,
            auth: None,
        }
    }

    /// Attach signed authentication fields
    pub fn with_auth(mut self, auth: AuthFields) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Server-side heartbeat toggle frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    #[serde(rename = "type")]
    pub message_type: String,
    pub on: bool,
}

impl HeartbeatRequest {
    /// Build a heartbeat toggle frame
    pub fn new(on: bool) -> Self {
        Self {
            message_type: "heartbeat".to_string(),
            on,
        }
    }
}
