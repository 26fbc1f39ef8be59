/*
[INPUT]:  API credential material
[OUTPUT]: Signed authentication fields for the subscribe handshake
[POS]:    Auth layer - handles GDAX feed authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod credential;

pub use credential::ApiCredential;
