//! HMAC-SHA256 signatures used by the payment gateway.
//!
//! Two independent secrets are in play:
//! * The API key secret signs checkout completions: `hex(HMAC(key_secret, "{order_id}|{payment_id}"))`.
//! * The webhook secret signs webhook deliveries: `hex(HMAC(webhook_secret, raw_body))`.
//!
//! A presented signature must be the lowercase hex digest, byte for byte. The digest itself is checked with
//! [`Mac::verify_slice`], which compares in constant time. The expected value is never exposed by the verification
//! methods. Nothing verifies under an empty secret.
use hmac::{digest::InvalidLength, Hmac, Mac};
use hood_common::Secret;
use log::*;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 digest.
const SIGNATURE_HEX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The signing secret is not configured")]
    MissingSecret,
    #[error("The signing key was rejected. {0}")]
    InvalidKey(String),
}

impl From<InvalidLength> for SignatureError {
    fn from(e: InvalidLength) -> Self {
        Self::InvalidKey(e.to_string())
    }
}

/// Hex-encoded HMAC-SHA256 of `message` under `key`.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn is_canonical_hex(presented: &str) -> bool {
    presented.len() == SIGNATURE_HEX_LEN && presented.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn verify_hex(key: &[u8], message: &[u8], presented: &str) -> bool {
    if key.is_empty() {
        warn!("🔐️ Signing secret is not configured. Rejecting the signature.");
        return false;
    }
    if !is_canonical_hex(presented) {
        trace!("🔐️ Presented signature is not a lowercase hex digest");
        return false;
    }
    let Ok(presented) = hex::decode(presented) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&presented).is_ok()
}

fn sign(key: &str, message: &[u8]) -> Result<String, SignatureError> {
    if key.is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    hmac_sha256_hex(key.as_bytes(), message)
}

#[derive(Clone, Default)]
pub struct PaymentSignatures {
    key_secret: Secret<String>,
    webhook_secret: Secret<String>,
}

impl std::fmt::Debug for PaymentSignatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentSignatures(key_secret: {}, webhook_secret: {})", self.key_secret, self.webhook_secret)
    }
}

impl PaymentSignatures {
    pub fn new(key_secret: Secret<String>, webhook_secret: Secret<String>) -> Self {
        Self { key_secret, webhook_secret }
    }

    fn checkout_message(order_id: &str, payment_id: &str) -> String {
        format!("{order_id}|{payment_id}")
    }

    /// The signature the gateway hands the client after a successful checkout. Servers only need this for testing
    /// and tooling; verification goes through [`Self::verify_checkout`].
    pub fn checkout_signature(&self, order_id: &str, payment_id: &str) -> Result<String, SignatureError> {
        let message = Self::checkout_message(order_id, payment_id);
        sign(self.key_secret.reveal(), message.as_bytes())
    }

    pub fn verify_checkout(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let message = Self::checkout_message(order_id, payment_id);
        let valid = verify_hex(self.key_secret.reveal().as_bytes(), message.as_bytes(), signature);
        debug!("🔐️ Checkout signature for {order_id}|{payment_id} valid: {valid}");
        valid
    }

    pub fn webhook_signature(&self, body: &[u8]) -> Result<String, SignatureError> {
        sign(self.webhook_secret.reveal(), body)
    }

    pub fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        let valid = verify_hex(self.webhook_secret.reveal().as_bytes(), body, signature);
        debug!("🔐️ Webhook signature valid: {valid}");
        valid
    }
}
