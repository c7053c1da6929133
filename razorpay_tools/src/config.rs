use std::time::Duration;

use hood_common::{helpers::env_parsed, Secret};
use log::*;

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
pub const DEFAULT_RAZORPAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// The public key id. Safe to hand to clients.
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: String::default(),
            key_secret: Secret::default(),
            webhook_secret: Secret::default(),
            api_url: DEFAULT_RAZORPAY_API_URL.to_string(),
            timeout: DEFAULT_RAZORPAY_TIMEOUT,
        }
    }
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let key_id = std::env::var("RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            error!("🪛️ RAZORPAY_KEY_ID is not set. Checkout will not work until it is.");
            String::default()
        });
        let key_secret = Secret::new(std::env::var("RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            error!("🪛️ RAZORPAY_KEY_SECRET is not set. Gateway calls and signature checks will fail.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("RAZORPAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            error!("🪛️ RAZORPAY_WEBHOOK_SECRET is not set. Every webhook delivery will be rejected.");
            String::default()
        }));
        let api_url = std::env::var("RAZORPAY_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_RAZORPAY_API_URL.to_string());
        let timeout = env_parsed::<u64>("RAZORPAY_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or_else(|| {
            debug!("🪛️ RAZORPAY_TIMEOUT_SECS not set. Using {}s.", DEFAULT_RAZORPAY_TIMEOUT.as_secs());
            DEFAULT_RAZORPAY_TIMEOUT
        });
        Self { key_id, key_secret, webhook_secret, api_url, timeout }
    }

    /// True if the credentials needed to call the API are present.
    pub fn has_credentials(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.reveal().is_empty()
    }
}
