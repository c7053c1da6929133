use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct NewRazorpayOrder {
    /// In paise.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRazorpayRefund {
    /// In paise. The full captured amount is refunded if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub notes: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    /// Unix seconds.
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayPayment {
    pub id: String,
    pub order_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub method: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    #[serde(default)]
    pub captured: bool,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayRefund {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: String,
    pub created_at: Option<i64>,
}

fn default_currency() -> String {
    hood_common::DEFAULT_CURRENCY_CODE.to_string()
}

/// Razorpay's envelope for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    #[serde(default)]
    pub count: usize,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorDetail {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl ErrorResponse {
    pub fn message(&self) -> String {
        match (&self.error.code, &self.error.description) {
            (Some(code), Some(desc)) => format!("{code}: {desc}"),
            (None, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "Unknown error".to_string(),
        }
    }
}
