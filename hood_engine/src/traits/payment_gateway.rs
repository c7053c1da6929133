use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{GatewayOrderId, Paise};

/// The external payment processor.
///
/// The processor is the system of record for money movement. The engine only asks it to mint orders, reads status
/// back from it, and requests refunds. Signatures are verified locally and never delegated.
///
/// Implementations must bound every call with a timeout and report it as [`GatewayError::Unavailable`].
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;

    async fn fetch_order(&self, order_id: &GatewayOrderId) -> Result<GatewayOrder, GatewayError>;

    async fn fetch_order_payments(&self, order_id: &GatewayOrderId) -> Result<Vec<GatewayPayment>, GatewayError>;

    /// Refunds `request.amount`, or the full captured amount when no amount is given.
    async fn refund(&self, payment_id: &str, request: RefundRequest) -> Result<GatewayRefund, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached: {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment gateway has no record of {0}")]
    NotFound(String),
    #[error("Unexpected response from the payment gateway: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGatewayOrder {
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    pub notes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    pub id: GatewayOrderId,
    pub amount: Paise,
    pub amount_paid: Paise,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    pub attempts: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayPayment {
    pub id: String,
    pub order_id: Option<GatewayOrderId>,
    pub amount: Paise,
    pub currency: String,
    pub status: String,
    pub method: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub captured: bool,
    pub error_description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub amount: Option<Paise>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRefund {
    pub id: String,
    pub payment_id: String,
    pub amount: Paise,
    pub currency: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}
