use serde::{Deserialize, Serialize};

use crate::{
    db_types::{GatewayOrderId, Order, Paise, PaymentIntent, PaymentStatus, ShippingAddress},
    traits::{GatewayOrder, GatewayPayment},
};

//--------------------------------------       Checkout       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: i64,
    #[serde(default = "one")]
    pub quantity: i64,
    pub size: Option<String>,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Amount in rupees.
    pub amount: Paise,
    pub currency: Option<String>,
    /// Items to check out. When empty, the user's server-side cart is used.
    #[serde(default)]
    pub cart_items: Vec<CheckoutItem>,
    pub shipping_address: Option<ShippingAddress>,
}

impl CheckoutRequest {
    pub fn new(amount: Paise) -> Self {
        Self { amount, currency: None, cart_items: vec![], shipping_address: None }
    }

    pub fn with_item(mut self, product_id: i64, quantity: i64, size: &str) -> Self {
        self.cart_items.push(CheckoutItem { product_id, quantity, size: Some(size.to_string()) });
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// The fields of the gateway order that the client needs to open the gateway's checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOrderSummary {
    pub id: GatewayOrderId,
    /// In paise, as the gateway reports it.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub order: CheckoutOrderSummary,
    /// The gateway's public key id. Never the secret.
    pub public_key: String,
}

//--------------------------------------     Verification     ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    #[serde(alias = "razorpay_order_id")]
    pub external_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub external_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub signature_valid: bool,
    /// The intent after verification, or `None` if no intent exists for the order id.
    pub intent: Option<PaymentIntent>,
    pub order: Option<Order>,
    /// Gateway payment details, fetched on a best-effort basis after a successful verification.
    pub payment: Option<GatewayPayment>,
}

impl VerificationOutcome {
    /// A verification succeeds only if the signature is authentic and the intent (when there is one) is `success`.
    /// An intent that already failed stays failed, whatever is presented later.
    pub fn is_success(&self) -> bool {
        self.signature_valid && self.intent.as_ref().map_or(true, |i| i.status == PaymentStatus::Success)
    }
}

//--------------------------------------       Webhooks       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventKind {
    PaymentAuthorized,
    PaymentCaptured,
    PaymentFailed,
    OrderPaid,
    RefundCreated,
    Other(String),
}

impl From<&str> for WebhookEventKind {
    fn from(s: &str) -> Self {
        match s {
            "payment.authorized" => Self::PaymentAuthorized,
            "payment.captured" => Self::PaymentCaptured,
            "payment.failed" => Self::PaymentFailed,
            "order.paid" => Self::OrderPaid,
            "refund.created" => Self::RefundCreated,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

impl WebhookEvent {
    pub fn kind(&self) -> WebhookEventKind {
        WebhookEventKind::from(self.event.as_str())
    }

    /// The gateway order id the event refers to, from the order entity or, failing that, the payment entity.
    pub fn gateway_order_id(&self) -> Option<GatewayOrderId> {
        self.payload
            .order
            .as_ref()
            .map(|o| GatewayOrderId::from(o.entity.id.as_str()))
            .or_else(|| self.payment().and_then(|p| p.order_id.as_deref()).map(GatewayOrderId::from))
    }

    pub fn payment(&self) -> Option<&WebhookPaymentEntity> {
        self.payload.payment.as_ref().map(|p| &p.entity)
    }

    pub fn refund(&self) -> Option<&WebhookRefundEntity> {
        self.payload.refund.as_ref().map(|r| &r.entity)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<Entity<WebhookPaymentEntity>>,
    pub order: Option<Entity<WebhookOrderEntity>>,
    pub refund: Option<Entity<WebhookRefundEntity>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPaymentEntity {
    pub id: String,
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: i64,
    pub status: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookOrderEntity {
    pub id: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRefundEntity {
    pub id: String,
    pub payment_id: String,
    #[serde(default)]
    pub amount: i64,
    pub status: Option<String>,
}

/// What a webhook delivery did to local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The intent was reconciled to `success`. `changed` is false if it was already terminal.
    PaymentSucceeded { order_id: GatewayOrderId, changed: bool },
    /// The intent was moved to `failed`. `changed` is false if it was already terminal.
    PaymentFailed { order_id: GatewayOrderId, changed: bool },
    RefundRecorded { refund_id: String, new: bool },
    /// A known event that needs no state change.
    Acknowledged(String),
    /// An unknown event, or one that refers to an order this store never created.
    Ignored(String),
}

//--------------------------------------    Admin / queries   ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentRequest {
    pub payment_id: String,
    /// Amount in rupees. A full refund if omitted.
    pub amount: Option<Paise>,
    pub reason: Option<String>,
}

pub const DEFAULT_REFUND_REASON: &str = "Customer request";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrderDetails {
    pub order: GatewayOrder,
    pub payments: Vec<GatewayPayment>,
}
