use serde::Serialize;

use crate::db_types::{Order, PaymentIntent};

/// A payment intent reached `success` and its ledger order was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPaidEvent {
    pub intent: PaymentIntent,
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(intent: PaymentIntent, order: Order) -> Self {
        Self { intent, order }
    }
}

/// A payment intent reached `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentFailedEvent {
    pub intent: PaymentIntent,
}

impl PaymentFailedEvent {
    pub fn new(intent: PaymentIntent) -> Self {
        Self { intent }
    }

    pub fn reason(&self) -> &str {
        self.intent.failure_reason.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    PaymentFailed(PaymentFailedEvent),
}
