//! An in-memory stand-in for the payment processor.
//!
//! Order ids are handed out from a queue (falling back to `order_test_<n>`), so tests can arrange for a checkout to
//! produce a known id. Payments and refunds are whatever the test registers.
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use crate::{
    db_types::{GatewayOrderId, Paise},
    traits::{
        GatewayError,
        GatewayOrder,
        GatewayPayment,
        GatewayRefund,
        NewGatewayOrder,
        PaymentGateway,
        RefundRequest,
    },
};

#[derive(Default)]
struct State {
    next_ids: VecDeque<String>,
    counter: u64,
    orders: HashMap<String, GatewayOrder>,
    payments: HashMap<String, GatewayPayment>,
    refunds: Vec<GatewayRefund>,
    unavailable: bool,
}

#[derive(Clone, Default)]
pub struct ScriptedGateway {
    state: Arc<Mutex<State>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `create_order` call returns `id`.
    pub fn queue_order_id<S: Into<String>>(&self, id: S) {
        self.lock().next_ids.push_back(id.into());
    }

    /// Every call fails with [`GatewayError::Unavailable`] while this is set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Registers a captured payment against an order.
    pub fn add_captured_payment(&self, payment_id: &str, order_id: &str, amount: Paise) {
        let payment = GatewayPayment {
            id: payment_id.to_string(),
            order_id: Some(GatewayOrderId::from(order_id)),
            amount,
            currency: "INR".into(),
            status: "captured".into(),
            method: Some("upi".into()),
            email: None,
            contact: None,
            captured: true,
            error_description: None,
            created_at: None,
        };
        self.lock().payments.insert(payment_id.to_string(), payment);
    }

    pub fn orders_created(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn refunds(&self) -> Vec<GatewayRefund> {
        self.lock().refunds.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.lock().unavailable {
            Err(GatewayError::Unavailable("scripted outage".into()))
        } else {
            Ok(())
        }
    }
}

impl PaymentGateway for ScriptedGateway {
    async fn create_order(&self, order: NewGatewayOrder) -> Result<GatewayOrder, GatewayError> {
        self.check_available()?;
        let mut state = self.lock();
        state.counter += 1;
        let counter = state.counter;
        let id = state.next_ids.pop_front().unwrap_or_else(|| format!("order_test_{counter}"));
        let result = GatewayOrder {
            id: GatewayOrderId::from(id.as_str()),
            amount: order.amount,
            amount_paid: Paise::default(),
            currency: order.currency,
            receipt: Some(order.receipt),
            status: "created".into(),
            attempts: 0,
            created_at: None,
        };
        state.orders.insert(id, result.clone());
        Ok(result)
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.check_available()?;
        self.lock().payments.get(payment_id).cloned().ok_or_else(|| GatewayError::NotFound(payment_id.to_string()))
    }

    async fn fetch_order(&self, order_id: &GatewayOrderId) -> Result<GatewayOrder, GatewayError> {
        self.check_available()?;
        self.lock().orders.get(order_id.as_str()).cloned().ok_or_else(|| GatewayError::NotFound(order_id.to_string()))
    }

    async fn fetch_order_payments(&self, order_id: &GatewayOrderId) -> Result<Vec<GatewayPayment>, GatewayError> {
        self.check_available()?;
        let payments =
            self.lock().payments.values().filter(|p| p.order_id.as_ref() == Some(order_id)).cloned().collect();
        Ok(payments)
    }

    async fn refund(&self, payment_id: &str, request: RefundRequest) -> Result<GatewayRefund, GatewayError> {
        self.check_available()?;
        let mut state = self.lock();
        let payment = state.payments.get(payment_id).cloned().ok_or_else(|| GatewayError::NotFound(payment_id.into()))?;
        let refund = GatewayRefund {
            id: format!("rfnd_test_{}", state.refunds.len() + 1),
            payment_id: payment_id.to_string(),
            amount: request.amount.unwrap_or(payment.amount),
            currency: payment.currency,
            status: "processed".into(),
            created_at: None,
        };
        state.refunds.push(refund.clone());
        Ok(refund)
    }
}
