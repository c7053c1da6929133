use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, PaymentStatus},
    hood_api::{errors::OrderLedgerError, order_objects::NewOrderRequest},
    traits::PaymentGatewayDatabase,
};

/// Read and write access to the order ledger.
///
/// Orders can only ever be recorded against a payment intent that reached `success`. Normally the order is written
/// the moment the payment is verified; [`OrderLedgerApi::record_order`] lets the client attach its shipping address
/// and obtain the order afterwards.
pub struct OrderLedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderLedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLedgerApi ({:?})", self.db)
    }
}

impl<B> OrderLedgerApi<B>
where B: PaymentGatewayDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's orders, most recent first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderLedgerError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    /// Records (or returns the existing) order for a verified payment. Returns `true` if the order was newly written.
    ///
    /// The request must refer to a `success` intent owned by `user_id`, and its items and total must match what was
    /// paid for.
    pub async fn record_order(&self, user_id: i64, request: NewOrderRequest) -> Result<(Order, bool), OrderLedgerError> {
        let missing = request.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(OrderLedgerError::InvalidRequest(format!("Shipping address is missing {}", missing.join(", "))));
        }
        let intent = self
            .db
            .fetch_payment_intent(&request.payment_order_id)
            .await?
            .ok_or_else(|| OrderLedgerError::PaymentNotFound(request.payment_order_id.clone()))?;
        if intent.user_id != user_id || intent.status != PaymentStatus::Success {
            warn!(
                "📦️ User #{user_id} tried to record an order against payment {} ({}, owner #{})",
                intent.gateway_order_id, intent.status, intent.user_id
            );
            return Err(OrderLedgerError::PaymentNotVerified);
        }
        if request.total_amount != intent.amount {
            return Err(OrderLedgerError::InvalidRequest(format!(
                "Total {} does not match the amount paid, {}",
                request.total_amount, intent.amount
            )));
        }
        if !request.items_match(&intent.items) {
            return Err(OrderLedgerError::InvalidRequest("Items do not match the items paid for".into()));
        }
        let (order, inserted) = self.db.record_order_for_intent(&intent, Some(request.shipping_address)).await?;
        debug!("📦️ Order #{} for payment {} (new: {inserted})", order.id, intent.gateway_order_id);
        Ok((order, inserted))
    }
}
