use thiserror::Error;

use crate::db_types::{GatewayOrderId, Order, PaymentIntent, ShippingAddress};

/// The order ledger. Orders are derived from payment intents that reached `success`; there is at most one order per
/// intent.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// The user's orders, most recent first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError>;

    async fn fetch_order_for_intent(&self, order_id: &GatewayOrderId) -> Result<Option<Order>, OrderManagementError>;

    /// Writes the ledger order for a successful intent and clears the owner's cart, in one transaction.
    ///
    /// This call is idempotent. If the order already exists it is returned unchanged, except that `shipping_address`
    /// is recorded when the existing order has none. The boolean is `true` if a new order was written.
    ///
    /// The caller is responsible for checking that the intent is in the `success` state.
    async fn record_order_for_intent(
        &self,
        intent: &PaymentIntent,
        shipping_address: Option<ShippingAddress>,
    ) -> Result<(Order, bool), OrderManagementError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot serialize order data: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}
