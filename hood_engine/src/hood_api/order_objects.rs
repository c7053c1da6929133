use serde::Deserialize;

use crate::db_types::{GatewayOrderId, OrderItem, Paise, ShippingAddress, DEFAULT_CART_SIZE};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub size: Option<String>,
}

impl OrderItemRequest {
    fn key(&self) -> (i64, i64, &str) {
        (self.product_id, self.quantity, self.size.as_deref().map(str::trim).unwrap_or(DEFAULT_CART_SIZE))
    }
}

/// A request to record an order against a verified payment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
    /// Amount in rupees.
    pub total_amount: Paise,
    pub payment_order_id: GatewayOrderId,
}

impl NewOrderRequest {
    /// True if the requested items are the same multiset of `(product, quantity, size)` as the paid snapshot.
    pub fn items_match(&self, paid: &[OrderItem]) -> bool {
        if self.items.len() != paid.len() {
            return false;
        }
        let mut requested = self.items.iter().map(OrderItemRequest::key).collect::<Vec<_>>();
        let mut snapshot = paid.iter().map(|i| (i.product_id, i.quantity, i.size.as_str())).collect::<Vec<_>>();
        requested.sort_unstable();
        snapshot.sort_unstable();
        requested == snapshot
    }
}
