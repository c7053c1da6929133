use serde::{Deserialize, Serialize};

use crate::db_types::{CartLine, Paise, DEFAULT_CART_SIZE};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItem {
    pub product_id: i64,
    pub quantity: Option<i64>,
    pub size: Option<String>,
}

impl AddCartItem {
    pub fn new(product_id: i64) -> Self {
        Self { product_id, quantity: None, size: None }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_size<S: Into<String>>(mut self, size: S) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn quantity(&self) -> i64 {
        self.quantity.unwrap_or(1)
    }

    pub fn size(&self) -> &str {
        self.size.as_deref().map(str::trim).unwrap_or(DEFAULT_CART_SIZE)
    }
}

/// The cart as presented to the user, with totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    #[serde(rename = "cart")]
    pub items: Vec<CartLine>,
    /// Sum of the quantities of all lines.
    pub item_count: i64,
    /// Price times quantity over the lines whose product still exists.
    pub subtotal: Paise,
}

impl From<Vec<CartLine>> for CartSummary {
    fn from(items: Vec<CartLine>) -> Self {
        let item_count = items.iter().fold(0i64, |n, l| n.saturating_add(l.quantity));
        // Display only. Checkout recomputes the total with overflow checks.
        let subtotal =
            Paise::checked_sum(items.iter().filter_map(CartLine::line_total)).unwrap_or(Paise::from(i64::MAX));
        Self { items, item_count, subtotal }
    }
}

impl CartSummary {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line(&self, product_id: i64, size: &str) -> Option<&CartLine> {
        self.items.iter().find(|l| l.product_id == product_id && l.size == size)
    }
}
