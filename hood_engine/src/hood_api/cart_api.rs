use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DEFAULT_CART_SIZE, MAX_LINE_QUANTITY},
    hood_api::{
        cart_objects::{AddCartItem, CartSummary},
        errors::CartApiError,
    },
    traits::CartManagement,
};

pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn cart(&self, user_id: i64) -> Result<CartSummary, CartApiError> {
        let lines = self.db.fetch_cart(user_id).await?;
        Ok(CartSummary::from(lines))
    }

    /// Adds the item to the cart, or increments the quantity of the matching `(product, size)` line.
    pub async fn add_item(&self, user_id: i64, item: AddCartItem) -> Result<CartSummary, CartApiError> {
        let quantity = item.quantity();
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        let size = item.size();
        if size.is_empty() {
            return Err(CartApiError::InvalidSize);
        }
        self.db.add_to_cart(user_id, item.product_id, quantity, size).await?;
        debug!("🛒️ User #{user_id} added {quantity} x #{} ({size})", item.product_id);
        self.cart(user_id).await
    }

    /// Removes the `(product, size)` line. Removing a line that is not in the cart is not an error.
    pub async fn remove_item(
        &self,
        user_id: i64,
        product_id: i64,
        size: Option<&str>,
    ) -> Result<CartSummary, CartApiError> {
        let size = size.map(str::trim).unwrap_or(DEFAULT_CART_SIZE);
        let removed = self.db.remove_from_cart(user_id, product_id, size).await?;
        if !removed {
            debug!("🛒️ User #{user_id} removed #{product_id} ({size}), which was not in the cart");
        }
        self.cart(user_id).await
    }

    pub async fn clear(&self, user_id: i64) -> Result<CartSummary, CartApiError> {
        let n = self.db.clear_cart(user_id).await?;
        debug!("🛒️ Cleared {n} lines from the cart of user #{user_id}");
        self.cart(user_id).await
    }
}
