use thiserror::Error;

use crate::db_types::CartLine;

/// Per-user cart storage.
///
/// A cart is the set of `(product_id, size)` lines for a user. There is no separate cart record; a user without
/// lines simply has an empty cart.
#[allow(async_fn_in_trait)]
pub trait CartManagement: Clone {
    /// Returns the user's cart lines, joined with the current catalog entry for each product.
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartLine>, CartError>;

    /// Adds `quantity` units of `(product_id, size)`. If the line exists, the quantity is incremented atomically;
    /// concurrent adds never lose an update. Fails with [`CartError::ProductNotFound`] if the product does not exist,
    /// and with [`CartError::QuantityLimit`] if the line would hold more than
    /// [`MAX_LINE_QUANTITY`](crate::db_types::MAX_LINE_QUANTITY) units. The cart is unchanged on failure.
    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64, size: &str) -> Result<(), CartError>;

    /// Removes the `(product_id, size)` line. Returns `false` if there was no such line.
    async fn remove_from_cart(&self, user_id: i64, product_id: i64, size: &str) -> Result<bool, CartError>;

    /// Removes every line in the user's cart, returning the number of lines deleted.
    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartError>;
}

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("A cart line cannot hold more than {0} units")]
    QuantityLimit(i64),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}
