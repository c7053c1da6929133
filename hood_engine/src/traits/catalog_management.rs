use thiserror::Error;

use crate::db_types::{NewProduct, Product};

#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    /// All products, oldest first.
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    /// Deletes every product and inserts `products` in a single transaction. Existing cart lines that point at the
    /// removed products are left alone; they render with an empty product slot.
    async fn replace_catalog(&self, products: Vec<NewProduct>) -> Result<Vec<Product>, CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Invalid product. {0}")]
    InvalidProduct(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
