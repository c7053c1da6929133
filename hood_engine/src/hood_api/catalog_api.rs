use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, Product},
    helpers::default_catalog,
    traits::{CatalogError, CatalogManagement},
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        self.db.fetch_products().await
    }

    pub async fn product(&self, id: i64) -> Result<Product, CatalogError> {
        self.db.fetch_product(id).await?.ok_or(CatalogError::ProductNotFound(id))
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        self.db.insert_product(product).await
    }

    /// Replaces the whole catalog with the built-in product list.
    pub async fn seed_catalog(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self.db.replace_catalog(default_catalog()).await?;
        info!("🌱️ Catalog seeded with {} products", products.len());
        Ok(products)
    }

    /// Seeds the catalog only if it is empty. Returns the number of products inserted.
    pub async fn seed_if_empty(&self) -> Result<usize, CatalogError> {
        if self.db.fetch_products().await?.is_empty() {
            Ok(self.seed_catalog().await?.len())
        } else {
            debug!("🌱️ Catalog already has products. Not seeding.");
            Ok(0)
        }
    }
}
