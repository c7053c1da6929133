//! `SqliteDatabase` is a concrete implementation of a store engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{carts, db_url, new_pool, orders, payment_intents, products, refunds, users};
use crate::{
    db_types::{
        CartLine,
        GatewayOrderId,
        MAX_LINE_QUANTITY,
        NewPaymentIntent,
        NewProduct,
        NewRefund,
        NewUser,
        Order,
        PaymentIntent,
        Product,
        Refund,
        ShippingAddress,
        User,
    },
    traits::{
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        IntentTransition,
        OrderManagement,
        OrderManagementError,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        PaymentIntentQuery,
        PaymentStats,
        UserManagement,
        UserManagementError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `HOOD_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Creates a new database API object. The database file is created if it does not exist.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool for {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, UserManagementError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserManagementError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserManagementError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(id, &mut conn).await?;
        Ok(user)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(&mut conn).await?;
        Ok(products)
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let product = product.validated().map_err(|e| CatalogError::InvalidProduct(e.to_string()))?;
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn replace_catalog(&self, new_products: Vec<NewProduct>) -> Result<Vec<Product>, CatalogError> {
        let new_products = new_products
            .into_iter()
            .map(|p| p.validated().map_err(|e| CatalogError::InvalidProduct(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let mut tx = self.pool.begin().await?;
        let deleted = products::delete_all_products(&mut tx).await?;
        let mut result = Vec::with_capacity(new_products.len());
        for product in new_products {
            result.push(products::insert_product(product, &mut tx).await?);
        }
        tx.commit().await?;
        info!("🗃️ Catalog replaced. {deleted} products removed, {} inserted", result.len());
        Ok(result)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartLine>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart(user_id, &mut conn).await?;
        Ok(cart)
    }

    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64, size: &str) -> Result<(), CartError> {
        let mut conn = self.pool.acquire().await?;
        if products::fetch_product(product_id, &mut conn).await?.is_none() {
            return Err(CartError::ProductNotFound(product_id));
        }
        drop(conn);
        let mut tx = self.pool.begin().await?;
        let added = carts::upsert_item(user_id, product_id, quantity, size, MAX_LINE_QUANTITY, &mut tx).await?;
        tx.commit().await?;
        if !added {
            return Err(CartError::QuantityLimit(MAX_LINE_QUANTITY));
        }
        trace!("🗃️ Added {quantity} x product #{product_id} ({size}) to cart of user #{user_id}");
        Ok(())
    }

    async fn remove_from_cart(&self, user_id: i64, product_id: i64, size: &str) -> Result<bool, CartError> {
        let mut tx = self.pool.begin().await?;
        let removed = carts::remove_item(user_id, product_id, size, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartError> {
        let mut tx = self.pool.begin().await?;
        let n = carts::clear_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(n)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_for_intent(&self, order_id: &GatewayOrderId) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn record_order_for_intent(
        &self,
        intent: &PaymentIntent,
        shipping_address: Option<ShippingAddress>,
    ) -> Result<(Order, bool), OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        // Write first, so that the transaction takes the write lock before it reads anything.
        let cleared = carts::clear_cart(intent.user_id, &mut tx).await?;
        let (order, inserted) = orders::idempotent_insert_for_intent(intent, shipping_address, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Order #{} recorded (new: {inserted}). {cleared} cart lines cleared", order.id);
        Ok((order, inserted))
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let intent = payment_intents::insert_intent(intent, &mut tx).await?;
        tx.commit().await?;
        Ok(intent)
    }

    async fn fetch_payment_intent(
        &self,
        order_id: &GatewayOrderId,
    ) -> Result<Option<PaymentIntent>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let intent = payment_intents::fetch_intent(order_id, &mut conn).await?;
        Ok(intent)
    }

    async fn complete_payment_intent(
        &self,
        order_id: &GatewayOrderId,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<IntentTransition, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // Write first, so that the transaction takes the write lock before it reads anything.
        let changed = payment_intents::mark_success(order_id, payment_id, signature, &mut tx).await?;
        let intent = payment_intents::fetch_intent(order_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::IntentNotFound(order_id.clone()))?;
        let order = if changed {
            let (order, _) = orders::idempotent_insert_for_intent(&intent, None, &mut tx).await?;
            let cleared = carts::clear_cart(intent.user_id, &mut tx).await?;
            debug!(
                "🗃️ Payment {order_id} succeeded. Order #{} written and {cleared} cart lines cleared for user #{}",
                order.id, intent.user_id
            );
            Some(order)
        } else {
            orders::fetch_order_by_payment_order_id(order_id, &mut tx).await?
        };
        tx.commit().await?;
        Ok(IntentTransition { intent, order, changed })
    }

    async fn fail_payment_intent(
        &self,
        order_id: &GatewayOrderId,
        payment_id: Option<&str>,
        reason: &str,
    ) -> Result<IntentTransition, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let changed = payment_intents::mark_failed(order_id, payment_id, reason, &mut tx).await?;
        let intent = payment_intents::fetch_intent(order_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::IntentNotFound(order_id.clone()))?;
        let order = orders::fetch_order_by_payment_order_id(order_id, &mut tx).await?;
        tx.commit().await?;
        if changed {
            debug!("🗃️ Payment {order_id} marked as failed: {reason}");
        }
        Ok(IntentTransition { intent, order, changed })
    }

    async fn fetch_payment_intents(
        &self,
        query: PaymentIntentQuery,
    ) -> Result<Vec<PaymentIntent>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let intents = payment_intents::fetch_intents(query, &mut conn).await?;
        Ok(intents)
    }

    async fn payment_stats(&self) -> Result<PaymentStats, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let stats = payment_intents::payment_stats(&mut conn).await?;
        Ok(stats)
    }

    async fn insert_refund(&self, refund: NewRefund) -> Result<(Refund, bool), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = refunds::idempotent_insert(refund, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}
