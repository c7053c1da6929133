//! # Store engine public API
//!
//! The `hood_api` module exposes the programmatic API of the store engine. The API is modular, so that clients of
//! the API can pick and choose the functionality they want.
//!
//! * [`auth_api`] registers users and checks their credentials.
//! * [`catalog_api`] reads and seeds the product catalog.
//! * [`cart_api`] manages shopping carts.
//! * [`payment_flow_api`] is the primary API for checkout. It mints gateway orders, verifies payment signatures and
//!   webhooks, and reconciles successful payments into the order ledger.
//! * [`order_ledger_api`] reads the ledger and records orders against verified payments.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use hood_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CartManagement
//! let api = CartApi::new(db);
//! let cart = api.add_item(user_id, AddCartItem::new(product_id)).await?;
//! ```
pub mod auth_api;
pub mod cart_api;
pub mod cart_objects;
pub mod catalog_api;
pub mod errors;
pub mod order_ledger_api;
pub mod order_objects;
pub mod payment_flow_api;
pub mod payment_objects;
