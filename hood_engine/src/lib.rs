//! Hood Store Engine
//!
//! The engine holds the business rules of the store: identity, catalog, carts, checkout (payment intents), and the
//! order ledger. It is transport-agnostic; the HTTP server is a thin layer on top of the APIs exposed here.
//!
//! The library is divided into the following sections:
//! 1. Backend contracts ([`mod@traits`]). Storage backends implement these traits. SQLite is the supported backend
//!    ([`SqliteDatabase`]). The data types that flow through the traits live in [`mod@db_types`].
//! 2. The public API ([`mod@hood_api`]). Each API wraps a backend that implements the traits it needs. The most
//!    interesting of these is [`PaymentFlowApi`], which owns the payment intent state machine and reconciles
//!    client-side verification and gateway webhooks into ledger orders.
//! 3. The [`PaymentGateway`] trait, which abstracts the external payment processor. The engine never talks to the
//!    processor directly.
//!
//! The engine also emits events when payments settle. See [`mod@events`].
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod hood_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(test)]
mod engine_tests;

pub use hood_api::{
    auth_api::AuthApi,
    cart_api::CartApi,
    catalog_api::CatalogApi,
    errors::{AuthApiError, CartApiError, OrderLedgerError, PaymentFlowError},
    order_ledger_api::OrderLedgerApi,
    payment_flow_api::PaymentFlowApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CartManagement,
    CatalogManagement,
    OrderManagement,
    PaymentGateway,
    PaymentGatewayDatabase,
    UserManagement,
};
