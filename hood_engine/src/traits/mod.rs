//! #  Backend contracts.
//!
//! This module defines the behaviour that storage backends (and the external payment processor) need to expose in
//! order to be driven by the engine APIs.
//!
//! * [`UserManagement`] stores and looks up user identities.
//! * [`CatalogManagement`] stores and queries the product catalog.
//! * [`CartManagement`] manages the per-user cart rows.
//! * [`OrderManagement`] writes and queries the order ledger.
//! * [`PaymentGatewayDatabase`] is the highest-level trait. It tracks payment intents and performs the atomic
//!   state transitions that turn a verified payment into a ledger order.
//! * [`PaymentGateway`] is the boundary to the external payment processor.
mod cart_management;
mod catalog_management;
mod data_objects;
mod order_management;
mod payment_gateway;
mod payment_gateway_database;
mod user_management;

pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{IntentTransition, PaymentIntentQuery, PaymentStats};
pub use order_management::{OrderManagement, OrderManagementError};
pub use payment_gateway::{
    GatewayError,
    GatewayOrder,
    GatewayPayment,
    GatewayRefund,
    NewGatewayOrder,
    PaymentGateway,
    RefundRequest,
};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use user_management::{UserManagement, UserManagementError};
