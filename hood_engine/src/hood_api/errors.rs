use thiserror::Error;

use crate::{
    db_types::GatewayOrderId,
    traits::{
        CartError,
        CatalogError,
        GatewayError,
        OrderManagementError,
        PaymentGatewayError,
        UserManagementError,
    },
};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Could not hash password: {0}")]
    PasswordHashError(String),
}

impl From<UserManagementError> for AuthApiError {
    fn from(e: UserManagementError) -> Self {
        match e {
            UserManagementError::UserAlreadyExists(_) => Self::UserAlreadyExists,
            UserManagementError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Quantity must be between 1 and 100, not {0}")]
    InvalidQuantity(i64),
    #[error("A cart line cannot hold more than {0} units")]
    QuantityLimit(i64),
    #[error("Size cannot be empty")]
    InvalidSize,
}

impl From<CartError> for CartApiError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ProductNotFound(id) => Self::ProductNotFound(id),
            CartError::QuantityLimit(max) => Self::QuantityLimit(max),
            CartError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid amount. {0}")]
    InvalidAmount(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("There is no payment for order {0}")]
    IntentNotFound(GatewayOrderId),
    #[error("Invalid webhook signature")]
    InvalidWebhookSignature,
    #[error("Could not interpret webhook payload. {0}")]
    MalformedWebhook(String),
    #[error("{0}")]
    GatewayError(#[from] GatewayError),
}

impl From<PaymentGatewayError> for PaymentFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::IntentNotFound(id) => Self::IntentNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<CartError> for PaymentFlowError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ProductNotFound(id) => Self::ProductNotFound(id),
            e @ CartError::QuantityLimit(_) => Self::InvalidRequest(e.to_string()),
            CartError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<CatalogError> for PaymentFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => Self::ProductNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<OrderManagementError> for PaymentFlowError {
    fn from(e: OrderManagementError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderLedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("There is no payment for order {0}")]
    PaymentNotFound(GatewayOrderId),
    #[error("Payment has not been verified")]
    PaymentNotVerified,
    #[error("Invalid order. {0}")]
    InvalidRequest(String),
}

impl From<OrderManagementError> for OrderLedgerError {
    fn from(e: OrderManagementError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<PaymentGatewayError> for OrderLedgerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::IntentNotFound(id) => Self::PaymentNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
