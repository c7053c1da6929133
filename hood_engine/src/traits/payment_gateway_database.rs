use thiserror::Error;

use crate::{
    db_types::{GatewayOrderId, NewPaymentIntent, NewRefund, PaymentIntent, Refund},
    traits::{
        data_objects::{IntentTransition, PaymentIntentQuery, PaymentStats},
        CartManagement,
        CatalogManagement,
        OrderManagement,
        OrderManagementError,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the store's checkout flow.
///
/// This behaviour includes:
/// * Recording a payment intent for every gateway order that is minted.
/// * Moving intents through `created -> success | failed`. Transitions are one-way and happen at most once.
/// * Writing the ledger order and clearing the cart atomically with the `success` transition.
/// * Payment reporting for administrators.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + CatalogManagement + CartManagement + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new intent in the `created` state. There can only be one intent per gateway order id.
    async fn insert_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, PaymentGatewayError>;

    async fn fetch_payment_intent(
        &self,
        order_id: &GatewayOrderId,
    ) -> Result<Option<PaymentIntent>, PaymentGatewayError>;

    /// In a single atomic transaction,
    /// * moves the intent from `created` to `success`, attaching the payment id, the signature (if the completion came
    ///   from the client) and the verification time,
    /// * writes the ledger order from the intent snapshot,
    /// * clears the owner's cart.
    ///
    /// If the intent is already terminal nothing is written and the stored state is returned with `changed == false`.
    async fn complete_payment_intent(
        &self,
        order_id: &GatewayOrderId,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<IntentTransition, PaymentGatewayError>;

    /// Moves the intent from `created` to `failed` with the given reason. Terminal intents are left untouched and
    /// returned with `changed == false`.
    async fn fail_payment_intent(
        &self,
        order_id: &GatewayOrderId,
        payment_id: Option<&str>,
        reason: &str,
    ) -> Result<IntentTransition, PaymentGatewayError>;

    /// Payment intents matching the query, newest first.
    async fn fetch_payment_intents(&self, query: PaymentIntentQuery) -> Result<Vec<PaymentIntent>, PaymentGatewayError>;

    async fn payment_stats(&self) -> Result<PaymentStats, PaymentGatewayError>;

    /// Records a refund. Idempotent on the refund id; returns `false` if the refund was already known.
    async fn insert_refund(&self, refund: NewRefund) -> Result<(Refund, bool), PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert payment intent, since one already exists for order {0}")]
    IntentAlreadyExists(GatewayOrderId),
    #[error("There is no payment intent for order {0}")]
    IntentNotFound(GatewayOrderId),
    #[error("Cannot serialize payment intent data: {0}")]
    SerializationError(String),
    #[error("{0}")]
    OrderError(#[from] OrderManagementError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
