//! The checkout state machine.
//!
//! Every checkout attempt is a [`PaymentIntent`] keyed by the gateway's order id. It starts out `created` and ends up
//! either `success` or `failed`, and never moves again once it gets there. Two independent channels can settle an
//! intent:
//! * the client, which reports the gateway's checkout signature through [`PaymentFlowApi::verify_payment`], and
//! * the gateway itself, through signed webhooks handled by [`PaymentFlowApi::handle_webhook`].
//!
//! Both channels funnel into the same conditional transitions in the backend, so whichever arrives first wins and the
//! other becomes a no-op. Reaching `success` writes the ledger order and clears the cart in the same transaction.
use std::{collections::HashMap, fmt::Debug};

use chrono::Utc;
use hood_common::DEFAULT_CURRENCY_CODE;
use log::*;

use crate::{
    db_types::{
        GatewayOrderId,
        NewPaymentIntent,
        NewRefund,
        OrderItem,
        Paise,
        PaymentIntent,
        PaymentStatus,
        DEFAULT_CART_SIZE,
        MAX_LINE_QUANTITY,
    },
    events::{EventProducers, OrderPaidEvent, PaymentFailedEvent},
    helpers::PaymentSignatures,
    hood_api::{
        errors::PaymentFlowError,
        payment_objects::{
            CheckoutItem,
            CheckoutOrder,
            CheckoutOrderSummary,
            CheckoutRequest,
            GatewayOrderDetails,
            PaymentVerification,
            RefundPaymentRequest,
            VerificationOutcome,
            WebhookEvent,
            WebhookEventKind,
            WebhookOutcome,
            DEFAULT_REFUND_REASON,
        },
    },
    traits::{
        GatewayPayment,
        GatewayRefund,
        IntentTransition,
        NewGatewayOrder,
        PaymentGateway,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        PaymentIntentQuery,
        PaymentStats,
        RefundRequest,
    },
};

pub const INVALID_SIGNATURE_REASON: &str = "Invalid signature";
pub const GATEWAY_FAILURE_REASON: &str = "Payment failed";

pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    signatures: PaymentSignatures,
    public_key: String,
    producers: EventProducers,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi (key id: {})", self.public_key)
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(
        db: B,
        gateway: G,
        signatures: PaymentSignatures,
        public_key: String,
        producers: EventProducers,
    ) -> Self {
        Self { db, gateway, signatures, public_key, producers }
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    /// Starts a checkout.
    ///
    /// The items are resolved against the catalog into a price snapshot, the gateway mints an order for the amount,
    /// and a `created` intent is stored under the gateway's order id. The amount must be positive and equal to the
    /// snapshot total.
    pub async fn create_checkout(
        &self,
        user_id: i64,
        request: CheckoutRequest,
    ) -> Result<CheckoutOrder, PaymentFlowError> {
        if !request.amount.is_positive() {
            return Err(PaymentFlowError::InvalidAmount(format!("Amount must be greater than zero, not {}", request.amount)));
        }
        let currency = request
            .currency
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        if let Some(address) = &request.shipping_address {
            let missing = address.missing_fields();
            if !missing.is_empty() {
                return Err(PaymentFlowError::InvalidRequest(format!(
                    "Shipping address is missing {}",
                    missing.join(", ")
                )));
            }
        }
        let items = self.snapshot_items(user_id, &request.cart_items).await?;
        if items.is_empty() {
            return Err(PaymentFlowError::InvalidRequest("There is nothing to check out".into()));
        }
        let items_total = items
            .iter()
            .map(OrderItem::line_total)
            .collect::<Option<Vec<_>>>()
            .and_then(Paise::checked_sum)
            .ok_or_else(|| PaymentFlowError::InvalidAmount("The item total is too large".into()))?;
        if items_total != request.amount {
            return Err(PaymentFlowError::InvalidAmount(format!(
                "The amount {} does not match the item total {items_total}",
                request.amount
            )));
        }
        let receipt = format!("receipt_{}", Utc::now().timestamp_millis());
        let notes = HashMap::from([
            ("userId".to_string(), user_id.to_string()),
            ("itemCount".to_string(), items.len().to_string()),
        ]);
        let new_order =
            NewGatewayOrder { amount: request.amount, currency: currency.clone(), receipt: receipt.clone(), notes };
        let gateway_order = self.gateway.create_order(new_order).await?;
        info!("🔄️💳️ Gateway order {} created for user #{user_id} ({})", gateway_order.id, request.amount);
        let intent = NewPaymentIntent {
            user_id,
            gateway_order_id: gateway_order.id.clone(),
            amount: request.amount,
            currency,
            receipt: gateway_order.receipt.clone().unwrap_or(receipt),
            items,
            shipping_address: request.shipping_address,
        };
        let intent = self.db.insert_payment_intent(intent).await?;
        let order = CheckoutOrderSummary {
            id: gateway_order.id,
            amount: gateway_order.amount.value(),
            currency: gateway_order.currency,
            receipt: intent.receipt,
        };
        Ok(CheckoutOrder { order, public_key: self.public_key.clone() })
    }

    async fn snapshot_items(
        &self,
        user_id: i64,
        requested: &[CheckoutItem],
    ) -> Result<Vec<OrderItem>, PaymentFlowError> {
        let wanted = if requested.is_empty() {
            trace!("🔄️ No items in the checkout request. Using the cart of user #{user_id}");
            self.db.fetch_cart(user_id).await?.into_iter().map(|l| (l.product_id, l.quantity, l.size)).collect()
        } else {
            requested
                .iter()
                .map(|i| {
                    let size = i.size.as_deref().map(str::trim).unwrap_or(DEFAULT_CART_SIZE).to_string();
                    (i.product_id, i.quantity, size)
                })
                .collect::<Vec<_>>()
        };
        let mut items = Vec::with_capacity(wanted.len());
        for (product_id, quantity, size) in wanted {
            if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
                return Err(PaymentFlowError::InvalidRequest(format!(
                    "Quantity for product {product_id} must be between 1 and {MAX_LINE_QUANTITY}"
                )));
            }
            let product = self.db.fetch_product(product_id).await?.ok_or(PaymentFlowError::ProductNotFound(product_id))?;
            items.push(OrderItem { product_id, name: product.name, unit_price: product.price, quantity, size });
        }
        Ok(items)
    }

    /// Verifies a checkout completion reported by the client.
    ///
    /// The signature is always evaluated, even when no intent exists for the order id. With an intent present:
    /// * a valid signature moves a `created` intent to `success` (writing the order and clearing the cart),
    /// * an invalid signature moves a `created` intent to `failed` with the reason "Invalid signature",
    /// * terminal intents are never modified, so repeating a call returns the same outcome.
    ///
    /// Intents that belong to a different user are reported as not found.
    pub async fn verify_payment(
        &self,
        user_id: i64,
        verification: PaymentVerification,
    ) -> Result<VerificationOutcome, PaymentFlowError> {
        let order_id = GatewayOrderId::from(verification.external_order_id.trim());
        let payment_id = verification.external_payment_id.trim();
        if order_id.as_str().is_empty() || payment_id.is_empty() || verification.signature.trim().is_empty() {
            return Err(PaymentFlowError::InvalidRequest("Order id, payment id and signature are required".into()));
        }
        let signature_valid = self.signatures.verify_checkout(order_id.as_str(), payment_id, &verification.signature);
        let intent = self.db.fetch_payment_intent(&order_id).await?;
        let Some(intent) = intent else {
            warn!(
                "🔄️ Verification for unknown order {order_id} (signature valid: {signature_valid}). No state to update."
            );
            return Ok(VerificationOutcome { signature_valid, intent: None, order: None, payment: None });
        };
        if intent.user_id != user_id {
            warn!("🔄️ User #{user_id} tried to verify order {order_id}, which belongs to user #{}", intent.user_id);
            return Err(PaymentFlowError::IntentNotFound(order_id));
        }
        if signature_valid {
            let transition =
                self.db.complete_payment_intent(&order_id, payment_id, Some(verification.signature.trim())).await?;
            self.after_transition(&transition).await;
            let payment = match transition.intent.status {
                PaymentStatus::Success => self.fetch_payment_best_effort(payment_id).await,
                _ => None,
            };
            Ok(VerificationOutcome {
                signature_valid,
                intent: Some(transition.intent),
                order: transition.order,
                payment,
            })
        } else {
            warn!("🔄️ Invalid checkout signature presented for order {order_id}");
            let transition = self.db.fail_payment_intent(&order_id, Some(payment_id), INVALID_SIGNATURE_REASON).await?;
            self.after_transition(&transition).await;
            Ok(VerificationOutcome { signature_valid, intent: Some(transition.intent), order: transition.order, payment: None })
        }
    }

    async fn fetch_payment_best_effort(&self, payment_id: &str) -> Option<GatewayPayment> {
        match self.gateway.fetch_payment(payment_id).await {
            Ok(payment) => Some(payment),
            Err(e) => {
                warn!("🔄️💳️ Could not fetch details for payment {payment_id}: {e}");
                None
            },
        }
    }

    /// Authenticates and processes a webhook delivery.
    ///
    /// `body` must be the exact bytes that were received. A missing or invalid signature is
    /// [`PaymentFlowError::InvalidWebhookSignature`] and nothing is processed.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentFlowError> {
        let Some(signature) = signature else {
            warn!("🪝️ Webhook delivery without a signature");
            return Err(PaymentFlowError::InvalidWebhookSignature);
        };
        if !self.signatures.verify_webhook(body, signature) {
            warn!("🪝️ Webhook delivery with an invalid signature");
            return Err(PaymentFlowError::InvalidWebhookSignature);
        }
        let event: WebhookEvent =
            serde_json::from_slice(body).map_err(|e| PaymentFlowError::MalformedWebhook(e.to_string()))?;
        info!("🪝️ Webhook event received: {}", event.event);
        match event.kind() {
            WebhookEventKind::PaymentAuthorized => {
                let payment = event.payment().map(|p| p.id.as_str()).unwrap_or("?");
                info!("🪝️ Payment {payment} authorized. Waiting for capture.");
                Ok(WebhookOutcome::Acknowledged(event.event))
            },
            WebhookEventKind::PaymentCaptured | WebhookEventKind::OrderPaid => self.reconcile_success(&event).await,
            WebhookEventKind::PaymentFailed => self.reconcile_failure(&event).await,
            WebhookEventKind::RefundCreated => self.record_refund(&event).await,
            WebhookEventKind::Other(kind) => {
                info!("🪝️ Ignoring unhandled webhook event {kind}");
                Ok(WebhookOutcome::Ignored(kind))
            },
        }
    }

    async fn reconcile_success(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PaymentFlowError> {
        let order_id = event
            .gateway_order_id()
            .ok_or_else(|| PaymentFlowError::MalformedWebhook(format!("{} has no order id", event.event)))?;
        let payment_id = event
            .payment()
            .map(|p| p.id.clone())
            .ok_or_else(|| PaymentFlowError::MalformedWebhook(format!("{} has no payment entity", event.event)))?;
        match self.db.complete_payment_intent(&order_id, &payment_id, None).await {
            Ok(transition) => {
                self.after_transition(&transition).await;
                Ok(WebhookOutcome::PaymentSucceeded { order_id, changed: transition.changed })
            },
            Err(PaymentGatewayError::IntentNotFound(id)) => {
                warn!("🪝️ {} refers to unknown order {id}", event.event);
                Ok(WebhookOutcome::Ignored(format!("No payment intent for {id}")))
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn reconcile_failure(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PaymentFlowError> {
        let order_id = event
            .gateway_order_id()
            .ok_or_else(|| PaymentFlowError::MalformedWebhook(format!("{} has no order id", event.event)))?;
        let payment = event.payment();
        let payment_id = payment.map(|p| p.id.as_str());
        let reason = payment.and_then(|p| p.error_description.as_deref()).unwrap_or(GATEWAY_FAILURE_REASON);
        match self.db.fail_payment_intent(&order_id, payment_id, reason).await {
            Ok(transition) => {
                self.after_transition(&transition).await;
                Ok(WebhookOutcome::PaymentFailed { order_id, changed: transition.changed })
            },
            Err(PaymentGatewayError::IntentNotFound(id)) => {
                warn!("🪝️ {} refers to unknown order {id}", event.event);
                Ok(WebhookOutcome::Ignored(format!("No payment intent for {id}")))
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn record_refund(&self, event: &WebhookEvent) -> Result<WebhookOutcome, PaymentFlowError> {
        let refund = event
            .refund()
            .ok_or_else(|| PaymentFlowError::MalformedWebhook("refund.created has no refund entity".into()))?;
        let new_refund = NewRefund {
            refund_id: refund.id.clone(),
            payment_id: refund.payment_id.clone(),
            amount: Paise::from(refund.amount),
            status: refund.status.clone().unwrap_or_else(|| "processed".into()),
            reason: None,
        };
        let (refund, new) = self.db.insert_refund(new_refund).await?;
        info!("🪝️ Refund {} for payment {} recorded (new: {new})", refund.refund_id, refund.payment_id);
        Ok(WebhookOutcome::RefundRecorded { refund_id: refund.refund_id, new })
    }

    async fn after_transition(&self, transition: &IntentTransition) {
        if !transition.changed {
            trace!(
                "🔄️ Payment {} is already {}. Nothing changed.",
                transition.intent.gateway_order_id,
                transition.intent.status
            );
            return;
        }
        match (transition.intent.status, &transition.order) {
            (PaymentStatus::Success, Some(order)) => {
                info!("🔄️ Payment {} succeeded. Order #{} recorded.", transition.intent.gateway_order_id, order.id);
                for emitter in &self.producers.order_paid_producer {
                    debug!("🔄️📦️ Notifying order paid hook subscribers");
                    emitter.publish_event(OrderPaidEvent::new(transition.intent.clone(), order.clone())).await;
                }
            },
            (PaymentStatus::Failed, _) => {
                info!("🔄️ Payment {} failed", transition.intent.gateway_order_id);
                for emitter in &self.producers.payment_failed_producer {
                    debug!("🔄️📦️ Notifying payment failed hook subscribers");
                    emitter.publish_event(PaymentFailedEvent::new(transition.intent.clone())).await;
                }
            },
            (status, _) => {
                error!("🔄️ Unexpected state after transition of {}: {status}", transition.intent.gateway_order_id);
            },
        }
    }

    /// Refunds a payment through the gateway and records the refund. The whole payment is refunded if no amount is
    /// given.
    pub async fn refund_payment(&self, request: RefundPaymentRequest) -> Result<GatewayRefund, PaymentFlowError> {
        let payment_id = request.payment_id.trim().to_string();
        if payment_id.is_empty() {
            return Err(PaymentFlowError::InvalidRequest("Payment id is required".into()));
        }
        if let Some(amount) = request.amount {
            if !amount.is_positive() {
                return Err(PaymentFlowError::InvalidAmount(format!("Refund amount must be positive, not {amount}")));
            }
        }
        let reason = request.reason.filter(|r| !r.trim().is_empty()).unwrap_or_else(|| DEFAULT_REFUND_REASON.into());
        let refund = self.gateway.refund(&payment_id, RefundRequest { amount: request.amount, reason: reason.clone() }).await?;
        let new_refund = NewRefund {
            refund_id: refund.id.clone(),
            payment_id: payment_id.clone(),
            amount: refund.amount,
            status: refund.status.clone(),
            reason: Some(reason),
        };
        self.db.insert_refund(new_refund).await?;
        info!("🔄️💳️ Refund {} of {} issued for payment {payment_id}", refund.id, refund.amount);
        Ok(refund)
    }

    pub async fn payment_details(&self, payment_id: &str) -> Result<GatewayPayment, PaymentFlowError> {
        let payment = self.gateway.fetch_payment(payment_id).await?;
        Ok(payment)
    }

    pub async fn gateway_order_details(&self, order_id: &GatewayOrderId) -> Result<GatewayOrderDetails, PaymentFlowError> {
        let (order, payments) =
            tokio::try_join!(self.gateway.fetch_order(order_id), self.gateway.fetch_order_payments(order_id))?;
        Ok(GatewayOrderDetails { order, payments })
    }

    pub async fn payment_intent(&self, order_id: &GatewayOrderId) -> Result<PaymentIntent, PaymentFlowError> {
        self.db.fetch_payment_intent(order_id).await?.ok_or_else(|| PaymentFlowError::IntentNotFound(order_id.clone()))
    }

    /// Payment intents, newest first.
    pub async fn payments(&self, query: PaymentIntentQuery) -> Result<Vec<PaymentIntent>, PaymentFlowError> {
        let intents = self.db.fetch_payment_intents(query).await?;
        Ok(intents)
    }

    pub async fn stats(&self) -> Result<PaymentStats, PaymentFlowError> {
        let stats = self.db.payment_stats().await?;
        Ok(stats)
    }
}
