use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
};

use hood_common::Secret;

use super::{shipping_address, TestStore};
use crate::{
    db_types::{GatewayOrderId, Paise, PaymentStatus, MAX_LINE_QUANTITY},
    events::{EventHandlers, EventHooks, EventProducers},
    helpers::{hmac_sha256_hex, PaymentSignatures},
    hood_api::{
        cart_objects::AddCartItem,
        payment_flow_api::INVALID_SIGNATURE_REASON,
        payment_objects::{CheckoutRequest, PaymentVerification, RefundPaymentRequest},
    },
    traits::{OrderManagement, PaymentIntentQuery},
    CartApi,
    PaymentFlowError,
};

fn verification(order_id: &str, payment_id: &str, signature: &str) -> PaymentVerification {
    PaymentVerification {
        external_order_id: order_id.into(),
        external_payment_id: payment_id.into(),
        signature: signature.into(),
    }
}

/// Two tees in M and a cap comes to ₹699.50
fn checkout_request(store: &TestStore) -> CheckoutRequest {
    CheckoutRequest::new(Paise::from(69_950)).with_item(store.tee.id, 2, "M").with_item(store.cap.id, 1, "One Size")
}

#[tokio::test]
async fn checkout_creates_an_intent() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    store.gateway.queue_order_id("order_abc");
    let api = store.payments();
    let checkout = api.create_checkout(user, checkout_request(&store)).await.expect("checkout failed");
    assert_eq!(checkout.order.id, GatewayOrderId::from("order_abc"));
    assert_eq!(checkout.order.amount, 69_950);
    assert_eq!(checkout.order.currency, "INR");
    assert!(checkout.order.receipt.starts_with("receipt_"));
    assert_eq!(checkout.public_key, "rzp_test_key");

    let intent = api.payment_intent(&checkout.order.id).await.unwrap();
    assert_eq!(intent.status, PaymentStatus::Created);
    assert_eq!(intent.user_id, user);
    assert_eq!(intent.amount, Paise::from(69_950));
    assert_eq!(intent.items.len(), 2);
    assert_eq!(intent.items[0].unit_price, Paise::from(25_000));
    assert_eq!(intent.items[0].name, "NINEHOOD BASIC TEE");
    assert!(intent.payment_id.is_none());
    store.tear_down().await;
}

#[tokio::test]
async fn checkout_from_server_cart() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let cart = CartApi::new(store.db.clone());
    cart.add_item(user, AddCartItem::new(store.tee.id).with_quantity(2)).await.unwrap();
    let api = store.payments();
    let mut request = CheckoutRequest::new(Paise::from(50_000));
    request.shipping_address = Some(shipping_address());
    let checkout = api.create_checkout(user, request).await.expect("checkout failed");
    let intent = api.payment_intent(&checkout.order.id).await.unwrap();
    assert_eq!(intent.items.len(), 1);
    assert_eq!(intent.items[0].size, "M");
    assert_eq!(intent.shipping_address.as_ref().map(|a| a.0.city.as_str()), Some("Bengaluru"));
    // The cart is only cleared once the payment succeeds
    assert_eq!(cart.cart(user).await.unwrap().item_count, 2);
    store.tear_down().await;
}

#[tokio::test]
async fn checkout_rejects_bad_amounts() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = store.payments();
    let err = api.create_checkout(user, CheckoutRequest::new(Paise::from(0))).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidAmount(_)));
    let err = api.create_checkout(user, CheckoutRequest::new(Paise::from(-100))).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidAmount(_)));
    let request = CheckoutRequest::new(Paise::from(100)).with_item(store.tee.id, 1, "M");
    let err = api.create_checkout(user, request).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidAmount(_)));
    // Empty cart, nothing to pay for
    let err = api.create_checkout(user, CheckoutRequest::new(Paise::from(100))).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidRequest(_)));
    let request = CheckoutRequest::new(Paise::from(100)).with_item(404, 1, "M");
    let err = api.create_checkout(user, request).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::ProductNotFound(404)));
    assert_eq!(store.gateway.orders_created(), 0);
    store.tear_down().await;
}

#[tokio::test]
async fn gateway_outage_leaves_no_intent() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    store.gateway.set_unavailable(true);
    let api = store.payments();
    let err = api.create_checkout(user, checkout_request(&store)).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::GatewayError(_)));
    assert!(api.payments(PaymentIntentQuery::default()).await.unwrap().is_empty());
    store.tear_down().await;
}

#[tokio::test]
async fn valid_signature_settles_the_payment() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let cart = CartApi::new(store.db.clone());
    cart.add_item(user, AddCartItem::new(store.cap.id)).await.unwrap();
    store.gateway.queue_order_id("order_abc");
    store.gateway.add_captured_payment("pay_123", "order_abc", Paise::from(69_950));
    let api = store.payments();
    api.create_checkout(user, checkout_request(&store)).await.unwrap();

    let signature = TestStore::signatures().checkout_signature("order_abc", "pay_123").unwrap();
    let outcome = api.verify_payment(user, verification("order_abc", "pay_123", &signature)).await.unwrap();
    assert!(outcome.signature_valid);
    assert!(outcome.is_success());
    let intent = outcome.intent.as_ref().unwrap();
    assert_eq!(intent.status, PaymentStatus::Success);
    assert_eq!(intent.payment_id.as_deref(), Some("pay_123"));
    assert_eq!(intent.signature.as_deref(), Some(signature.as_str()));
    assert!(intent.verified_at.is_some());
    assert_eq!(outcome.payment.as_ref().map(|p| p.id.as_str()), Some("pay_123"));

    let order = outcome.order.expect("an order should have been written");
    assert_eq!(order.user_id, user);
    assert_eq!(order.total_amount, Paise::from(69_950));
    assert_eq!(order.payment_id.as_deref(), Some("pay_123"));
    assert_eq!(order.items.len(), 2);
    assert!(cart.cart(user).await.unwrap().is_empty());

    // Repeating the call changes nothing
    let again = api.verify_payment(user, verification("order_abc", "pay_123", &signature)).await.unwrap();
    assert!(again.is_success());
    assert_eq!(again.order.map(|o| o.id), Some(order.id));
    assert_eq!(store.db.fetch_orders_for_user(user).await.unwrap().len(), 1);
    store.tear_down().await;
}

#[tokio::test]
async fn invalid_signature_fails_the_payment() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    store.gateway.queue_order_id("order_abc");
    let api = store.payments();
    api.create_checkout(user, checkout_request(&store)).await.unwrap();

    let outcome = api.verify_payment(user, verification("order_abc", "pay_123", "garbage")).await.unwrap();
    assert!(!outcome.signature_valid);
    assert!(!outcome.is_success());
    let intent = outcome.intent.unwrap();
    assert_eq!(intent.status, PaymentStatus::Failed);
    assert_eq!(intent.failure_reason.as_deref(), Some(INVALID_SIGNATURE_REASON));
    assert!(outcome.order.is_none());

    // A failed intent stays failed, even if the genuine signature turns up later
    let signature = TestStore::signatures().checkout_signature("order_abc", "pay_123").unwrap();
    let outcome = api.verify_payment(user, verification("order_abc", "pay_123", &signature)).await.unwrap();
    assert!(outcome.signature_valid);
    assert!(!outcome.is_success());
    assert_eq!(outcome.intent.unwrap().status, PaymentStatus::Failed);
    assert!(store.db.fetch_orders_for_user(user).await.unwrap().is_empty());
    store.tear_down().await;
}

#[tokio::test]
async fn successful_intents_cannot_be_failed() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    store.gateway.queue_order_id("order_abc");
    let api = store.payments();
    api.create_checkout(user, checkout_request(&store)).await.unwrap();
    let signature = TestStore::signatures().checkout_signature("order_abc", "pay_123").unwrap();
    api.verify_payment(user, verification("order_abc", "pay_123", &signature)).await.unwrap();

    let outcome = api.verify_payment(user, verification("order_abc", "pay_123", "garbage")).await.unwrap();
    assert!(!outcome.is_success());
    let intent = outcome.intent.unwrap();
    assert_eq!(intent.status, PaymentStatus::Success);
    assert!(intent.failure_reason.is_none());
    store.tear_down().await;
}

#[tokio::test]
async fn verification_without_an_intent() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = store.payments();
    let signature = TestStore::signatures().checkout_signature("order_xyz", "pay_1").unwrap();
    let outcome = api.verify_payment(user, verification("order_xyz", "pay_1", &signature)).await.unwrap();
    assert!(outcome.signature_valid);
    assert!(outcome.intent.is_none());
    let outcome = api.verify_payment(user, verification("order_xyz", "pay_1", "garbage")).await.unwrap();
    assert!(!outcome.signature_valid);
    assert!(!outcome.is_success());
    let err = api.verify_payment(user, verification("order_xyz", "", "abcd")).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidRequest(_)));
    store.tear_down().await;
}

#[tokio::test]
async fn other_users_cannot_verify() {
    let store = TestStore::new().await;
    let asha = store.user("asha@example.com").await;
    let ravi = store.user("ravi@example.com").await;
    store.gateway.queue_order_id("order_abc");
    let api = store.payments();
    api.create_checkout(asha, checkout_request(&store)).await.unwrap();
    let err = api.verify_payment(ravi, verification("order_abc", "pay_123", "garbage")).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::IntentNotFound(_)));
    let intent = api.payment_intent(&GatewayOrderId::from("order_abc")).await.unwrap();
    assert_eq!(intent.status, PaymentStatus::Created);
    store.tear_down().await;
}

#[tokio::test]
async fn refunds_and_reporting() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    store.gateway.queue_order_id("order_abc");
    store.gateway.queue_order_id("order_def");
    store.gateway.add_captured_payment("pay_123", "order_abc", Paise::from(69_950));
    let api = store.payments();
    api.create_checkout(user, checkout_request(&store)).await.unwrap();
    api.create_checkout(user, checkout_request(&store)).await.unwrap();
    let signature = TestStore::signatures().checkout_signature("order_abc", "pay_123").unwrap();
    api.verify_payment(user, verification("order_abc", "pay_123", &signature)).await.unwrap();
    api.verify_payment(user, verification("order_def", "pay_456", "garbage")).await.unwrap();

    let stats = api.stats().await.unwrap();
    assert_eq!(stats.total_payments, 2);
    assert_eq!(stats.successful_payments, 1);
    assert_eq!(stats.failed_payments, 1);
    assert_eq!(stats.total_revenue, Paise::from(69_950));
    assert_eq!(stats.success_rate, 50.0);

    let all = api.payments(PaymentIntentQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].gateway_order_id.as_str(), "order_def");
    let failed = api.payments(PaymentIntentQuery::default().with_status(PaymentStatus::Failed)).await.unwrap();
    assert_eq!(failed.len(), 1);

    let details = api.gateway_order_details(&GatewayOrderId::from("order_abc")).await.unwrap();
    assert_eq!(details.payments.len(), 1);

    let request = RefundPaymentRequest { payment_id: "pay_123".into(), amount: Some(Paise::from(10_000)), reason: None };
    let refund = api.refund_payment(request).await.unwrap();
    assert_eq!(refund.amount, Paise::from(10_000));
    assert_eq!(store.gateway.refunds().len(), 1);
    let request = RefundPaymentRequest { payment_id: "pay_123".into(), amount: Some(Paise::from(-1)), reason: None };
    assert!(matches!(api.refund_payment(request).await, Err(PaymentFlowError::InvalidAmount(_))));
    store.tear_down().await;
}

#[tokio::test]
async fn hooks_fire_once_per_transition() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let paid = Arc::new(AtomicI32::new(0));
    let failed = Arc::new(AtomicI32::new(0));
    let mut hooks = EventHooks::default();
    let p = paid.clone();
    hooks.on_order_paid(move |ev| {
        let p = p.clone();
        Box::pin(async move {
            assert_eq!(ev.order.payment_order_id, ev.intent.gateway_order_id);
            p.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let f = failed.clone();
    hooks.on_payment_failed(move |ev| {
        let f = f.clone();
        Box::pin(async move {
            assert_eq!(ev.reason(), INVALID_SIGNATURE_REASON);
            f.fetch_add(1, Ordering::SeqCst);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    let order_paid = handlers.on_order_paid;
    let payment_failed = handlers.on_payment_failed;

    {
        store.gateway.queue_order_id("order_abc");
        store.gateway.queue_order_id("order_def");
        let api = store.payments_with_producers(producers);
        api.create_checkout(user, checkout_request(&store)).await.unwrap();
        api.create_checkout(user, checkout_request(&store)).await.unwrap();
        let signature = TestStore::signatures().checkout_signature("order_abc", "pay_123").unwrap();
        api.verify_payment(user, verification("order_abc", "pay_123", &signature)).await.unwrap();
        api.verify_payment(user, verification("order_abc", "pay_123", &signature)).await.unwrap();
        api.verify_payment(user, verification("order_def", "pay_456", "garbage")).await.unwrap();
        api.verify_payment(user, verification("order_def", "pay_456", "garbage")).await.unwrap();
    }
    // The API (and with it every producer) is gone, so the handlers drain and stop
    if let Some(handler) = order_paid {
        handler.start_handler().await;
    }
    if let Some(handler) = payment_failed {
        handler.start_handler().await;
    }
    assert_eq!(paid.load(Ordering::SeqCst), 1);
    assert_eq!(failed.load(Ordering::SeqCst), 1);
    store.tear_down().await;
}

#[tokio::test]
async fn oversized_quantities_are_rejected_at_checkout() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = store.payments();
    let request = CheckoutRequest::new(Paise::from(2_525_000)).with_item(store.tee.id, MAX_LINE_QUANTITY + 1, "M");
    let err = api.create_checkout(user, request).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidRequest(_)));
    // Far past the limit, and large enough to overflow the line total
    let request = CheckoutRequest::new(Paise::from(25_000)).with_item(store.tee.id, 1_346_612_317_380_797_268, "M");
    let err = api.create_checkout(user, request).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidRequest(_)));
    let request = CheckoutRequest::new(Paise::from(25_000)).with_item(store.tee.id, -1, "M");
    let err = api.create_checkout(user, request).await.unwrap_err();
    assert!(matches!(err, PaymentFlowError::InvalidRequest(_)));

    // A full line is still fine
    store.gateway.queue_order_id("order_abc");
    let request = CheckoutRequest::new(Paise::from(2_500_000)).with_item(store.tee.id, MAX_LINE_QUANTITY, "M");
    let checkout = api.create_checkout(user, request).await.expect("checkout failed");
    assert_eq!(checkout.order.amount, 2_500_000);
    assert_eq!(store.gateway.orders_created(), 1);
    store.tear_down().await;
}

#[tokio::test]
async fn unset_secrets_never_settle_a_payment() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    store.gateway.queue_order_id("order_abc");
    let unset = PaymentSignatures::new(Secret::new(String::new()), Secret::new(String::new()));
    let api = store.payments_signed_with(unset.clone(), EventProducers::default());
    api.create_checkout(user, checkout_request(&store)).await.unwrap();

    assert!(unset.checkout_signature("order_abc", "pay_123").is_err());
    // What an attacker would compute if the server signs with an empty key
    let forged = hmac_sha256_hex(b"", b"order_abc|pay_123").unwrap();
    let outcome = api.verify_payment(user, verification("order_abc", "pay_123", &forged)).await.unwrap();
    assert!(!outcome.signature_valid);
    assert!(!outcome.is_success());
    assert_eq!(outcome.intent.unwrap().status, PaymentStatus::Failed);
    assert!(outcome.order.is_none());
    assert!(store.db.fetch_orders_for_user(user).await.unwrap().is_empty());
    store.tear_down().await;
}
