use super::{shipping_address, TestStore};
use crate::{
    db_types::{GatewayOrderId, Paise},
    hood_api::{
        order_objects::{NewOrderRequest, OrderItemRequest},
        payment_objects::{CheckoutRequest, PaymentVerification},
    },
    OrderLedgerApi,
    OrderLedgerError,
};

async fn paid_checkout(store: &TestStore, user: i64, order_id: &str, valid: bool) {
    store.gateway.queue_order_id(order_id);
    let api = store.payments();
    let request = CheckoutRequest::new(Paise::from(50_000)).with_item(store.tee.id, 2, "L");
    api.create_checkout(user, request).await.expect("checkout failed");
    let signature = if valid {
        TestStore::signatures().checkout_signature(order_id, "pay_123").unwrap()
    } else {
        "garbage".to_string()
    };
    let verification = PaymentVerification {
        external_order_id: order_id.into(),
        external_payment_id: "pay_123".into(),
        signature,
    };
    api.verify_payment(user, verification).await.expect("verification failed");
}

fn order_request(store: &TestStore, order_id: &str) -> NewOrderRequest {
    NewOrderRequest {
        items: vec![OrderItemRequest { product_id: store.tee.id, quantity: 2, size: Some("L".into()) }],
        shipping_address: shipping_address(),
        total_amount: Paise::from(50_000),
        payment_order_id: GatewayOrderId::from(order_id),
    }
}

#[tokio::test]
async fn orders_need_a_verified_payment() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let ledger = OrderLedgerApi::new(store.db.clone());

    let err = ledger.record_order(user, order_request(&store, "order_none")).await.unwrap_err();
    assert!(matches!(err, OrderLedgerError::PaymentNotFound(_)));

    // Created, but never verified
    store.gateway.queue_order_id("order_pending");
    let request = CheckoutRequest::new(Paise::from(50_000)).with_item(store.tee.id, 2, "L");
    store.payments().create_checkout(user, request).await.unwrap();
    let err = ledger.record_order(user, order_request(&store, "order_pending")).await.unwrap_err();
    assert!(matches!(err, OrderLedgerError::PaymentNotVerified));

    paid_checkout(&store, user, "order_failed", false).await;
    let err = ledger.record_order(user, order_request(&store, "order_failed")).await.unwrap_err();
    assert!(matches!(err, OrderLedgerError::PaymentNotVerified));
    assert!(ledger.orders_for_user(user).await.unwrap().is_empty());
    store.tear_down().await;
}

#[tokio::test]
async fn recording_returns_the_settled_order() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let ledger = OrderLedgerApi::new(store.db.clone());
    paid_checkout(&store, user, "order_abc", true).await;

    let (order, inserted) = ledger.record_order(user, order_request(&store, "order_abc")).await.unwrap();
    // Verification already wrote it; the address is attached now
    assert!(!inserted);
    assert_eq!(order.shipping_address.as_ref().map(|a| a.0.full_name.as_str()), Some("Asha Rao"));
    let (again, _) = ledger.record_order(user, order_request(&store, "order_abc")).await.unwrap();
    assert_eq!(again.id, order.id);
    assert_eq!(ledger.orders_for_user(user).await.unwrap().len(), 1);

    let ravi = store.user("ravi@example.com").await;
    let err = ledger.record_order(ravi, order_request(&store, "order_abc")).await.unwrap_err();
    assert!(matches!(err, OrderLedgerError::PaymentNotVerified));
    store.tear_down().await;
}

#[tokio::test]
async fn request_must_match_what_was_paid() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let ledger = OrderLedgerApi::new(store.db.clone());
    paid_checkout(&store, user, "order_abc", true).await;

    let mut request = order_request(&store, "order_abc");
    request.total_amount = Paise::from(100);
    let err = ledger.record_order(user, request).await.unwrap_err();
    assert!(matches!(err, OrderLedgerError::InvalidRequest(_)));

    let mut request = order_request(&store, "order_abc");
    request.items[0].quantity = 3;
    let err = ledger.record_order(user, request).await.unwrap_err();
    assert!(matches!(err, OrderLedgerError::InvalidRequest(_)));

    let mut request = order_request(&store, "order_abc");
    request.shipping_address.city = " ".into();
    let err = ledger.record_order(user, request).await.unwrap_err();
    assert!(matches!(err, OrderLedgerError::InvalidRequest(_)));
    store.tear_down().await;
}

#[tokio::test]
async fn orders_are_listed_newest_first() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let ledger = OrderLedgerApi::new(store.db.clone());
    paid_checkout(&store, user, "order_1", true).await;
    paid_checkout(&store, user, "order_2", true).await;
    paid_checkout(&store, user, "order_3", true).await;
    let orders = ledger.orders_for_user(user).await.unwrap();
    let ids = orders.iter().map(|o| o.payment_order_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["order_3", "order_2", "order_1"]);
    let ravi = store.user("ravi@example.com").await;
    assert!(ledger.orders_for_user(ravi).await.unwrap().is_empty());
    store.tear_down().await;
}
