use futures_util::future::join_all;

use super::TestStore;
use crate::{
    db_types::{Paise, MAX_LINE_QUANTITY},
    hood_api::cart_objects::AddCartItem,
    CartApi,
    CartApiError,
    CatalogApi,
};

#[tokio::test]
async fn adding_twice_increments_the_line() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = CartApi::new(store.db.clone());
    let tee = store.tee.id;
    api.add_item(user, AddCartItem::new(tee).with_quantity(2).with_size("L")).await.unwrap();
    let cart = api.add_item(user, AddCartItem::new(tee).with_quantity(3).with_size("L")).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.line(tee, "L").unwrap().quantity, 5);
    assert_eq!(cart.item_count, 5);
    assert_eq!(cart.subtotal, Paise::from(125_000));

    // A different size is a separate line
    let cart = api.add_item(user, AddCartItem::new(tee)).await.unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.line(tee, "M").unwrap().quantity, 1);
    store.tear_down().await;
}

#[tokio::test]
async fn carts_are_per_user() {
    let store = TestStore::new().await;
    let asha = store.user("asha@example.com").await;
    let ravi = store.user("ravi@example.com").await;
    let api = CartApi::new(store.db.clone());
    api.add_item(asha, AddCartItem::new(store.cap.id)).await.unwrap();
    assert!(api.cart(ravi).await.unwrap().is_empty());
    assert_eq!(api.cart(asha).await.unwrap().item_count, 1);
    store.tear_down().await;
}

#[tokio::test]
async fn remove_and_clear_are_forgiving() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = CartApi::new(store.db.clone());
    let tee = store.tee.id;

    // Nothing to remove or clear yet
    assert!(api.remove_item(user, tee, Some("L")).await.unwrap().is_empty());
    assert!(api.clear(user).await.unwrap().is_empty());

    api.add_item(user, AddCartItem::new(tee).with_size("L")).await.unwrap();
    api.add_item(user, AddCartItem::new(tee)).await.unwrap();
    api.add_item(user, AddCartItem::new(store.cap.id).with_quantity(2)).await.unwrap();
    // No size means the default line
    let cart = api.remove_item(user, tee, None).await.unwrap();
    assert!(cart.line(tee, "M").is_none());
    assert!(cart.line(tee, "L").is_some());
    let cart = api.remove_item(user, tee, Some("XL")).await.unwrap();
    assert_eq!(cart.items.len(), 2);
    let cart = api.clear(user).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.subtotal, Paise::default());
    store.tear_down().await;
}

#[tokio::test]
async fn invalid_additions_are_rejected() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = CartApi::new(store.db.clone());
    let err = api.add_item(user, AddCartItem::new(9_999)).await.unwrap_err();
    assert!(matches!(err, CartApiError::ProductNotFound(9_999)));
    let err = api.add_item(user, AddCartItem::new(store.tee.id).with_quantity(0)).await.unwrap_err();
    assert!(matches!(err, CartApiError::InvalidQuantity(0)));
    let err = api.add_item(user, AddCartItem::new(store.tee.id).with_size("  ")).await.unwrap_err();
    assert!(matches!(err, CartApiError::InvalidSize));
    assert!(api.cart(user).await.unwrap().is_empty());
    store.tear_down().await;
}

#[tokio::test]
async fn lines_survive_their_product() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = CartApi::new(store.db.clone());
    api.add_item(user, AddCartItem::new(store.tee.id).with_quantity(2)).await.unwrap();
    CatalogApi::new(store.db.clone()).seed_catalog().await.unwrap();
    let cart = api.cart(user).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert!(cart.items[0].product.is_none());
    assert_eq!(cart.item_count, 2);
    assert_eq!(cart.subtotal, Paise::default());
    store.tear_down().await;
}

#[tokio::test]
async fn concurrent_adds_are_not_lost() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let tee = store.tee.id;
    let adds = (0..10).map(|_| {
        let api = CartApi::new(store.db.clone());
        async move { api.add_item(user, AddCartItem::new(tee).with_size("S")).await }
    });
    for result in join_all(adds).await {
        result.expect("add failed");
    }
    let cart = CartApi::new(store.db.clone()).cart(user).await.unwrap();
    assert_eq!(cart.line(tee, "S").unwrap().quantity, 10);
    store.tear_down().await;
}

#[tokio::test]
async fn line_quantities_are_capped() {
    let store = TestStore::new().await;
    let user = store.user("asha@example.com").await;
    let api = CartApi::new(store.db.clone());
    let tee = store.tee.id;

    let err = api.add_item(user, AddCartItem::new(tee).with_quantity(MAX_LINE_QUANTITY + 1)).await.unwrap_err();
    assert!(matches!(err, CartApiError::InvalidQuantity(101)));
    let err = api.add_item(user, AddCartItem::new(tee).with_quantity(i64::MAX)).await.unwrap_err();
    assert!(matches!(err, CartApiError::InvalidQuantity(i64::MAX)));
    assert!(api.cart(user).await.unwrap().is_empty());

    // Filling a line to the limit is fine, going past it through repeated adds is not
    api.add_item(user, AddCartItem::new(tee).with_quantity(60)).await.unwrap();
    let cart = api.add_item(user, AddCartItem::new(tee).with_quantity(40)).await.unwrap();
    assert_eq!(cart.line(tee, "M").unwrap().quantity, MAX_LINE_QUANTITY);
    let err = api.add_item(user, AddCartItem::new(tee)).await.unwrap_err();
    assert!(matches!(err, CartApiError::QuantityLimit(MAX_LINE_QUANTITY)));
    let cart = api.cart(user).await.unwrap();
    assert_eq!(cart.line(tee, "M").unwrap().quantity, MAX_LINE_QUANTITY);
    assert_eq!(cart.subtotal, Paise::from(2_500_000));
    store.tear_down().await;
}
