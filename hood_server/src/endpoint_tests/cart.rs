use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use hood_engine::{
    db_types::{CartLine, Paise, ProductSnapshot, Role},
    traits::CartError,
    CartApi,
};
use mockall::predicate::eq;
use serde_json::json;

use super::{helpers::*, mocks::*};
use crate::{
    auth::TokenIssuer,
    middleware::JwtMiddlewareFactory,
    routes::{AddToCartRoute, ClearCartRoute, GetCartRoute, RemoveFromCartRoute},
};

fn configure_app(carts: MockCartManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let signer = TokenIssuer::new(&test_auth_config());
        crate::server::configure_extractors(cfg);
        cfg.app_data(web::Data::new(CartApi::new(carts))).service(
            web::scope("/api")
                .wrap(JwtMiddlewareFactory::new(signer))
                .service(GetCartRoute::<MockCartManager>::new())
                .service(AddToCartRoute::<MockCartManager>::new())
                .service(RemoveFromCartRoute::<MockCartManager>::new())
                .service(ClearCartRoute::<MockCartManager>::new()),
        );
    }
}

fn tee_line(quantity: i64, size: &str) -> CartLine {
    CartLine {
        product_id: 11,
        quantity,
        size: size.to_string(),
        product: Some(ProductSnapshot {
            id: 11,
            name: "NINEHOOD BASIC TEE".into(),
            price: Paise::from_rupees(250),
            images: vec![],
        }),
    }
}

#[actix_web::test]
async fn carts_need_a_token() {
    let app = test::init_service(App::new().configure(configure_app(MockCartManager::new()))).await;
    let req = TestRequest::get().uri("/api/cart").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn the_cart_belongs_to_the_token_holder() {
    let mut carts = MockCartManager::new();
    carts.expect_fetch_cart().with(eq(5)).times(1).returning(|_| Ok(vec![tee_line(2, "M")]));
    let app = test::init_service(App::new().configure(configure_app(carts))).await;
    let token = token_for(5, "asha@example.com", &[Role::User]);
    let req = TestRequest::get().uri("/api/cart").insert_header(bearer(&token)).to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemCount"], 2);
    assert_eq!(body["subtotal"], 500);
    assert_eq!(body["cart"][0]["size"], "M");
    assert_eq!(body["cart"][0]["product"]["name"], "NINEHOOD BASIC TEE");
}

#[actix_web::test]
async fn adding_uses_default_quantity_and_size() {
    let mut carts = MockCartManager::new();
    carts
        .expect_add_to_cart()
        .withf(|user, product, quantity, size| *user == 5 && *product == 11 && *quantity == 1 && size == "M")
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    carts.expect_fetch_cart().returning(|_| Ok(vec![tee_line(1, "M")]));
    let app = test::init_service(App::new().configure(configure_app(carts))).await;
    let token = token_for(5, "asha@example.com", &[Role::User]);
    let req = TestRequest::post()
        .uri("/api/cart")
        .insert_header(bearer(&token))
        .set_json(json!({"productId": 11}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item added to cart");
    assert_eq!(body["itemCount"], 1);
}

#[actix_web::test]
async fn adding_rejects_bad_quantities() {
    let mut carts = MockCartManager::new();
    carts.expect_add_to_cart().never();
    let app = test::init_service(App::new().configure(configure_app(carts))).await;
    let token = token_for(5, "asha@example.com", &[Role::User]);
    let req = TestRequest::post()
        .uri("/api/cart")
        .insert_header(bearer(&token))
        .set_json(json!({"productId": 11, "quantity": 0}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidArgument");

    let req = TestRequest::post()
        .uri("/api/cart")
        .insert_header(bearer(&token))
        .set_json(json!({"productId": 11, "quantity": 101}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidArgument");

    let req = TestRequest::post()
        .uri("/api/cart")
        .insert_header(bearer(&token))
        .set_json(json!({"quantity": 2}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidArgument");
}

#[actix_web::test]
async fn full_lines_cannot_grow() {
    let mut carts = MockCartManager::new();
    carts.expect_add_to_cart().times(1).returning(|_, _, _, _| Err(CartError::QuantityLimit(100)));
    carts.expect_fetch_cart().never();
    let app = test::init_service(App::new().configure(configure_app(carts))).await;
    let token = token_for(5, "asha@example.com", &[Role::User]);
    let req = TestRequest::post()
        .uri("/api/cart")
        .insert_header(bearer(&token))
        .set_json(json!({"productId": 11, "quantity": 5}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidArgument");
}

#[actix_web::test]
async fn removing_targets_one_size() {
    let mut carts = MockCartManager::new();
    carts
        .expect_remove_from_cart()
        .withf(|user, product, size| *user == 5 && *product == 11 && size == "L")
        .times(1)
        .returning(|_, _, _| Ok(true));
    carts
        .expect_remove_from_cart()
        .withf(|_, _, size| size == "M")
        .times(1)
        .returning(|_, _, _| Ok(false));
    carts.expect_fetch_cart().returning(|_| Ok(vec![tee_line(1, "S")]));
    let app = test::init_service(App::new().configure(configure_app(carts))).await;
    let token = token_for(5, "asha@example.com", &[Role::User]);

    let req = TestRequest::delete().uri("/api/cart/11?size=L").insert_header(bearer(&token)).to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item removed from cart");
    assert_eq!(body["cart"][0]["size"], "S");

    // Without a size, the default size is removed. Missing lines are not an error.
    let req = TestRequest::delete().uri("/api/cart/11").insert_header(bearer(&token)).to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn clearing_the_cart() {
    let mut carts = MockCartManager::new();
    carts.expect_clear_cart().with(eq(5)).times(1).returning(|_| Ok(3));
    carts.expect_fetch_cart().returning(|_| Ok(vec![]));
    let app = test::init_service(App::new().configure(configure_app(carts))).await;
    let token = token_for(5, "asha@example.com", &[Role::User]);
    let req = TestRequest::delete().uri("/api/cart").insert_header(bearer(&token)).to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Cart cleared", "cart": [], "itemCount": 0, "subtotal": 0}));
}

#[actix_web::test]
async fn cart_round_trip_on_the_store() {
    let store = TestStore::new().await;
    let app = test::init_service(App::new().configure(store.configure())).await;
    let (_, token) = store.user("asha@example.com").await;
    let add = |product_id: i64, quantity: i64, size: &str| {
        TestRequest::post()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .set_json(json!({"productId": product_id, "quantity": quantity, "size": size}))
            .to_request()
    };
    let (status, _) = send(&app, add(store.tee.id, 1, "M")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, add(store.tee.id, 2, "M")).await;
    assert_eq!(body["cart"].as_array().unwrap().len(), 1);
    assert_eq!(body["cart"][0]["quantity"], 3);
    let (_, body) = send(&app, add(store.cap.id, 1, "One Size")).await;
    assert_eq!(body["itemCount"], 4);
    assert_eq!(body["subtotal"], 949.5);

    // Other users have their own carts
    let (_, other) = store.user("ravi@example.com").await;
    let req = TestRequest::get().uri("/api/cart").insert_header(bearer(&other)).to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["itemCount"], 0);
    store.tear_down().await;
}
