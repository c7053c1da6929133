use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use hood_engine::{traits::CatalogError, CatalogApi};
use serde_json::json;

use super::{helpers::*, mocks::*};
use crate::routes::{ProductByIdRoute, ProductsRoute};

fn configure_app(catalog: MockCatalogManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(CatalogApi::new(catalog)))
            .service(ProductsRoute::<MockCatalogManager>::new())
            .service(ProductByIdRoute::<MockCatalogManager>::new());
    }
}

#[actix_web::test]
async fn list_products() {
    let store = TestStore::new().await;
    let app = test::init_service(App::new().configure(store.configure())).await;
    let req = TestRequest::get().uri("/api/products").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    let tee = &body["products"][0];
    assert_eq!(tee["name"], "NINEHOOD BASIC TEE");
    assert_eq!(tee["price"], 250);
    assert_eq!(tee["sizes"], json!(["S", "M", "L"]));
    assert_eq!(body["products"][1]["price"], 199.5);
    store.tear_down().await;
}

#[actix_web::test]
async fn fetch_one_product() {
    let store = TestStore::new().await;
    let app = test::init_service(App::new().configure(store.configure())).await;
    let req = TestRequest::get().uri(&format!("/api/products/{}", store.cap.id)).to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Urban Cap");
    assert_eq!(body["product"]["category"], "Accessories");
    store.tear_down().await;
}

#[actix_web::test]
async fn unknown_products_are_not_found() {
    let mut catalog = MockCatalogManager::new();
    catalog.expect_fetch_product().returning(|_| Ok(None));
    let app = test::init_service(App::new().configure(configure_app(catalog))).await;
    let req = TestRequest::get().uri("/api/products/404").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "Product 404 does not exist", "error": "NotFound"}));
}

#[actix_web::test]
async fn malformed_product_ids() {
    let store = TestStore::new().await;
    let app = test::init_service(App::new().configure(store.configure())).await;
    let req = TestRequest::get().uri("/api/products/not-a-number").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidArgument");
    store.tear_down().await;
}

#[actix_web::test]
async fn database_errors_are_hidden() {
    let mut catalog = MockCatalogManager::new();
    catalog.expect_fetch_products().returning(|| Err(CatalogError::DatabaseError("pool timed out".into())));
    let app = test::init_service(App::new().configure(configure_app(catalog))).await;
    let req = TestRequest::get().uri("/api/products").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "message": "Internal server error", "error": "Internal"}));
}

#[actix_web::test]
async fn seeding_needs_an_admin() {
    let store = TestStore::new().await;
    let app = test::init_service(App::new().configure(store.configure())).await;
    let (_, token) = store.user("asha@example.com").await;

    let req = TestRequest::post().uri("/api/seed").to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post().uri("/api/seed").insert_header(bearer(&token)).to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied. Admin privileges required.");

    let req = TestRequest::post().uri("/api/seed").insert_header(bearer(&store.admin_token())).to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let count = body["count"].as_u64().unwrap();
    assert!(count > 2);
    assert_eq!(body["message"], format!("Seeded {count} products"));

    // The seed replaces the catalog
    let req = TestRequest::get().uri("/api/products").to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["count"].as_u64(), Some(count));
    assert!(body["products"].as_array().unwrap().iter().all(|p| p["price"] != 199.5));
    store.tear_down().await;
}

#[actix_web::test]
async fn health_check() {
    let store = TestStore::new().await;
    let app = test::init_service(App::new().configure(store.configure())).await;
    let req = TestRequest::get().uri("/health").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    store.tear_down().await;
}
