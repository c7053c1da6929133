use actix_http::Request;
use actix_web::{
    body::{self, MessageBody},
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    web::ServiceConfig,
};
use chrono::{Duration, Utc};
use hood_common::Secret;
use hood_engine::{
    db_types::{Category, NewProduct, Paise, Product, Role},
    events::EventProducers,
    helpers::PaymentSignatures,
    test_utils::{
        prepare_env::{create_test_user, prepare_test_env, random_db_path},
        ScriptedGateway,
    },
    CatalogApi,
    SqliteDatabase,
};
use log::*;
use serde_json::Value;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
    server::{configure_store, StoreServices},
};

pub const KEY_SECRET: &str = "endpoint_key_secret";
pub const WEBHOOK_SECRET: &str = "endpoint_webhook_secret";
pub const PUBLIC_KEY: &str = "rzp_test_endpoint";

// A fixed secret so that tests can mint their own tokens. DO NOT re-use it anywhere.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-tests-only-jwt-secret", Duration::days(7))
}

pub fn token_for(user_id: i64, email: &str, roles: &[Role]) -> String {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        id: user_id,
        email: email.to_string(),
        name: "Test User".to_string(),
        roles: roles.to_vec(),
        iat: now,
        exp: now + 3600,
    };
    TokenIssuer::new(&test_auth_config()).sign(&claims).expect("Failed to sign token")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn signatures() -> PaymentSignatures {
    PaymentSignatures::new(Secret::new(KEY_SECRET.to_string()), Secret::new(WEBHOOK_SECRET.to_string()))
}

/// Sends the request and returns the status and JSON body. Errors raised by middleware are rendered the way the
/// server would render them.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, bytes) = match test::try_call_service(app, req).await {
        Ok(res) => {
            let status = res.status();
            (status, test::read_body(res).await)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            (status, body::to_bytes(res.into_body()).await.unwrap_or_default())
        },
    };
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    debug!("Response: {status} {body}");
    (status, body)
}

/// A complete store on a throwaway database, with the scripted gateway standing in for Razorpay.
pub struct TestStore {
    pub url: String,
    pub db: SqliteDatabase,
    pub gateway: ScriptedGateway,
    /// ₹250 tee, sizes S, M, L
    pub tee: Product,
    /// ₹199.50 cap, one size
    pub cap: Product,
}

impl TestStore {
    pub async fn new() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let catalog = CatalogApi::new(db.clone());
        let tee = catalog
            .add_product(
                NewProduct::new("NINEHOOD BASIC TEE", Paise::from(25_000), Category::Men)
                    .with_sizes(["S", "M", "L"])
                    .with_stock(10),
            )
            .await
            .expect("Error inserting tee");
        let cap = catalog
            .add_product(NewProduct::new("Urban Cap", Paise::from(19_950), Category::Accessories).with_stock(5))
            .await
            .expect("Error inserting cap");
        Self { url, db, gateway: ScriptedGateway::new(), tee, cap }
    }

    /// Creates a user and returns their id and an access token.
    pub async fn user(&self, email: &str) -> (i64, String) {
        let id = create_test_user(&self.db, email).await;
        (id, token_for(id, email, &[Role::User]))
    }

    pub fn admin_token(&self) -> String {
        token_for(9_999, "admin@hood.store", &[Role::User, Role::Admin])
    }

    pub fn configure(&self) -> impl FnOnce(&mut ServiceConfig) {
        let store = StoreServices {
            db: self.db.clone(),
            gateway: self.gateway.clone(),
            signatures: signatures(),
            public_key: PUBLIC_KEY.to_string(),
            producers: EventProducers::default(),
            auth: test_auth_config(),
        };
        move |cfg| configure_store(cfg, store)
    }

    pub async fn tear_down(mut self) {
        let _ = self.db.close().await;
        let path = self.url.trim_start_matches("sqlite://");
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Error removing test database {path}: {e}");
        }
    }
}
