//! End-to-end tests of the engine APIs against a throwaway SQLite database and the scripted gateway.
use hood_common::Secret;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{Category, NewProduct, Paise, Product, ShippingAddress},
    events::EventProducers,
    helpers::PaymentSignatures,
    test_utils::{
        prepare_env::{create_test_user, prepare_test_env, random_db_path},
        ScriptedGateway,
    },
    traits::CatalogManagement,
    PaymentFlowApi,
    SqliteDatabase,
};

mod cart;
mod order_ledger;
mod payment_flow;

pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";

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
        let tee = db
            .insert_product(
                NewProduct::new("NINEHOOD BASIC TEE", Paise::from(25_000), Category::Men)
                    .with_sizes(["S", "M", "L"])
                    .with_stock(10),
            )
            .await
            .expect("Error inserting tee");
        let cap = db
            .insert_product(NewProduct::new("Urban Cap", Paise::from(19_950), Category::Accessories).with_stock(5))
            .await
            .expect("Error inserting cap");
        Self { url, db, gateway: ScriptedGateway::new(), tee, cap }
    }

    pub async fn user(&self, email: &str) -> i64 {
        create_test_user(&self.db, email).await
    }

    pub fn signatures() -> PaymentSignatures {
        PaymentSignatures::new(Secret::new(KEY_SECRET.to_string()), Secret::new(WEBHOOK_SECRET.to_string()))
    }

    pub fn payments(&self) -> PaymentFlowApi<SqliteDatabase, ScriptedGateway> {
        self.payments_with_producers(EventProducers::default())
    }

    pub fn payments_with_producers(
        &self,
        producers: EventProducers,
    ) -> PaymentFlowApi<SqliteDatabase, ScriptedGateway> {
        self.payments_signed_with(Self::signatures(), producers)
    }

    pub fn payments_signed_with(
        &self,
        signatures: PaymentSignatures,
        producers: EventProducers,
    ) -> PaymentFlowApi<SqliteDatabase, ScriptedGateway> {
        PaymentFlowApi::new(self.db.clone(), self.gateway.clone(), signatures, "rzp_test_key".to_string(), producers)
    }

    pub async fn tear_down(mut self) {
        let _ = self.db.close().await;
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            log::warn!("Error dropping test database {}: {e}", self.url);
        }
    }
}

pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        phone: "9876543210".into(),
        address_line1: "12 MG Road".into(),
        address_line2: None,
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        postal_code: "560001".into(),
        country: "India".into(),
    }
}
