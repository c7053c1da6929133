use std::{future::Future, path::Path, pin::Pin, time::Duration};

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use hood_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderPaidEvent, PaymentFailedEvent},
    helpers::PaymentSignatures,
    AuthApi,
    CartApi,
    CatalogApi,
    OrderLedgerApi,
    PaymentFlowApi,
    PaymentGateway,
    PaymentGatewayDatabase,
    SqliteDatabase,
    UserManagement,
};
use log::*;
use razorpay_tools::RazorpayApi;

use crate::{
    auth::TokenIssuer,
    config::{AuthConfig, ServerConfig},
    errors::ServerError,
    integrations::razorpay::RazorpayGateway,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AddToCartRoute,
        AllPaymentsRoute,
        ClearCartRoute,
        CreateOrderRoute,
        GatewayOrderRoute,
        GetCartRoute,
        LoginRoute,
        MyOrdersRoute,
        MyProfileRoute,
        PaymentDetailsRoute,
        PaymentStatsRoute,
        PaymentWebhookRoute,
        ProductByIdRoute,
        ProductsRoute,
        RecordOrderRoute,
        RefundPaymentRoute,
        RegisterRoute,
        RemoveFromCartRoute,
        SeedCatalogRoute,
        VerifyPaymentRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;
const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = prepare_database(&config).await?;
    if !config.razorpay.has_credentials() {
        warn!("🪛️ Razorpay credentials are incomplete. Checkout and webhooks will not work.");
    }
    let api = RazorpayApi::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = RazorpayGateway::new(api);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Opens (creating if necessary) the database, brings the schema up to date, and seeds an empty catalog if
/// configured to.
pub async fn prepare_database(config: &ServerConfig) -> Result<SqliteDatabase, ServerError> {
    ensure_database_directory(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.seed_on_startup {
        let seeded = CatalogApi::new(db.clone())
            .seed_if_empty()
            .await
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🌱️ {seeded} products seeded at startup");
    }
    Ok(db)
}

fn ensure_database_directory(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev: OrderPaidEvent| {
        Box::pin(async move {
            info!(
                "📬️ Order #{} for user #{} is paid ({}, payment {})",
                ev.order.id, ev.order.user_id, ev.order.total_amount, ev.intent.gateway_order_id
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_payment_failed(|ev: PaymentFailedEvent| {
        Box::pin(async move {
            warn!(
                "📬️ Payment {} for user #{} failed: {}",
                ev.intent.gateway_order_id,
                ev.intent.user_id,
                ev.reason()
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}

/// Maps extractor failures (bad JSON, query strings or path segments) onto the standard error envelope.
pub fn configure_extractors(cfg: &mut ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request body. {err}");
        ServerError::InvalidArgument(format!("Invalid request body. {err}")).into()
    });
    let query = web::QueryConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected query string. {err}");
        ServerError::InvalidArgument(format!("Invalid query. {err}")).into()
    });
    let path = web::PathConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request path. {err}");
        ServerError::InvalidArgument(format!("Invalid path. {err}")).into()
    });
    cfg.app_data(json).app_data(query).app_data(path);
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let signatures =
        PaymentSignatures::new(config.razorpay.key_secret.clone(), config.razorpay.webhook_secret.clone());
    let public_key = gateway.key_id().to_string();
    let auth_config = config.auth.clone();
    let srv = HttpServer::new(move || {
        let store = StoreServices {
            db: db.clone(),
            gateway: gateway.clone(),
            signatures: signatures.clone(),
            public_key: public_key.clone(),
            producers: producers.clone(),
            auth: auth_config.clone(),
        };
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("hood::access_log"))
            .configure(|cfg| configure_store(cfg, store))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Everything the routes need, for a store kept in `B` that takes payments through `G`.
pub struct StoreServices<B, G> {
    pub db: B,
    pub gateway: G,
    pub signatures: PaymentSignatures,
    pub public_key: String,
    pub producers: EventProducers,
    pub auth: AuthConfig,
}

/// Registers the shared API state and every route of the store.
pub fn configure_store<B, G>(cfg: &mut ServiceConfig, store: StoreServices<B, G>)
where
    B: UserManagement + PaymentGatewayDatabase + 'static,
    G: PaymentGateway + 'static,
{
    let StoreServices { db, gateway, signatures, public_key, producers, auth } = store;
    let jwt_signer = TokenIssuer::new(&auth);
    configure_extractors(cfg);
    cfg.app_data(web::Data::new(AuthApi::new(db.clone())))
        .app_data(web::Data::new(CatalogApi::new(db.clone())))
        .app_data(web::Data::new(CartApi::new(db.clone())))
        .app_data(web::Data::new(OrderLedgerApi::new(db.clone())))
        .app_data(web::Data::new(PaymentFlowApi::new(db, gateway, signatures, public_key, producers)))
        .app_data(web::Data::new(jwt_signer.clone()));
    // Public routes carry full paths and are registered ahead of the scope so that they match first
    cfg.service(health)
        .service(RegisterRoute::<B>::new())
        .service(LoginRoute::<B>::new())
        .service(ProductsRoute::<B>::new())
        .service(ProductByIdRoute::<B>::new())
        .service(PaymentWebhookRoute::<B, G>::new());
    // Routes that require authentication
    cfg.service(
        web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(jwt_signer))
            .service(MyProfileRoute::<B>::new())
            .service(GetCartRoute::<B>::new())
            .service(AddToCartRoute::<B>::new())
            .service(RemoveFromCartRoute::<B>::new())
            .service(ClearCartRoute::<B>::new())
            .service(CreateOrderRoute::<B, G>::new())
            .service(VerifyPaymentRoute::<B, G>::new())
            .service(PaymentDetailsRoute::<B, G>::new())
            .service(GatewayOrderRoute::<B, G>::new())
            .service(RefundPaymentRoute::<B, G>::new())
            .service(AllPaymentsRoute::<B, G>::new())
            .service(PaymentStatsRoute::<B, G>::new())
            .service(RecordOrderRoute::<B>::new())
            .service(MyOrdersRoute::<B>::new())
            .service(SeedCatalogRoute::<B>::new()),
    );
}
