//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a few lines MUST push their logic into the engine APIs. Keep this module neat and tidy.
//!
//! Routes come in two flavours:
//! * Public routes (registration, login, the catalog, the gateway webhook and the health check) carry their full
//!   `/api/...` path and are registered on the app directly.
//! * Protected routes carry a path relative to the `/api` scope, which is wrapped in the JWT middleware. Routes that
//!   add `where requires [Role::Admin]` are additionally wrapped in the ACL middleware.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. All storage and gateway calls are async for this reason, and
//! password hashing runs on the blocking pool inside the engine.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use hood_engine::{
    db_types::{GatewayOrderId, Role},
    hood_api::{
        auth_api::RegisterUser,
        cart_objects::AddCartItem,
        order_objects::NewOrderRequest,
        payment_objects::{CheckoutRequest, PaymentVerification, RefundPaymentRequest},
    },
    traits::{
        CartManagement,
        CatalogManagement,
        PaymentGateway,
        PaymentGatewayDatabase,
        PaymentIntentQuery,
        UserManagement,
    },
    AuthApi,
    CartApi,
    CatalogApi,
    OrderLedgerApi,
    PaymentFlowApi,
    PaymentFlowError,
};
use log::*;
use serde_json::json;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{AuthResponse, LoginRequest, RemoveCartItemParams, SuccessResponse, UserProfile},
    errors::ServerError,
};

/// The header carrying the gateway's HMAC of the webhook body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:path),*]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/api/auth/register" impl UserManagement);
/// Route handler for user registration
///
/// Expects `{name, email, password, phone?}`. On success, responds with 201 and an access token, so that the client
/// is logged in straight away.
pub async fn register<B: UserManagement>(
    body: web::Json<RegisterUser>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let user = api.register(body.into_inner()).await?;
    let token = signer.issue_token(&user)?;
    Ok(HttpResponse::Created().json(AuthResponse::new("User registered successfully", token, &user)))
}

route!(login => Post "/api/auth/login" impl UserManagement);
/// Route handler for logging in with an email and password
///
/// Unknown emails and wrong passwords both give 401 "Invalid credentials".
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request");
    let LoginRequest { email, password } = body.into_inner();
    let user = api.login(&email, &password).await?;
    let token = signer.issue_token(&user)?;
    Ok(HttpResponse::Ok().json(AuthResponse::new("Login successful", token, &user)))
}

route!(my_profile => Get "/auth/me" impl UserManagement);
pub async fn my_profile<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for user #{}", claims.id);
    let user = api.user_by_id(claims.id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "user": UserProfile::from(&user) }))))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(products => Get "/api/products" impl CatalogManagement);
pub async fn products<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET products");
    let products = api.products().await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "count": products.len(), "products": products }))))
}

route!(product_by_id => Get "/api/products/{id}" impl CatalogManagement);
pub async fn product_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET product #{id}");
    let product = api.product(id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "product": product }))))
}

route!(seed_catalog => Post "/seed" impl CatalogManagement where requires [Role::Admin]);
/// Route handler for reseeding the catalog
///
/// Replaces every product with the built-in product list. Admins only.
pub async fn seed_catalog<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ User #{} is reseeding the catalog", claims.id);
    let products = api.seed_catalog().await?;
    let message = format!("Seeded {} products", products.len());
    let response = SuccessResponse::new(json!({ "count": products.len(), "products": products }));
    Ok(HttpResponse::Ok().json(response.with_message(message)))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(get_cart => Get "/cart" impl CartManagement);
pub async fn get_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for user #{}", claims.id);
    let cart = api.cart(claims.id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(cart)))
}

route!(add_to_cart => Post "/cart" impl CartManagement);
/// Route handler for adding to the cart
///
/// Expects `{productId, quantity?, size?}`. Adding a `(product, size)` pair that is already in the cart increases the
/// quantity of that line.
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<AddCartItem>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST cart item for user #{}", claims.id);
    let cart = api.add_item(claims.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(cart).with_message("Item added to cart")))
}

route!(remove_from_cart => Delete "/cart/{product_id}" impl CartManagement);
pub async fn remove_from_cart<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    query: web::Query<RemoveCartItemParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ DELETE cart item #{product_id} for user #{}", claims.id);
    let cart = api.remove_item(claims.id, product_id, query.size.as_deref()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(cart).with_message("Item removed from cart")))
}

route!(clear_cart => Delete "/cart" impl CartManagement);
pub async fn clear_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE cart for user #{}", claims.id);
    let cart = api.clear(claims.id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(cart).with_message("Cart cleared")))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_order => Post "/payment/create-order" impl PaymentGatewayDatabase, PaymentGateway);
/// Route handler for starting a checkout
///
/// Expects `{amount, currency?, cartItems?, shippingAddress?}` with the amount in rupees. When `cartItems` is empty,
/// the user's cart is checked out. Responds with the gateway order and the public key the client needs to open the
/// gateway's checkout form.
pub async fn create_order<B, G>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST create-order for user #{}", claims.id);
    let order = api.create_checkout(claims.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(order).with_message("Order created successfully")))
}

route!(verify_payment => Post "/payment/verify-payment" impl PaymentGatewayDatabase, PaymentGateway);
/// Route handler for the client's report of a completed checkout
///
/// The signature the gateway gave the client is checked against `HMAC_SHA256(key_secret, "order_id|payment_id")`. A
/// valid signature settles the payment, writes the order and clears the cart. Anything else is a 400.
pub async fn verify_payment<B, G>(
    claims: JwtClaims,
    body: web::Json<PaymentVerification>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    debug!("💻️ POST verify-payment for user #{}", claims.id);
    let outcome = api.verify_payment(claims.id, body.into_inner()).await?;
    if !outcome.is_success() {
        return Err(ServerError::PaymentVerificationFailed);
    }
    Ok(HttpResponse::Ok().json(
        SuccessResponse::new(json!({ "order": outcome.order, "payment": outcome.payment }))
            .with_message("Payment verified successfully"),
    ))
}

route!(payment_webhook => Post "/api/payment/webhook" impl PaymentGatewayDatabase, PaymentGateway);
/// Route handler for gateway webhooks
///
/// The body is authenticated with the webhook secret before anything else happens, so it is read as raw bytes. Only
/// signature failures are rejected. Every other outcome is acknowledged so that the gateway does not keep retrying
/// deliveries that will never succeed.
pub async fn payment_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let signature = req.headers().get(WEBHOOK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    match api.handle_webhook(&body, signature).await {
        Ok(outcome) => debug!("🪝️ Webhook processed: {outcome:?}"),
        Err(e @ PaymentFlowError::InvalidWebhookSignature) => return Err(e.into()),
        Err(e) => error!("🪝️ Could not process webhook. {e}. Acknowledging it anyway."),
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

route!(payment_details => Get "/payment/details/{payment_id}" impl PaymentGatewayDatabase, PaymentGateway);
pub async fn payment_details<B, G>(
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let payment_id = path.into_inner();
    debug!("💻️ GET payment details for {payment_id}");
    let payment = api.payment_details(&payment_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "payment": payment }))))
}

route!(gateway_order => Get "/payment/order/{order_id}" impl PaymentGatewayDatabase, PaymentGateway);
pub async fn gateway_order<B, G>(
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let order_id = GatewayOrderId::from(path.into_inner());
    debug!("💻️ GET gateway order {order_id}");
    let details = api.gateway_order_details(&order_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(details)))
}

route!(refund_payment => Post "/payment/refund" impl PaymentGatewayDatabase, PaymentGateway where requires [Role::Admin]);
/// Route handler for refunds
///
/// Expects `{paymentId, amount?, reason?}`, with the amount in rupees. Without an amount, the whole payment is
/// refunded. Admins only.
pub async fn refund_payment<B, G>(
    claims: JwtClaims,
    body: web::Json<RefundPaymentRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    info!("💻️ User #{} requested a refund for payment {}", claims.id, request.payment_id);
    let refund = api.refund_payment(request).await?;
    Ok(HttpResponse::Ok()
        .json(SuccessResponse::new(json!({ "refund": refund })).with_message("Refund processed successfully")))
}

route!(all_payments => Get "/payment/all" impl PaymentGatewayDatabase, PaymentGateway where requires [Role::Admin]);
pub async fn all_payments<B, G>(
    query: web::Query<PaymentIntentQuery>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    let query = query.into_inner();
    debug!("💻️ GET all payments with {query:?}");
    let payments = api.payments(query).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "count": payments.len(), "payments": payments }))))
}

route!(payment_stats => Get "/payment/stats" impl PaymentGatewayDatabase, PaymentGateway where requires [Role::Admin]);
pub async fn payment_stats<B, G>(api: web::Data<PaymentFlowApi<B, G>>) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    debug!("💻️ GET payment stats");
    let stats = api.stats().await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "stats": stats }))))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(record_order => Post "/orders" impl PaymentGatewayDatabase);
/// Route handler for recording an order against a verified payment
///
/// Verification already writes the order, so this normally returns the existing order (200) with the shipping
/// address attached. It only creates one (201) if the order is somehow missing. Either way the cart is emptied.
pub async fn record_order<B: PaymentGatewayDatabase>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderLedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST order for user #{}", claims.id);
    let (order, inserted) = api.record_order(claims.id, body.into_inner()).await?;
    let response = SuccessResponse::new(json!({ "order": order }));
    if inserted {
        Ok(HttpResponse::Created().json(response.with_message("Order created successfully")))
    } else {
        Ok(HttpResponse::Ok().json(response.with_message("Order already recorded")))
    }
}

route!(my_orders => Get "/orders" impl PaymentGatewayDatabase);
pub async fn my_orders<B: PaymentGatewayDatabase>(
    claims: JwtClaims,
    api: web::Data<OrderLedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user #{}", claims.id);
    let orders = api.orders_for_user(claims.id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(json!({ "count": orders.len(), "orders": orders }))))
}
