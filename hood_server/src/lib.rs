//! # Hood store server
//! This crate hosts the HTTP API of the Hood store. It is responsible for:
//! * Registering users and logging them in with email and password, issuing JWT access tokens.
//! * Serving the product catalog.
//! * Managing each user's cart.
//! * Running checkout against Razorpay: creating gateway orders, verifying the client's payment report and
//!   processing the gateway's webhooks.
//! * Recording and listing the orders that paid checkouts produce.
//!
//! All business rules live in `hood_engine`. Handlers here parse requests, call the engine, and render the
//! `{success, ...}` envelope.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Public:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/auth/register`, `/api/auth/login`: Account creation and login.
//! * `/api/products`, `/api/products/{id}`: The catalog.
//! * `/api/payment/webhook`: Razorpay webhooks, authenticated by the `X-Razorpay-Signature` header.
//!
//! Everything else under `/api` requires a bearer token. See [routes](routes/index.html).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
