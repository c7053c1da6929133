//! Razorpay REST client.
//!
//! Only the handful of endpoints the store needs are covered: creating and fetching orders, fetching payments, and
//! issuing refunds. All amounts on the wire are integers in the smallest currency unit (paise for INR).
mod api;
mod config;
mod data_objects;
mod error;

pub mod helpers;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{
    Collection,
    NewRazorpayOrder,
    NewRazorpayRefund,
    RazorpayOrder,
    RazorpayPayment,
    RazorpayRefund,
};
pub use error::RazorpayApiError;
