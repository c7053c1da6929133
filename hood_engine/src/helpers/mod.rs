mod catalog_seed;
mod signatures;

pub use catalog_seed::default_catalog;
pub use signatures::{hmac_sha256_hex, PaymentSignatures, SignatureError};
