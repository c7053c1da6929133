use std::env;

use chrono::Duration;
use hood_common::{
    helpers::{env_parsed, parse_boolean_flag},
    Secret,
};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use razorpay_tools::RazorpayConfig;

use crate::errors::ServerError;

const DEFAULT_HOOD_HOST: &str = "127.0.0.1";
const DEFAULT_HOOD_PORT: u16 = 5000;
const DEFAULT_HOOD_DATABASE_URL: &str = "sqlite://data/hood_store.db";
const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 7;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the catalog is seeded with the built-in product list at startup when it is empty.
    pub seed_on_startup: bool,
    pub auth: AuthConfig,
    pub razorpay: RazorpayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOOD_HOST.to_string(),
            port: DEFAULT_HOOD_PORT,
            database_url: DEFAULT_HOOD_DATABASE_URL.to_string(),
            seed_on_startup: false,
            auth: AuthConfig::default(),
            razorpay: RazorpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("HOOD_HOST").ok().unwrap_or_else(|| DEFAULT_HOOD_HOST.into());
        let port = env::var("HOOD_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for HOOD_PORT. {e} Using the default, {DEFAULT_HOOD_PORT}, \
                         instead."
                    );
                    DEFAULT_HOOD_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_HOOD_PORT);
        let database_url = env::var("HOOD_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ HOOD_DATABASE_URL is not set. Using {DEFAULT_HOOD_DATABASE_URL}");
            DEFAULT_HOOD_DATABASE_URL.to_string()
        });
        let seed_on_startup = parse_boolean_flag(env::var("HOOD_SEED_ON_STARTUP").ok(), false);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let razorpay = RazorpayConfig::new_from_env_or_default();
        Self { host, port, database_url, seed_on_startup, auth, razorpay }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC key used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an access token stays valid after it is issued.
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since every token will be invalidated when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_expiry: Duration::days(DEFAULT_TOKEN_EXPIRY_DAYS) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_expiry: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_expiry }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("HOOD_JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ServerError::ConfigurationError("HOOD_JWT_SECRET is not set".into()))?;
        let days = env_parsed::<i64>("HOOD_JWT_EXPIRY_DAYS").filter(|d| *d > 0).unwrap_or_else(|| {
            info!("🪛️ HOOD_JWT_EXPIRY_DAYS is not set. Tokens expire after {DEFAULT_TOKEN_EXPIRY_DAYS} days.");
            DEFAULT_TOKEN_EXPIRY_DAYS
        });
        Ok(Self::new(secret, Duration::days(days)))
    }
}
