//! Registration and credential checks.
//!
//! Token issuance is not the engine's concern; the server mints tokens for the [`User`] records returned here.
use std::fmt::Debug;

use log::*;
use serde::Deserialize;

use crate::{
    db_types::{NewUser, User},
    hood_api::errors::AuthApiError,
    traits::UserManagement,
};

pub const PASSWORD_HASH_COST: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
}

pub struct AuthApi<B> {
    db: B,
    hash_cost: u32,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    pub fn new(db: B) -> Self {
        Self { db, hash_cost: PASSWORD_HASH_COST }
    }

    /// Overrides the bcrypt cost factor. Only useful for speeding up tests.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Creates a new user. The email is normalised to lower case and must be unique.
    pub async fn register(&self, request: RegisterUser) -> Result<User, AuthApiError> {
        let name = request.name.trim().to_string();
        let email = request.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(AuthApiError::MissingFields);
        }
        if !is_plausible_email(&email) {
            return Err(AuthApiError::InvalidEmail(email));
        }
        if self.db.fetch_user_by_email(&email).await?.is_some() {
            debug!("🔐️ Registration refused for {email}: user already exists");
            return Err(AuthApiError::UserAlreadyExists);
        }
        let password_hash = hash_password(request.password, self.hash_cost).await?;
        let phone = request.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        let user = NewUser { name, email, password_hash, phone, is_admin: false };
        let user = self.db.create_user(user).await?;
        info!("🔐️ New user #{} registered", user.id);
        Ok(user)
    }

    /// Checks the email and password. Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthApiError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AuthApiError::InvalidCredentials);
        }
        let user = self.db.fetch_user_by_email(&email).await?;
        let Some(user) = user else {
            debug!("🔐️ Login attempt for unknown email");
            return Err(AuthApiError::InvalidCredentials);
        };
        if verify_password(password.to_string(), user.password_hash.clone()).await? {
            debug!("🔐️ User #{} logged in", user.id);
            Ok(user)
        } else {
            debug!("🔐️ Wrong password for user #{}", user.id);
            Err(AuthApiError::InvalidCredentials)
        }
    }

    pub async fn user_by_id(&self, id: i64) -> Result<User, AuthApiError> {
        self.db.fetch_user_by_id(id).await?.ok_or(AuthApiError::UserNotFound(id))
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

// bcrypt takes tens of milliseconds per call, so both helpers run on the blocking pool.
async fn hash_password(password: String, cost: u32) -> Result<String, AuthApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))
}
