use std::fmt::Display;

use hood_engine::db_types::User;
use serde::{Deserialize, Serialize};

/// A successful response. The fields of `data` are flattened into the top-level object next to `success`.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, message: None, data }
    }

    pub fn with_message<S: Display>(mut self, message: S) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// The public view of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

impl AuthResponse {
    pub fn new<S: Display>(message: S, token: String, user: &User) -> Self {
        Self { success: true, message: message.to_string(), token, user: UserProfile::from(user) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoveCartItemParams {
    pub size: Option<String>,
}
