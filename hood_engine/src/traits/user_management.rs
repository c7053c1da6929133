use thiserror::Error;

use crate::db_types::{NewUser, User};

/// Storage of user identities.
///
/// Email addresses are unique. Implementations must report a duplicate email as
/// [`UserManagementError::UserAlreadyExists`], including when two registrations race.
#[allow(async_fn_in_trait)]
pub trait UserManagement: Clone {
    async fn create_user(&self, user: NewUser) -> Result<User, UserManagementError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserManagementError>;

    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserManagementError>;
}

#[derive(Debug, Clone, Error)]
pub enum UserManagementError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A user with email {0} already exists")]
    UserAlreadyExists(String),
}

impl From<sqlx::Error> for UserManagementError {
    fn from(e: sqlx::Error) -> Self {
        UserManagementError::DatabaseError(e.to_string())
    }
}
