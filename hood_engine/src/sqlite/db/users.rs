use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use super::{first_row, is_unique_violation};
use crate::{
    db_types::{NewUser, User},
    traits::UserManagementError,
};

/// Inserts a new user. A duplicate email is reported as [`UserManagementError::UserAlreadyExists`] straight from the
/// unique index, so two concurrent registrations cannot both succeed.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserManagementError> {
    let now = Utc::now();
    let email = user.email.clone();
    let result = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (name, email, password_hash, phone, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.phone)
    .bind(user.is_admin)
    .bind(now)
    .fetch_all(conn)
    .await
    .and_then(first_row);
    match result {
        Ok(user) => {
            debug!("🗃️ User #{} created for {}", user.id, user.email);
            Ok(user)
        },
        Err(e) if is_unique_violation(&e) => Err(UserManagementError::UserAlreadyExists(email)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_all(conn).await?;
    Ok(rows.into_iter().next())
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_all(conn).await?;
    Ok(rows.into_iter().next())
}
