//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Every statement is stepped to completion before its function returns. Single-row lookups and `RETURNING` writes
//! use `fetch_all` rather than `fetch_optional`/`fetch_one`: a SQLite statement that is left mid-way keeps its
//! implicit transaction open on the pooled connection, which hides committed writes from it and holds back its own
//! autocommit writes from every other connection.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod carts;
pub mod orders;
pub mod payment_intents;
pub mod products;
pub mod refunds;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/hood_store.db";

pub fn db_url() -> String {
    let result = env::var("HOOD_DATABASE_URL").unwrap_or_else(|_| {
        info!("HOOD_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// The first row of a fully-read result set, or [`SqlxError::RowNotFound`].
pub(crate) fn first_row<T>(rows: Vec<T>) -> Result<T, SqlxError> {
    rows.into_iter().next().ok_or(SqlxError::RowNotFound)
}

/// True if the error is a violation of a UNIQUE (or primary key) constraint.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    match e {
        SqlxError::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
