use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewRefund, Refund};

/// Inserts the refund, returning `false` in the second parameter if a refund with the same id was already recorded.
///
/// The insert comes first so that, inside a transaction, the write lock is taken before anything is read.
pub async fn idempotent_insert(refund: NewRefund, conn: &mut SqliteConnection) -> Result<(Refund, bool), sqlx::Error> {
    let refund_id = refund.refund_id.clone();
    let rows: Vec<Refund> = sqlx::query_as(
        r#"
            INSERT INTO refunds (refund_id, payment_id, amount, status, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (refund_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(refund.refund_id)
    .bind(refund.payment_id)
    .bind(refund.amount)
    .bind(refund.status)
    .bind(refund.reason)
    .bind(Utc::now())
    .fetch_all(&mut *conn)
    .await?;
    match rows.into_iter().next() {
        Some(refund) => {
            debug!("🗃️ Refund {} of {} recorded against payment {}", refund.refund_id, refund.amount, refund.payment_id);
            Ok((refund, true))
        },
        None => {
            let existing = fetch_refund(&refund_id, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
            Ok((existing, false))
        },
    }
}

pub async fn fetch_refund(refund_id: &str, conn: &mut SqliteConnection) -> Result<Option<Refund>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM refunds WHERE refund_id = $1").bind(refund_id).fetch_all(conn).await?;
    Ok(rows.into_iter().next())
}
