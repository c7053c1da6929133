use chrono::Utc;
use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use super::{first_row, is_unique_violation};
use crate::{
    db_types::{GatewayOrderId, NewPaymentIntent, Paise, PaymentIntent, PaymentStatus},
    traits::{PaymentGatewayError, PaymentIntentQuery, PaymentStats},
};

/// Inserts a new intent in the `created` state.
pub async fn insert_intent(
    intent: NewPaymentIntent,
    conn: &mut SqliteConnection,
) -> Result<PaymentIntent, PaymentGatewayError> {
    let now = Utc::now();
    let order_id = intent.gateway_order_id.clone();
    let result = sqlx::query_as::<_, PaymentIntent>(
        r#"
            INSERT INTO payment_intents (
                user_id,
                gateway_order_id,
                amount,
                currency,
                receipt,
                status,
                items,
                shipping_address,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(intent.user_id)
    .bind(intent.gateway_order_id)
    .bind(intent.amount)
    .bind(intent.currency)
    .bind(intent.receipt)
    .bind(PaymentStatus::Created)
    .bind(Json(intent.items))
    .bind(intent.shipping_address.map(Json))
    .bind(now)
    .fetch_all(conn)
    .await
    .and_then(first_row);
    match result {
        Ok(intent) => {
            debug!("🗃️ Payment intent #{} created for order {}", intent.id, intent.gateway_order_id);
            Ok(intent)
        },
        Err(e) if is_unique_violation(&e) => Err(PaymentGatewayError::IntentAlreadyExists(order_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_intent(
    order_id: &GatewayOrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM payment_intents WHERE gateway_order_id = $1")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().next())
}

/// Moves the intent to `success`. The update only applies while the intent is still `created`, so only one caller
/// can ever win the transition. Returns `true` if this call performed it.
pub async fn mark_success(
    order_id: &GatewayOrderId,
    payment_id: &str,
    signature: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            UPDATE payment_intents
            SET status = $1, payment_id = $2, signature = $3, verified_at = $4, updated_at = $4
            WHERE gateway_order_id = $5 AND status = $6
        "#,
    )
    .bind(PaymentStatus::Success)
    .bind(payment_id)
    .bind(signature)
    .bind(now)
    .bind(order_id.as_str())
    .bind(PaymentStatus::Created)
    .execute(conn)
    .await?;
    let changed = result.rows_affected() == 1;
    trace!("🗃️ Marking {order_id} as success. Changed: {changed}");
    Ok(changed)
}

/// Moves the intent to `failed`, under the same single-winner rule as [`mark_success`].
pub async fn mark_failed(
    order_id: &GatewayOrderId,
    payment_id: Option<&str>,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            UPDATE payment_intents
            SET status = $1, payment_id = COALESCE($2, payment_id), failure_reason = $3, verified_at = $4, updated_at = $4
            WHERE gateway_order_id = $5 AND status = $6
        "#,
    )
    .bind(PaymentStatus::Failed)
    .bind(payment_id)
    .bind(reason)
    .bind(now)
    .bind(order_id.as_str())
    .bind(PaymentStatus::Created)
    .execute(conn)
    .await?;
    let changed = result.rows_affected() == 1;
    trace!("🗃️ Marking {order_id} as failed ({reason}). Changed: {changed}");
    Ok(changed)
}

pub async fn fetch_intents(
    query: PaymentIntentQuery,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentIntent>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM payment_intents ");
    if query.status.is_some() || query.user_id.is_some() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<PaymentIntent>().fetch_all(conn).await
}

pub async fn payment_stats(conn: &mut SqliteConnection) -> Result<PaymentStats, sqlx::Error> {
    let rows: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
        r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'success' THEN amount ELSE 0 END), 0)
            FROM payment_intents
        "#,
    )
    .fetch_all(conn)
    .await?;
    let (total, successful, failed, revenue) = first_row(rows)?;
    Ok(PaymentStats::new(total, successful, failed, Paise::from(revenue)))
}
