use chrono::Utc;
use log::debug;
use sqlx::{types::Json, SqliteConnection};

use super::first_row;
use crate::db_types::{GatewayOrderId, Order, OrderPaymentStatus, PaymentIntent, ShippingAddress};

/// Writes the ledger order for `intent`, returning `false` in the second parameter if it already existed.
///
/// An existing order without a shipping address picks up `shipping_address` if one is given. Nothing else about an
/// existing order ever changes.
pub async fn idempotent_insert_for_intent(
    intent: &PaymentIntent,
    shipping_address: Option<ShippingAddress>,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), sqlx::Error> {
    match fetch_order_by_payment_order_id(&intent.gateway_order_id, conn).await? {
        Some(order) => match (&order.shipping_address, shipping_address) {
            (None, Some(address)) => {
                let order = set_shipping_address(order.id, address, conn).await?;
                debug!("🗃️ Shipping address recorded for order #{}", order.id);
                Ok((order, false))
            },
            _ => Ok((order, false)),
        },
        None => {
            let address = shipping_address.or_else(|| intent.shipping_address.as_ref().map(|a| a.0.clone()));
            let order = insert_order(intent, address, conn).await?;
            debug!("🗃️ Order #{} written for payment {}", order.id, intent.gateway_order_id);
            Ok((order, true))
        },
    }
}

/// Inserts a new order. This is not atomic. You can embed this call inside a transaction if you need to ensure
/// atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(
    intent: &PaymentIntent,
    shipping_address: Option<ShippingAddress>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                items,
                shipping_address,
                total_amount,
                payment_status,
                payment_order_id,
                payment_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(intent.user_id)
    .bind(&intent.items)
    .bind(shipping_address.map(Json))
    .bind(intent.amount)
    .bind(OrderPaymentStatus::Completed)
    .bind(intent.gateway_order_id.as_str())
    .bind(intent.payment_id.as_deref())
    .bind(now)
    .fetch_all(conn)
    .await
    .and_then(first_row)
}

async fn set_shipping_address(
    id: i64,
    address: ShippingAddress,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET shipping_address = $1, updated_at = $2 WHERE id = $3 AND shipping_address IS NULL RETURNING *",
    )
    .bind(Json(address))
    .bind(Utc::now())
    .bind(id)
    .fetch_all(conn)
    .await
    .and_then(first_row)
}

pub async fn fetch_order_by_payment_order_id(
    order_id: &GatewayOrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM orders WHERE payment_order_id = $1")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().next())
}

/// The user's orders, most recent first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await
}
