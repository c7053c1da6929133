use chrono::Utc;
use sqlx::{types::Json, FromRow, SqliteConnection};

use crate::db_types::{CartLine, Paise, ProductSnapshot};

#[derive(FromRow)]
struct CartLineRow {
    product_id: i64,
    quantity: i64,
    size: String,
    p_id: Option<i64>,
    p_name: Option<String>,
    p_price: Option<Paise>,
    p_images: Option<Json<Vec<String>>>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        let product = match (row.p_id, row.p_name, row.p_price) {
            (Some(id), Some(name), Some(price)) => {
                let images = row.p_images.map(|j| j.0).unwrap_or_default();
                Some(ProductSnapshot { id, name, price, images })
            },
            _ => None,
        };
        Self { product_id: row.product_id, quantity: row.quantity, size: row.size, product }
    }
}

pub async fn fetch_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let rows: Vec<CartLineRow> = sqlx::query_as(
        r#"
            SELECT
                c.product_id,
                c.quantity,
                c.size,
                p.id AS p_id,
                p.name AS p_name,
                p.price AS p_price,
                p.images AS p_images
            FROM cart_items c
            LEFT JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at ASC, c.product_id ASC, c.size ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(CartLine::from).collect())
}

/// Adds `quantity` to the `(product_id, size)` line, creating it if necessary. The increment happens inside the
/// database in a single statement.
///
/// The line is left untouched if the combined quantity would exceed `max_quantity`, in which case this returns
/// `false`.
pub async fn upsert_item(
    user_id: i64,
    product_id: i64,
    quantity: i64,
    size: &str,
    max_quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO cart_items (user_id, product_id, size, quantity, added_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id, size) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
            WHERE cart_items.quantity + excluded.quantity <= $6
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(size)
    .bind(quantity)
    .bind(Utc::now())
    .bind(max_quantity)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_item(
    user_id: i64,
    product_id: i64,
    size: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2 AND size = $3")
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}
