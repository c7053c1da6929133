use chrono::Utc;
use log::trace;
use sqlx::{types::Json, SqliteConnection};

use super::first_row;
use crate::db_types::{NewProduct, Product};

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products ORDER BY id ASC").fetch_all(conn).await
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_all(conn).await?;
    Ok(rows.into_iter().next())
}

/// Inserts a product. The caller should have validated the product already; the table's CHECK constraints are the
/// last line of enforcement for the price and stock invariants.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let now = Utc::now();
    let rows: Vec<Product> = sqlx::query_as(
        r#"
            INSERT INTO products (name, price, category, images, badge, description, stock, sizes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.price)
    .bind(product.category)
    .bind(Json(product.images))
    .bind(product.badge)
    .bind(product.description)
    .bind(product.stock)
    .bind(Json(product.sizes))
    .bind(now)
    .fetch_all(conn)
    .await?;
    let product = first_row(rows)?;
    trace!("🗃️ Product #{} ({}) inserted", product.id, product.name);
    Ok(product)
}

pub async fn delete_all_products(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products").execute(conn).await?;
    Ok(result.rows_affected())
}
