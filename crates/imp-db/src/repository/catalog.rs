//! # Catalog Repository
//!
//! Categories and products. Checkout only ever reads a [`ProductSnapshot`];
//! inserts exist for seeding and tests.
//!
//! ## Snapshot Query
//! ```text
//! products ──LEFT JOIN── stock       (amount, NULL when no stock row)
//!          ──LEFT JOIN── categories  (name, NULL when uncategorised)
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use imp_core::ProductSnapshot;

const SNAPSHOT_SQL: &str = r#"
    SELECT
        p.id,
        p.price_cents,
        p.is_preorder,
        s.amount AS stock_amount,
        c.name   AS category_name
    FROM products p
    LEFT JOIN stock s      ON s.product_id = p.id
    LEFT JOIN categories c ON c.id = p.category_id
    WHERE p.id = ?1
"#;

/// Product to insert into the catalog.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<String>,
    pub price_cents: i64,
    pub is_preorder: bool,
}

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts a category and returns its ID.
    pub async fn insert_category(&self, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %name, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Inserts a product and returns its ID. No stock row is created.
    pub async fn insert_product(&self, product: &NewProduct) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, name = %product.name, preorder = product.is_preorder, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, category_id, price_cents, is_preorder, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(product.price_cents)
        .bind(product.is_preorder)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Reads the checkout view of a product.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<ProductSnapshot>> {
        fetch_snapshot(&self.pool, id).await
    }

    /// Updates a product's catalog price.
    pub async fn set_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        debug!(id = %id, price_cents, "Updating product price");

        sqlx::query("UPDATE products SET price_cents = ?2 WHERE id = ?1")
            .bind(id)
            .bind(price_cents)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Counts products in the catalog.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Snapshot lookup usable from the pool or from inside a transaction.
pub(crate) async fn fetch_snapshot(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    product_id: &str,
) -> DbResult<Option<ProductSnapshot>> {
    let snapshot = sqlx::query_as::<_, ProductSnapshot>(SNAPSHOT_SQL)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(snapshot)
}
