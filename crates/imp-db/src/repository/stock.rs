//! # Stock Repository
//!
//! Physical stock levels.
//!
//! ## Conditional Decrement
//! ```text
//! UPDATE stock
//!    SET amount = amount - :qty, sold = sold + :qty
//!  WHERE product_id = :id AND amount >= :qty
//!
//!  rows_affected = 1 → taken
//!  rows_affected = 0 → not enough stock at write time (or no row)
//! ```
//! Check and write are one statement, so no other writer can slip in
//! between them. `CHECK (amount >= 0)` backs this up at the schema level.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use imp_core::StockLevel;

/// Repository for stock database operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets the stock level of a product, if it has a stock row.
    pub async fn get(&self, product_id: &str) -> DbResult<Option<StockLevel>> {
        let level = sqlx::query_as::<_, StockLevel>(
            "SELECT product_id, amount, sold, updated_at FROM stock WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }

    /// Sets the on-hand amount, creating the stock row if needed.
    /// `sold` is preserved.
    pub async fn set_level(&self, product_id: &str, amount: i64) -> DbResult<()> {
        debug!(product_id = %product_id, amount, "Setting stock level");

        sqlx::query(
            r#"
            INSERT INTO stock (product_id, amount, sold, updated_at)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT(product_id) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Σ(amount) and Σ(sold) across all stock rows.
    pub async fn totals(&self) -> DbResult<(i64, i64)> {
        let totals: (i64, i64) =
            sqlx::query_as("SELECT COALESCE(SUM(amount), 0), COALESCE(SUM(sold), 0) FROM stock")
                .fetch_one(&self.pool)
                .await?;
        Ok(totals)
    }
}

/// Takes `quantity` units if at least that many remain.
///
/// ## Returns
/// * `true` - stock decremented and `sold` incremented
/// * `false` - insufficient stock (nothing changed)
pub(crate) async fn decrement(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE stock
           SET amount = amount - ?2,
               sold = sold + ?2,
               updated_at = ?3
         WHERE product_id = ?1 AND amount >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
