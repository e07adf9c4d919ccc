//! # VAT Record Repository
//!
//! One record per order, enforced by `UNIQUE (order_id)`.

use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use imp_core::VatRecord;

/// Repository for VAT record operations.
#[derive(Debug, Clone)]
pub struct VatRepository {
    pool: SqlitePool,
}

impl VatRepository {
    /// Creates a new VatRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VatRepository { pool }
    }

    /// Gets the VAT record for an order.
    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Option<VatRecord>> {
        fetch_by_order(&self.pool, order_id).await
    }

    /// Counts VAT records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vat_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Σ(vat_cents) across all records.
    pub async fn total_vat(&self) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(vat_cents), 0) FROM vat_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

pub(crate) async fn fetch_by_order(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order_id: &str,
) -> DbResult<Option<VatRecord>> {
    let record = sqlx::query_as::<_, VatRecord>(
        r#"
        SELECT id, order_id, order_number, vat_rate_bps, vat_cents,
               subtotal_cents, total_cents, created_at
        FROM vat_records
        WHERE order_id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

pub(crate) async fn insert(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    record: &VatRecord,
) -> DbResult<()> {
    debug!(order_id = %record.order_id, vat_cents = record.vat_cents, "Inserting VAT record");

    sqlx::query(
        r#"
        INSERT INTO vat_records (
            id, order_id, order_number, vat_rate_bps, vat_cents,
            subtotal_cents, total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&record.id)
    .bind(&record.order_id)
    .bind(&record.order_number)
    .bind(record.vat_rate_bps)
    .bind(record.vat_cents)
    .bind(record.subtotal_cents)
    .bind(record.total_cents)
    .bind(record.created_at)
    .execute(conn)
    .await?;

    Ok(())
}
