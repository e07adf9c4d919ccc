//! # Order Number Counters
//!
//! One row per `(prefix, category, date)` scope. The next sequence value is
//! claimed with a single upsert:
//!
//! ```text
//! INSERT INTO order_number_counters (scope, last_seq) VALUES (:scope, 1)
//! ON CONFLICT(scope) DO UPDATE SET last_seq = last_seq + 1
//! RETURNING last_seq
//! ```
//!
//! No read-then-write pair exists for two placements to race through. The
//! increment belongs to the surrounding transaction, so a rolled-back
//! placement gives its number back.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};

use crate::error::DbResult;

/// Read access to the counters, for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    /// Creates a new CounterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Last sequence value handed out in a scope.
    pub async fn current(&self, scope: &str) -> DbResult<Option<i64>> {
        let seq: Option<i64> =
            sqlx::query_scalar("SELECT last_seq FROM order_number_counters WHERE scope = ?1")
                .bind(scope)
                .fetch_optional(&self.pool)
                .await?;
        Ok(seq)
    }
}

/// Atomically advances a scope's counter and returns the new value.
pub(crate) async fn next_sequence(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    scope: &str,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO order_number_counters (scope, last_seq, updated_at)
        VALUES (?1, 1, ?2)
        ON CONFLICT(scope) DO UPDATE SET
            last_seq = last_seq + 1,
            updated_at = excluded.updated_at
        RETURNING last_seq
        "#,
    )
    .bind(scope)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(seq)
}
