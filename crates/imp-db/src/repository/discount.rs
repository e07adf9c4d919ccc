//! # Discount Code Repository
//!
//! Codes are matched case-insensitively (`code` is `COLLATE NOCASE`) and are
//! never written to by checkout.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use imp_core::discount::{check_code, CodeLookup};
use imp_core::{DiscountCode, DiscountKind};

const SELECT_BY_CODE: &str = r#"
    SELECT id, code, kind, value, active, expires_at, created_at
    FROM discount_codes
    WHERE code = ?1
"#;

/// Repository for discount code operations.
#[derive(Debug, Clone)]
pub struct DiscountCodeRepository {
    pool: SqlitePool,
}

impl DiscountCodeRepository {
    /// Creates a new DiscountCodeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountCodeRepository { pool }
    }

    /// Inserts a discount code.
    pub async fn insert(&self, code: &DiscountCode) -> DbResult<()> {
        debug!(code = %code.code, kind = ?code.kind, value = code.value, "Inserting discount code");

        sqlx::query(
            r#"
            INSERT INTO discount_codes (id, code, kind, value, active, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&code.id)
        .bind(&code.code)
        .bind(code.kind)
        .bind(code.value)
        .bind(code.active)
        .bind(code.expires_at)
        .bind(code.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Builds and inserts a code with a fresh ID.
    pub async fn create(
        &self,
        code: &str,
        kind: DiscountKind,
        value: i64,
        active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> DbResult<DiscountCode> {
        let record = DiscountCode {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            kind,
            value,
            active,
            expires_at,
            created_at: Utc::now(),
        };
        self.insert(&record).await?;
        Ok(record)
    }

    /// Finds a code regardless of status.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<DiscountCode>> {
        fetch_by_code(&self.pool, code).await
    }

    /// Finds a code that is active and not expired at `now`.
    pub async fn find_active_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<DiscountCode>> {
        let found = self.find_by_code(code).await?;
        let active = match found.as_ref() {
            Some(record) => matches!(check_code(CodeLookup::Found(record), now), Some(Ok(_))),
            None => false,
        };
        Ok(found.filter(|_| active))
    }

    /// Deactivates a code. Existing orders keep their reference.
    pub async fn deactivate(&self, code: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE discount_codes SET active = 0 WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Case-insensitive code lookup usable inside a transaction.
pub(crate) async fn fetch_by_code(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    code: &str,
) -> DbResult<Option<DiscountCode>> {
    let record = sqlx::query_as::<_, DiscountCode>(SELECT_BY_CODE)
        .bind(code)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}
