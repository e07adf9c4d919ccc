//! # Order Repository
//!
//! Orders and their items. Rows are only ever written by
//! [`OrderTransaction`](crate::transaction::OrderTransaction); this
//! repository is the read side plus the insert statements it shares.
//!
//! ## Order Shape
//! ```text
//! orders (1) ──< order_items (N, line_no 1..N)
//!    │
//!    └── vat_records (exactly 1)
//! ```

use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use imp_core::{CustomerIdentity, Order, OrderItem, PlacedOrder, VatRecord};

const ORDER_COLUMNS: &str = r#"
    id, order_number, status, customer_id, email, customer_name,
    address_line1, address_line2, city, postcode, country,
    subtotal_cents, discount_cents, vat_cents, shipping_cents, total_cents,
    discount_code_id, discount_code, first_order, created_at
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Gets an order by its order number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Gets an order's items in cart order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, line_no, product_id, quantity,
                   unit_price_cents, line_total_cents, preorder, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Gets the VAT record written with an order.
    pub async fn get_vat_record(&self, order_id: &str) -> DbResult<Option<VatRecord>> {
        super::vat::fetch_by_order(&self.pool, order_id).await
    }

    /// Loads an order with its items and VAT record.
    pub async fn get_placed(&self, order_id: &str) -> DbResult<Option<PlacedOrder>> {
        let Some(order) = self.get_by_id(order_id).await? else {
            return Ok(None);
        };
        let items = self.get_items(order_id).await?;
        let Some(vat_record) = self.get_vat_record(order_id).await? else {
            return Ok(None);
        };
        Ok(Some(PlacedOrder {
            order,
            items,
            vat_record,
        }))
    }

    /// Order numbers in insertion order.
    pub async fn list_numbers(&self) -> DbResult<Vec<String>> {
        let numbers: Vec<String> =
            sqlx::query_scalar("SELECT order_number FROM orders ORDER BY created_at, order_number")
                .fetch_all(&self.pool)
                .await?;
        Ok(numbers)
    }

    /// Whether the customer has ordered before.
    pub async fn has_prior_order(&self, identity: &CustomerIdentity) -> DbResult<bool> {
        prior_order_exists(&self.pool, identity).await
    }

    /// Counts orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts order items across all orders.
    pub async fn count_items(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Statements shared with OrderTransaction
// =============================================================================

pub(crate) async fn prior_order_exists(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    identity: &CustomerIdentity,
) -> DbResult<bool> {
    let (sql, key) = match identity {
        CustomerIdentity::Account(id) => (
            "SELECT EXISTS(SELECT 1 FROM orders WHERE customer_id = ?1)",
            id,
        ),
        CustomerIdentity::Email(email) => (
            "SELECT EXISTS(SELECT 1 FROM orders WHERE email = ?1 COLLATE NOCASE)",
            email,
        ),
    };

    let exists: bool = sqlx::query_scalar(sql).bind(key).fetch_one(conn).await?;
    Ok(exists)
}

pub(crate) async fn insert_order(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    order: &Order,
) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, status, customer_id, email, customer_name,
            address_line1, address_line2, city, postcode, country,
            subtotal_cents, discount_cents, vat_cents, shipping_cents, total_cents,
            discount_code_id, discount_code, first_order, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(order.status)
    .bind(&order.customer_id)
    .bind(&order.email)
    .bind(&order.customer_name)
    .bind(&order.address_line1)
    .bind(&order.address_line2)
    .bind(&order.city)
    .bind(&order.postcode)
    .bind(&order.country)
    .bind(order.subtotal_cents)
    .bind(order.discount_cents)
    .bind(order.vat_cents)
    .bind(order.shipping_cents)
    .bind(order.total_cents)
    .bind(&order.discount_code_id)
    .bind(&order.discount_code)
    .bind(order.first_order)
    .bind(order.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    item: &OrderItem,
) -> DbResult<()> {
    debug!(order_id = %item.order_id, product_id = %item.product_id, line_no = item.line_no, "Inserting order item");

    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, line_no, product_id, quantity,
            unit_price_cents, line_total_cents, preorder, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(item.line_no)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .bind(item.preorder)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}
