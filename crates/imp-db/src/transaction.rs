//! # Order Transaction
//!
//! The unit of work a single order placement runs in.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.begin_order_transaction()        BEGIN IMMEDIATE (write lock held)  │
//! │       │                                                                 │
//! │       ├── get_product / load_products    catalog snapshot               │
//! │       ├── find_discount_code             read-only                      │
//! │       ├── has_prior_order                read-only                      │
//! │       ├── next_order_sequence            atomic counter upsert          │
//! │       ├── insert_order / insert_item                                    │
//! │       ├── decrement_stock                compare-and-decrement          │
//! │       ├── insert_vat_record                                             │
//! │       │                                                                 │
//! │       ├── commit()   → everything becomes visible at once               │
//! │       └── rollback() / drop → nothing happened                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A statement that fails on a constraint only undoes itself; the
//! transaction stays open and the caller decides whether to carry on
//! (e.g. retry an order number) or give up.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{catalog, counter, discount, order, stock, vat};
use imp_core::{CustomerIdentity, DiscountCode, Order, OrderItem, ProductSnapshot, VatRecord};

/// An open write transaction for placing one order.
#[derive(Debug)]
pub struct OrderTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl OrderTransaction {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        OrderTransaction { tx }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Reads one product snapshot.
    pub async fn get_product(&mut self, product_id: &str) -> DbResult<Option<ProductSnapshot>> {
        catalog::fetch_snapshot(&mut *self.tx, product_id).await
    }

    /// Reads snapshots for a set of products, keyed by ID.
    /// Unknown IDs are simply absent from the map.
    pub async fn load_products<'a>(
        &mut self,
        product_ids: impl IntoIterator<Item = &'a str>,
    ) -> DbResult<HashMap<String, ProductSnapshot>> {
        let mut products = HashMap::new();
        for id in product_ids {
            if products.contains_key(id) {
                continue;
            }
            if let Some(snapshot) = self.get_product(id).await? {
                products.insert(snapshot.id.clone(), snapshot);
            }
        }
        debug!(count = products.len(), "Loaded product snapshots");
        Ok(products)
    }

    /// Looks up a discount code (case-insensitive), whatever its status.
    pub async fn find_discount_code(&mut self, code: &str) -> DbResult<Option<DiscountCode>> {
        discount::fetch_by_code(&mut *self.tx, code).await
    }

    /// Whether the customer already has an order.
    pub async fn has_prior_order(&mut self, identity: &CustomerIdentity) -> DbResult<bool> {
        order::prior_order_exists(&mut *self.tx, identity).await
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Claims the next sequence value in an order number scope.
    pub async fn next_order_sequence(&mut self, scope: &str, now: DateTime<Utc>) -> DbResult<i64> {
        let seq = counter::next_sequence(&mut *self.tx, scope, now).await?;
        debug!(scope = %scope, seq, "Claimed order sequence");
        Ok(seq)
    }

    /// Inserts the order header.
    ///
    /// Fails with `UniqueViolation { field: "orders.order_number", .. }` when
    /// the number is already taken.
    pub async fn insert_order(&mut self, order: &Order) -> DbResult<()> {
        order::insert_order(&mut *self.tx, order).await
    }

    /// Inserts one order line.
    pub async fn insert_item(&mut self, item: &OrderItem) -> DbResult<()> {
        order::insert_item(&mut *self.tx, item).await
    }

    /// Takes stock if enough remains right now. `false` means it did not.
    pub async fn decrement_stock(
        &mut self,
        product_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let taken = stock::decrement(&mut *self.tx, product_id, quantity, now).await?;
        debug!(product_id = %product_id, quantity, taken, "Stock decrement");
        Ok(taken)
    }

    /// Inserts the order's VAT record.
    pub async fn insert_vat_record(&mut self, record: &VatRecord) -> DbResult<()> {
        vat::insert(&mut *self.tx, record).await
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Commits every write made through this transaction.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        debug!("Order transaction committed");
        Ok(())
    }

    /// Discards every write made through this transaction.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        debug!("Order transaction rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
