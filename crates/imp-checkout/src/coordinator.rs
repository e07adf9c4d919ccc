//! # Order Placement Coordinator
//!
//! Runs one placement as a single all-or-nothing transaction, and re-runs it
//! when it lost a race.
//!
//! ## One Attempt
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN IMMEDIATE                                                        │
//! │    1. load product snapshots                                            │
//! │    2. validate lines (price, stock, preorder)      ──► Rejected         │
//! │    3. raw subtotal                                                      │
//! │    4. resolve discount (code, else first order)                         │
//! │    5. totals + VAT                                                      │
//! │    6. claim order number, insert header            ──► OrderNumberConflict
//! │    7. insert items                                                      │
//! │    8. compare-and-decrement stock (non-preorder)   ──► StockConflict    │
//! │    9. insert VAT record                                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any `?` between BEGIN and COMMIT drops the [`OrderTransaction`], which
//! rolls back every write including the counter claim. The attempt deadline
//! covers steps 1 to 9 only; a timed-out attempt is dropped the same way.
//! COMMIT runs after the deadline check, so a `TimedOut` caller never has a
//! committed order behind it.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};
use imp_core::discount::{resolve_discount, CodeLookup, DiscountResolution};
use imp_core::order_number::NumberScope;
use imp_core::stock::{self, ValidatedLine};
use imp_core::validation::validate_order_request;
use imp_core::vat::OrderTotals;
use imp_core::{Money, Order, OrderItem, OrderStatus, PlaceOrderRequest, PlacedOrder, VatRecord};
use imp_db::{Database, OrderTransaction};

const ORDER_NUMBER_FIELD: &str = "orders.order_number";

/// Places orders against one database.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Checkout {
    db: Database,
    config: CheckoutConfig,
}

impl Checkout {
    pub fn new(db: Database, config: CheckoutConfig) -> Self {
        Checkout { db, config }
    }

    /// Opens the configured database (running migrations) and wraps it.
    pub async fn from_config(config: CheckoutConfig) -> CheckoutResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;
        Ok(Checkout::new(db, config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Places an order now.
    pub async fn place_order(&self, request: &PlaceOrderRequest) -> CheckoutResult<PlacedOrder> {
        self.place_order_at(request, Utc::now()).await
    }

    /// Places an order as if at `now`, which dates the order number and
    /// decides discount code expiry.
    ///
    /// Retryable failures re-run the whole attempt with exponential backoff,
    /// up to `retry.max_attempts` attempts in total.
    #[instrument(skip_all, fields(lines = request.items.len(), email = %request.customer.email))]
    pub async fn place_order_at(
        &self,
        request: &PlaceOrderRequest,
        now: DateTime<Utc>,
    ) -> CheckoutResult<PlacedOrder> {
        validate_order_request(request)?;

        let max_attempts = self.config.retry.max_attempts;
        let timeout = self.config.transaction_timeout();
        let mut backoff = self.create_backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let err = match self.attempt(request, now, timeout).await {
                Ok(placed) => {
                    info!(
                        order_number = %placed.order.order_number,
                        total = %placed.order.total(),
                        attempt,
                        "Order placed"
                    );
                    return Ok(placed);
                }
                Err(err) if err.is_retryable() => err,
                Err(err) => {
                    debug!(error = %err, attempt, "Order rejected");
                    return Err(err);
                }
            };

            if attempt >= max_attempts {
                warn!(error = %err, attempts = attempt, "Giving up on order placement");
                return Err(CheckoutError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = backoff
                .next_backoff()
                .unwrap_or_else(|| Duration::from_millis(self.config.retry.max_backoff_ms));
            warn!(error = %err, attempt, ?delay, "Retrying order placement");
            tokio::time::sleep(delay).await;
        }
    }

    /// One transaction from BEGIN to COMMIT.
    async fn attempt(
        &self,
        request: &PlaceOrderRequest,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> CheckoutResult<PlacedOrder> {
        let (tx, placed) = tokio::time::timeout(timeout, self.stage_order(request, now))
            .await
            .map_err(|_| CheckoutError::TimedOut {
                after_secs: timeout.as_secs(),
            })??;

        tx.commit().await?;
        Ok(placed)
    }

    /// Every read and write of an attempt, left uncommitted.
    async fn stage_order(
        &self,
        request: &PlaceOrderRequest,
        now: DateTime<Utc>,
    ) -> CheckoutResult<(OrderTransaction, PlacedOrder)> {
        let mut tx = self.db.begin_order_transaction().await?;

        let product_ids: Vec<&str> = request
            .items
            .iter()
            .map(|line| line.product_id.as_str())
            .collect();
        let products = tx.load_products(product_ids).await?;
        let lines = stock::validate_lines(&request.items, &products)?;
        let raw_subtotal = stock::raw_subtotal(&lines);

        let discount = self.resolve_discount(&mut tx, request, raw_subtotal, now).await?;
        let totals = OrderTotals::compute(
            raw_subtotal,
            discount.discount,
            Money::from_cents(request.shipping_cents),
            self.config.vat_rate(),
        );

        let scope = NumberScope::new(
            &self.config.order_number.prefix,
            lines.first().and_then(|line| line.category_name.as_deref()),
            now,
        );
        let mut order = build_order(request, &totals, &discount, now);
        self.insert_with_number(&mut tx, &scope, &mut order, now)
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = build_item(&order, line);
            tx.insert_item(&item).await?;
            items.push(item);
        }

        for line in lines.iter().filter(|line| !line.preorder) {
            if !tx.decrement_stock(&line.product_id, line.quantity, now).await? {
                return Err(CheckoutError::StockConflict {
                    product_id: line.product_id.clone(),
                });
            }
        }

        let vat_record = VatRecord {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            vat_rate_bps: i64::from(self.config.pricing.vat_rate_bps),
            vat_cents: totals.vat.cents(),
            subtotal_cents: totals.discounted_subtotal.cents(),
            total_cents: totals.total.cents(),
            created_at: now,
        };
        tx.insert_vat_record(&vat_record).await?;

        Ok((
            tx,
            PlacedOrder {
                order,
                items,
                vat_record,
            },
        ))
    }

    /// Code first, then first-order; an unusable code is logged and ignored.
    async fn resolve_discount(
        &self,
        tx: &mut OrderTransaction,
        request: &PlaceOrderRequest,
        raw_subtotal: Money,
        now: DateTime<Utc>,
    ) -> CheckoutResult<DiscountResolution> {
        let supplied = request.normalized_discount_code();
        let record = match supplied {
            Some(code) => tx.find_discount_code(code).await?,
            None => None,
        };
        let lookup = match (supplied, record.as_ref()) {
            (None, _) => CodeLookup::NotSupplied,
            (Some(_), None) => CodeLookup::NotFound,
            (Some(_), Some(code)) => CodeLookup::Found(code),
        };

        let has_prior_order = tx.has_prior_order(&request.customer.identity()).await?;
        let resolution = resolve_discount(
            raw_subtotal,
            lookup,
            has_prior_order,
            self.config.first_order_rate(),
            now,
        );

        if let (Some(code), Some(reason)) = (supplied, resolution.rejected) {
            warn!(code = %code, %reason, "Discount code ignored");
        }
        debug!(
            discount = %resolution.discount,
            first_order = resolution.is_first_order,
            "Discount resolved"
        );
        Ok(resolution)
    }

    /// Claims sequence numbers until the header insert lands on a free one.
    async fn insert_with_number(
        &self,
        tx: &mut OrderTransaction,
        scope: &NumberScope,
        order: &mut Order,
        now: DateTime<Utc>,
    ) -> CheckoutResult<()> {
        let key = scope.key();
        let max = self.config.order_number.max_number_attempts;

        for _ in 0..max {
            let seq = tx.next_order_sequence(&key, now).await?;
            order.order_number = scope.format(seq);

            match tx.insert_order(order).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_unique_violation_on(ORDER_NUMBER_FIELD) => {
                    warn!(order_number = %order.order_number, "Order number taken, advancing counter");
                }
                Err(err) => return Err(CheckoutError::from(err)),
            }
        }

        Err(CheckoutError::OrderNumberConflict {
            scope: key,
            attempts: max,
        })
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.config.retry.initial_backoff_ms),
            max_interval: Duration::from_millis(self.config.retry.max_backoff_ms),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Row Builders
// =============================================================================

fn build_order(
    request: &PlaceOrderRequest,
    totals: &OrderTotals,
    discount: &DiscountResolution,
    now: DateTime<Utc>,
) -> Order {
    let customer = &request.customer;
    Order {
        id: Uuid::new_v4().to_string(),
        order_number: String::new(),
        status: OrderStatus::Pending,
        customer_id: customer
            .account_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        email: customer.email.trim().to_string(),
        customer_name: customer.name.trim().to_string(),
        address_line1: customer.address_line1.trim().to_string(),
        address_line2: customer
            .address_line2
            .as_deref()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
        city: customer.city.trim().to_string(),
        postcode: customer.postcode.trim().to_string(),
        country: customer.country.trim().to_string(),
        subtotal_cents: totals.raw_subtotal.cents(),
        discount_cents: totals.discount.cents(),
        vat_cents: totals.vat.cents(),
        shipping_cents: totals.shipping.cents(),
        total_cents: totals.total.cents(),
        discount_code_id: discount.discount_code_id.clone(),
        discount_code: discount.discount_code.clone(),
        first_order: discount.is_first_order,
        created_at: now,
    }
}

fn build_item(order: &Order, line: &ValidatedLine) -> OrderItem {
    OrderItem {
        id: Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        line_no: line.line_no,
        product_id: line.product_id.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price.cents(),
        line_total_cents: line.line_total().cents(),
        preorder: line.preorder,
        created_at: order.created_at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
