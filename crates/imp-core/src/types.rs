//! # Domain Types
//!
//! Core domain types used throughout order placement.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INPUT (never persisted as-is)        PERSISTED (created by checkout)   │
//! │  ┌─────────────────┐                  ┌─────────────────┐               │
//! │  │PlaceOrderRequest│                  │     Order       │               │
//! │  │  customer       │                  │  order_number   │──┐            │
//! │  │  shipping_cents │                  │  totals, flags  │  │ 1:N        │
//! │  │  items[]  ──────┼─► CartLine       └─────────────────┘  ▼            │
//! │  │  discount_code  │                  ┌─────────────────┐ OrderItem     │
//! │  └─────────────────┘                  │   VatRecord     │ (1:1 Order)   │
//! │                                       └─────────────────┘               │
//! │  READ-ONLY (owned by collaborators)                                     │
//! │  ProductSnapshot • DiscountCode         MUTATED: StockLevel             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every persisted entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (`order_number`, discount `code`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// A rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% (UK standard VAT). Also used for percentage discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_VAT_RATE_BPS)
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// One line of the submitted cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price as the client saw it, in pence.
    pub unit_price_cents: i64,
}

impl CartLine {
    /// Returns the submitted unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// Customer details captured on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    /// Account ID when the customer is signed in; guests have none.
    #[serde(default)]
    pub account_id: Option<String>,
    pub email: String,
    pub name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
}

impl Customer {
    /// Identity used for purchase history lookups.
    ///
    /// Signed-in customers are recognised by account; guests by email.
    pub fn identity(&self) -> CustomerIdentity {
        match self.account_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => CustomerIdentity::Account(id.to_string()),
            _ => CustomerIdentity::Email(self.email.trim().to_lowercase()),
        }
    }
}

/// How a customer is recognised across orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CustomerIdentity {
    Account(String),
    /// Lowercased email address.
    Email(String),
}

/// Everything needed to place one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlaceOrderRequest {
    pub customer: Customer,
    /// Shipping cost in pence, added after discount and VAT derivation.
    #[serde(default)]
    pub shipping_cents: i64,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

impl PlaceOrderRequest {
    /// The discount code with whitespace trimmed; blank codes count as absent.
    pub fn normalized_discount_code(&self) -> Option<&str> {
        self.discount_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// What the checkout needs to know about a product, read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: String,
    pub price_cents: i64,
    pub is_preorder: bool,
    /// `None` when the product has no stock record.
    pub stock_amount: Option<i64>,
    pub category_name: Option<String>,
}

impl ProductSnapshot {
    /// Returns the current catalog price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Discount Code
// =============================================================================

/// How a discount code's value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a rate in basis points (2000 = 20% off).
    Percentage,
    /// `value` is a flat amount in pence.
    Fixed,
}

/// A reusable promotional code. Redemption never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: String,
    /// Unique, matched case-insensitively.
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub active: bool,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DiscountCode {
    /// True once `now` has reached the expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle state of an order.
///
/// ## Transition Table
/// ```text
/// Pending ──► Paid ──► Fulfilled ──► Shipped
///    │          │
///    │          ├──► Refunded
///    ▼          ▼
/// Cancelled ◄───┘
/// ```
/// Checkout only ever creates `Pending` orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Fulfilled,
    Shipped,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Whether an order in this state may move to `next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Paid, Fulfilled)
                | (Fulfilled, Shipped)
                | (Pending, Cancelled)
                | (Paid, Cancelled)
                | (Paid, Refunded)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. Created once, inside the checkout transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// `IMP-{CATEGORY}-{YYYYMMDD}-{SEQ}`; unique and immutable.
    pub order_number: String,
    pub status: OrderStatus,
    pub customer_id: Option<String>,
    pub email: String,
    pub customer_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
    /// Σ(unit price × quantity) before discount.
    pub subtotal_cents: i64,
    /// Discount actually applied (never more than the subtotal).
    pub discount_cents: i64,
    /// VAT contained in the discounted subtotal.
    pub vat_cents: i64,
    pub shipping_cents: i64,
    /// Discounted subtotal + shipping.
    pub total_cents: i64,
    pub discount_code_id: Option<String>,
    /// Code text at time of purchase (frozen).
    pub discount_code: Option<String>,
    pub first_order: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Subtotal after discount; the VAT-inclusive taxable amount.
    #[inline]
    pub fn discounted_subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents - self.discount_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line of a placed order.
/// Uses snapshot pattern to freeze the price at time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// Position in the submitted cart, starting at 1.
    pub line_no: i64,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in pence at time of purchase (frozen).
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    /// Whether the line was a preorder (no stock was taken).
    pub preorder: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// VAT Record
// =============================================================================

/// Tax record written alongside every order (exactly one per order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VatRecord {
    pub id: String,
    pub order_id: String,
    pub order_number: String,
    pub vat_rate_bps: i64,
    pub vat_cents: i64,
    /// Discounted, VAT-inclusive subtotal the VAT was derived from.
    pub subtotal_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock
// =============================================================================

/// Physical stock for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: String,
    /// Units on hand; never negative.
    pub amount: i64,
    /// Units sold; never decreases.
    pub sold: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Placement Result
// =============================================================================

/// A committed order with everything written alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub vat_record: VatRecord,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn customer(account_id: Option<&str>, email: &str) -> Customer {
        Customer {
            account_id: account_id.map(str::to_string),
            email: email.to_string(),
            name: "Ada Lovelace".to_string(),
            address_line1: "1 Analytical Row".to_string(),
            address_line2: None,
            city: "London".to_string(),
            postcode: "N1 1AA".to_string(),
            country: "GB".to_string(),
        }
    }

    #[test]
    fn test_tax_rate_default_is_uk_standard() {
        assert_eq!(TaxRate::default().bps(), 2000);
    }

    #[test]
    fn test_customer_identity_prefers_account() {
        let signed_in = customer(Some("acct-1"), "Ada@Example.com");
        assert_eq!(
            signed_in.identity(),
            CustomerIdentity::Account("acct-1".to_string())
        );

        let guest = customer(None, " Ada@Example.com ");
        assert_eq!(
            guest.identity(),
            CustomerIdentity::Email("ada@example.com".to_string())
        );

        let blank_account = customer(Some("  "), "ada@example.com");
        assert!(matches!(
            blank_account.identity(),
            CustomerIdentity::Email(_)
        ));
    }

    #[test]
    fn test_normalized_discount_code() {
        let mut request = PlaceOrderRequest {
            customer: customer(None, "a@b.co"),
            shipping_cents: 0,
            items: vec![],
            discount_code: Some("  SAVE20 ".to_string()),
        };
        assert_eq!(request.normalized_discount_code(), Some("SAVE20"));

        request.discount_code = Some("   ".to_string());
        assert_eq!(request.normalized_discount_code(), None);
    }

    #[test]
    fn test_discount_code_expiry() {
        let expires = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let code = DiscountCode {
            id: "d1".to_string(),
            code: "NEWYEAR".to_string(),
            kind: DiscountKind::Fixed,
            value: 500,
            active: true,
            expires_at: Some(expires),
            created_at: expires,
        };
        assert!(!code.is_expired(expires - chrono::Duration::seconds(1)));
        assert!(code.is_expired(expires));
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::*;
        assert_eq!(OrderStatus::default(), Pending);
        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Fulfilled));
        assert!(Fulfilled.can_transition_to(Shipped));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Refunded));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Fulfilled.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Refunded));
        assert!(!Shipped.can_transition_to(Pending));
    }

    #[test]
    fn test_request_deserializes_from_camel_case() {
        let json = r#"{
            "customer": {
                "email": "ada@example.com",
                "name": "Ada",
                "addressLine1": "1 Row",
                "city": "London",
                "postcode": "N1",
                "country": "GB"
            },
            "shippingCents": 500,
            "items": [{"productId": "p1", "quantity": 2, "unitPriceCents": 1000}],
            "discountCode": "SAVE20"
        }"#;
        let request: PlaceOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.shipping_cents, 500);
        assert_eq!(request.items[0].line_total().cents(), 2000);
        assert_eq!(request.customer.account_id, None);
    }

    #[test]
    fn test_records_serialize_in_camel_case() {
        let record = VatRecord {
            id: "v1".to_string(),
            order_id: "o1".to_string(),
            order_number: "IMP-TRADINGCARDS-20260314-001".to_string(),
            vat_rate_bps: 2000,
            vat_cents: 1583,
            subtotal_cents: 9500,
            total_cents: 9500,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["orderNumber"], "IMP-TRADINGCARDS-20260314-001");
        assert_eq!(json["vatRateBps"], 2000);
        assert_eq!(json["subtotalCents"], 9500);
        assert!(json.get("order_number").is_none());
    }
}
