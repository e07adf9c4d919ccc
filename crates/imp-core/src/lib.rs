//! # imp-core: Pure Business Logic for Order Placement
//!
//! This crate holds every rule of order placement that can be expressed
//! without touching storage. The database layer (`imp-db`) and the
//! coordinator (`imp-checkout`) call into it; it never calls out.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Placement Pipeline                          │
//! │                                                                         │
//! │  PlaceOrderRequest                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validation::validate_order_request ─── boundary checks                 │
//! │       │                                                                 │
//! │  ┌────▼────────────────────────────────────────────────────────────┐   │
//! │  │                ★ imp-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌────────────┐  │   │
//! │  │   │   stock   │  │ discount  │  │    vat    │  │order_number│  │   │
//! │  │   │ price +   │  │ code or   │  │ inclusive │  │ IMP-CAT-   │  │   │
//! │  │   │ quantity  │  │ 1st order │  │ 20% share │  │ DATE-SEQ   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  imp-db (OrderTransaction) ─── persist inside one transaction          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, OrderItem, DiscountCode, VatRecord, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation at the boundary
//! - [`stock`] - Price and availability checks per cart line
//! - [`discount`] - Discount code / first-order discount resolution
//! - [`vat`] - Tax-inclusive VAT derivation
//! - [`order_number`] - Human-readable order number formatting
//!
//! ## Example Usage
//!
//! ```rust
//! use imp_core::money::Money;
//! use imp_core::types::TaxRate;
//! use imp_core::vat::compute_vat;
//!
//! // £20.00 VAT-inclusive at 20% contains £3.33 of VAT
//! let vat = compute_vat(Money::from_cents(2000), TaxRate::from_bps(2000));
//! assert_eq!(vat.cents(), 333);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod order_number;
pub mod stock;
pub mod types;
pub mod validation;
pub mod vat;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single order line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest unit price or shipping charge accepted, in pence (£1,000,000).
///
/// Keeps every order total well inside `i64` with lines and quantities at
/// their maximums.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

/// Default UK standard VAT rate (20%) in basis points.
pub const DEFAULT_VAT_RATE_BPS: u32 = 2000;

/// Default automatic first-order discount (5%) in basis points.
pub const DEFAULT_FIRST_ORDER_DISCOUNT_BPS: u32 = 500;

/// Default order number prefix.
pub const DEFAULT_ORDER_PREFIX: &str = "IMP";
