//! # VAT Calculation
//!
//! Prices are VAT-inclusive (UK style). The VAT on an order is the tax
//! share already contained in the discounted subtotal:
//!
//! ```text
//! vat   = discounted − discounted / (1 + rate)
//! total = discounted + shipping          (shipping carries no VAT here)
//! ```
//!
//! All arithmetic is integer pence; the net part is rounded half-up once
//! and VAT is the remainder, so `net + vat == discounted` exactly.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::TaxRate;

/// VAT contained in a tax-inclusive amount.
///
/// ## Example
/// ```rust
/// use imp_core::money::Money;
/// use imp_core::types::TaxRate;
/// use imp_core::vat::compute_vat;
///
/// let vat = compute_vat(Money::from_cents(9500), TaxRate::from_bps(2000));
/// assert_eq!(vat.cents(), 1583);
/// ```
pub fn compute_vat(discounted_subtotal: Money, rate: TaxRate) -> Money {
    discounted_subtotal - discounted_subtotal.net_of_inclusive(rate)
}

/// Every amount derived while pricing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub raw_subtotal: Money,
    /// Discount after capping at the raw subtotal.
    pub discount: Money,
    /// `max(raw_subtotal − discount, 0)`
    pub discounted_subtotal: Money,
    pub vat: Money,
    pub shipping: Money,
    /// `discounted_subtotal + shipping`
    pub total: Money,
}

impl OrderTotals {
    /// Prices an order from its raw subtotal, discount and shipping.
    pub fn compute(raw_subtotal: Money, discount: Money, shipping: Money, rate: TaxRate) -> Self {
        let discounted_subtotal = (raw_subtotal - discount).non_negative();
        let applied = raw_subtotal.non_negative() - discounted_subtotal;

        OrderTotals {
            raw_subtotal,
            discount: applied,
            discounted_subtotal,
            vat: compute_vat(discounted_subtotal, rate),
            shipping,
            total: discounted_subtotal + shipping,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
