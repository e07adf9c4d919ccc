//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A submitted price of 10.00 compared against a catalog price of        │
//! │  10.00 must compare EQUAL, every time.                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (pence)                              │
//! │    1000 == 1000, always. Rounding happens once, explicitly.             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use imp_core::money::Money;
//!
//! let price = Money::from_cents(1099); // £10.99
//! let line_total = price.multiply_quantity(2); // £21.98
//! let total = line_total + Money::from_cents(500); // £26.98
//! assert_eq!(total.cents(), 2698);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (pence for GBP).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction of a discount may dip below zero before
///   it is clamped, so the intermediate must be representable
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// CartLine.unit_price ──► line total ──► raw subtotal
///                                           │
///                                  − discount (code / first order)
///                                           │
///                                  discounted subtotal ──► VAT share
///                                           │
///                                  + shipping ──► order total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from pence (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use imp_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // £10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in pence.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (pounds) portion.
    #[inline]
    pub const fn pounds(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use imp_core::money::Money;
    ///
    /// // A £15 voucher on a £10 basket leaves nothing to pay, not -£5
    /// let after = Money::from_cents(1000) - Money::from_cents(1500);
    /// assert_eq!(after.non_negative(), Money::zero());
    /// ```
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use imp_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `rate` of this amount, rounded half-up to the nearest penny.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use imp_core::money::Money;
    /// use imp_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(5000); // £50.00
    /// let share = subtotal.percentage(TaxRate::from_bps(2000)); // 20%
    /// assert_eq!(share.cents(), 1000); // £10.00
    /// ```
    pub fn percentage(&self, rate: TaxRate) -> Money {
        // i128 prevents overflow on large amounts
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Returns the net (tax-exclusive) part of a tax-inclusive amount.
    ///
    /// `net = amount / (1 + rate)`, rounded half-up to the nearest penny.
    ///
    /// ## Example
    /// ```rust
    /// use imp_core::money::Money;
    /// use imp_core::types::TaxRate;
    ///
    /// // £20.00 including 20% VAT is £16.67 net
    /// let net = Money::from_cents(2000).net_of_inclusive(TaxRate::from_bps(2000));
    /// assert_eq!(net.cents(), 1667);
    /// ```
    pub fn net_of_inclusive(&self, rate: TaxRate) -> Money {
        let divisor = 10000_i128 + rate.bps() as i128;
        let scaled = self.0 as i128 * 10000;
        // Round half away from zero; amounts here are never negative in practice
        let net = if scaled >= 0 {
            (scaled * 2 + divisor) / (divisor * 2)
        } else {
            (scaled * 2 - divisor) / (divisor * 2)
        };
        Money::from_cents(net as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and error messages. Callers format for display
/// themselves to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}£{}.{:02}",
            sign,
            self.pounds().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
