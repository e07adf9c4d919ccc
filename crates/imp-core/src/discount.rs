//! # Discount Resolution
//!
//! Decides which single discount an order receives.
//!
//! ## Precedence (first match wins, never combined)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ 1. Code supplied, found, active, not expired                            │
//! │      percentage → subtotal × bps / 10000 (half-up)                      │
//! │      fixed      → value                                                 │
//! │      is_first_order = false, even for a first-time customer             │
//! │                                                                         │
//! │ 2. Customer has no prior order (by account, else by email)              │
//! │      → subtotal × first-order rate (5%)                                 │
//! │      is_first_order = true                                              │
//! │                                                                         │
//! │ 3. Otherwise → zero                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An unknown, inactive or expired code never fails the order. It is
//! reported in [`DiscountResolution::rejected`] and resolution falls
//! through to step 2.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{DiscountCode, DiscountKind, TaxRate};

/// Result of looking up the code the customer typed.
#[derive(Debug, Clone, Copy)]
pub enum CodeLookup<'a> {
    /// The request carried no code.
    NotSupplied,
    /// A code was supplied but no record matches it.
    NotFound,
    Found(&'a DiscountCode),
}

/// Why a supplied code was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRejection {
    NotFound,
    Inactive,
    Expired,
}

impl std::fmt::Display for DiscountRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DiscountRejection::NotFound => "not_found",
            DiscountRejection::Inactive => "inactive",
            DiscountRejection::Expired => "expired",
        })
    }
}

/// The discount an order receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountResolution {
    /// Applied discount, already capped at the subtotal.
    pub discount: Money,
    pub discount_code_id: Option<String>,
    /// Code text as stored, for the order snapshot.
    pub discount_code: Option<String>,
    pub is_first_order: bool,
    /// Set when a supplied code was ignored.
    pub rejected: Option<DiscountRejection>,
}

/// Checks a looked-up code against its active flag and expiry.
pub fn check_code<'a>(
    lookup: CodeLookup<'a>,
    now: DateTime<Utc>,
) -> Option<Result<&'a DiscountCode, DiscountRejection>> {
    match lookup {
        CodeLookup::NotSupplied => None,
        CodeLookup::NotFound => Some(Err(DiscountRejection::NotFound)),
        CodeLookup::Found(code) if !code.active => Some(Err(DiscountRejection::Inactive)),
        CodeLookup::Found(code) if code.is_expired(now) => Some(Err(DiscountRejection::Expired)),
        CodeLookup::Found(code) => Some(Ok(code)),
    }
}

/// Value of a code against a subtotal, before capping.
pub fn code_value(code: &DiscountCode, subtotal: Money) -> Money {
    match code.kind {
        DiscountKind::Percentage => {
            let bps = code.value.clamp(0, 10_000) as u32;
            subtotal.percentage(TaxRate::from_bps(bps))
        }
        DiscountKind::Fixed => Money::from_cents(code.value).non_negative(),
    }
}

/// Resolves the discount for an order.
///
/// ## Arguments
/// * `subtotal` - Raw subtotal, Σ(unit price × quantity)
/// * `lookup` - Outcome of the code lookup
/// * `has_prior_order` - Whether the customer has ordered before
/// * `first_order_rate` - Automatic first-order rate
/// * `now` - Instant used for the expiry check
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use imp_core::discount::{resolve_discount, CodeLookup};
/// use imp_core::money::Money;
/// use imp_core::types::TaxRate;
///
/// let resolution = resolve_discount(
///     Money::from_cents(10000),
///     CodeLookup::NotSupplied,
///     false,
///     TaxRate::from_bps(500),
///     Utc::now(),
/// );
/// assert_eq!(resolution.discount.cents(), 500);
/// assert!(resolution.is_first_order);
/// ```
pub fn resolve_discount(
    subtotal: Money,
    lookup: CodeLookup<'_>,
    has_prior_order: bool,
    first_order_rate: TaxRate,
    now: DateTime<Utc>,
) -> DiscountResolution {
    let rejected = match check_code(lookup, now) {
        Some(Ok(code)) => {
            return DiscountResolution {
                discount: cap(code_value(code, subtotal), subtotal),
                discount_code_id: Some(code.id.clone()),
                discount_code: Some(code.code.clone()),
                is_first_order: false,
                rejected: None,
            };
        }
        Some(Err(rejection)) => Some(rejection),
        None => None,
    };

    if !has_prior_order {
        return DiscountResolution {
            discount: cap(subtotal.percentage(first_order_rate), subtotal),
            discount_code_id: None,
            discount_code: None,
            is_first_order: true,
            rejected,
        };
    }

    DiscountResolution {
        discount: Money::zero(),
        discount_code_id: None,
        discount_code: None,
        is_first_order: false,
        rejected,
    }
}

fn cap(discount: Money, subtotal: Money) -> Money {
    discount.min(subtotal.non_negative()).non_negative()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn code(kind: DiscountKind, value: i64) -> DiscountCode {
        DiscountCode {
            id: "code-1".to_string(),
            code: "SAVE20".to_string(),
            kind,
            value,
            active: true,
            expires_at: None,
            created_at: now() - Duration::days(30),
        }
    }

    const FIRST_ORDER: TaxRate = TaxRate::from_bps(500);

    #[test]
    fn test_save20_percentage() {
        let save20 = code(DiscountKind::Percentage, 2000);
        let r = resolve_discount(
            Money::from_cents(5000),
            CodeLookup::Found(&save20),
            true,
            FIRST_ORDER,
            now(),
        );
        assert_eq!(r.discount.cents(), 1000);
        assert_eq!(r.discount_code_id.as_deref(), Some("code-1"));
        assert_eq!(r.discount_code.as_deref(), Some("SAVE20"));
        assert!(!r.is_first_order);
        assert_eq!(r.rejected, None);
    }

    #[test]
    fn test_code_beats_first_order() {
        let tenoff = code(DiscountKind::Percentage, 1000);
        let r = resolve_discount(
            Money::from_cents(10000),
            CodeLookup::Found(&tenoff),
            false,
            FIRST_ORDER,
            now(),
        );
        assert_eq!(r.discount.cents(), 1000);
        assert!(!r.is_first_order);
    }

    #[test]
    fn test_first_order_discount() {
        let r = resolve_discount(
            Money::from_cents(10000),
            CodeLookup::NotSupplied,
            false,
            FIRST_ORDER,
            now(),
        );
        assert_eq!(r.discount.cents(), 500);
        assert!(r.is_first_order);
        assert_eq!(r.discount_code_id, None);
    }

    #[test]
    fn test_returning_customer_without_code() {
        let r = resolve_discount(
            Money::from_cents(10000),
            CodeLookup::NotSupplied,
            true,
            FIRST_ORDER,
            now(),
        );
        assert!(r.discount.is_zero());
        assert!(!r.is_first_order);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let fixed = code(DiscountKind::Fixed, 1500);
        let r = resolve_discount(
            Money::from_cents(1000),
            CodeLookup::Found(&fixed),
            true,
            FIRST_ORDER,
            now(),
        );
        assert_eq!(r.discount.cents(), 1000);
    }

    #[test]
    fn test_rejected_codes_fall_through() {
        let mut inactive = code(DiscountKind::Percentage, 2000);
        inactive.active = false;
        let mut expired = code(DiscountKind::Percentage, 2000);
        expired.expires_at = Some(now() - Duration::minutes(1));

        let cases = [
            (CodeLookup::NotFound, DiscountRejection::NotFound),
            (CodeLookup::Found(&inactive), DiscountRejection::Inactive),
            (CodeLookup::Found(&expired), DiscountRejection::Expired),
        ];

        for (lookup, reason) in cases {
            let r = resolve_discount(Money::from_cents(10000), lookup, false, FIRST_ORDER, now());
            assert_eq!(r.rejected, Some(reason));
            assert!(r.is_first_order);
            assert_eq!(r.discount.cents(), 500);
            assert_eq!(r.discount_code_id, None);
        }
    }

    #[test]
    fn test_code_expiring_later_is_valid() {
        let mut later = code(DiscountKind::Fixed, 200);
        later.expires_at = Some(now() + Duration::days(1));
        assert!(matches!(check_code(CodeLookup::Found(&later), now()), Some(Ok(_))));
    }

    proptest! {
        #[test]
        fn prop_discount_never_exceeds_subtotal(
            subtotal in 0i64..10_000_000,
            value in 0i64..20_000,
            percentage in any::<bool>(),
            prior in any::<bool>(),
        ) {
            let kind = if percentage { DiscountKind::Percentage } else { DiscountKind::Fixed };
            let c = code(kind, value);
            let r = resolve_discount(
                Money::from_cents(subtotal),
                CodeLookup::Found(&c),
                prior,
                FIRST_ORDER,
                now(),
            );
            prop_assert!(r.discount.cents() >= 0);
            prop_assert!(r.discount.cents() <= subtotal);
            prop_assert!(!r.is_first_order);
        }

        #[test]
        fn prop_first_order_only_without_history(subtotal in 0i64..10_000_000, prior in any::<bool>()) {
            let r = resolve_discount(
                Money::from_cents(subtotal),
                CodeLookup::NotSupplied,
                prior,
                FIRST_ORDER,
                now(),
            );
            prop_assert_eq!(r.is_first_order, !prior);
            if prior {
                prop_assert!(r.discount.is_zero());
            }
        }
    }
}
