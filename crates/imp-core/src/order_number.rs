//! # Order Numbers
//!
//! Human-readable order numbers of the form
//!
//! ```text
//! IMP-TRADINGCARDS-20260314-007
//! ─┬─ ──────┬───── ───┬──── ─┬─
//!  │        │         │      └── per-scope sequence, at least 3 digits
//!  │        │         └───────── UTC calendar date
//!  │        └─────────────────── category name, uppercased, no whitespace
//!  └──────────────────────────── prefix
//! ```
//!
//! Only formatting lives here. The sequence itself comes from an atomic
//! counter row in the database keyed by [`NumberScope::key`].

use chrono::{DateTime, NaiveDate, Utc};

/// Category code used when the first line's product has no category.
pub const UNKNOWN_CATEGORY: &str = "UNKNOWN";

/// Uppercased category name with all whitespace removed.
///
/// ```rust
/// use imp_core::order_number::category_code;
///
/// assert_eq!(category_code(Some("Trading Cards")), "TRADINGCARDS");
/// assert_eq!(category_code(Some("  ")), "UNKNOWN");
/// assert_eq!(category_code(None), "UNKNOWN");
/// ```
pub fn category_code(category_name: Option<&str>) -> String {
    let code: String = category_name
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();

    if code.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        code
    }
}

/// The (prefix, category, date) scope a sequence counts within.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberScope {
    prefix: String,
    category_code: String,
    date: NaiveDate,
}

impl NumberScope {
    /// Builds the scope for an order placed at `now`.
    pub fn new(prefix: &str, category_name: Option<&str>, now: DateTime<Utc>) -> Self {
        NumberScope {
            prefix: prefix.to_string(),
            category_code: category_code(category_name),
            date: now.date_naive(),
        }
    }

    pub fn category_code(&self) -> &str {
        &self.category_code
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Counter key, e.g. `IMP-TRADINGCARDS-20260314`.
    pub fn key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.prefix,
            self.category_code,
            self.date.format("%Y%m%d")
        )
    }

    /// Full order number for a sequence value.
    pub fn format(&self, seq: i64) -> String {
        format!("{}-{:03}", self.key(), seq)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
