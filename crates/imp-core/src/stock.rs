//! # Stock Validation
//!
//! Per-line price and availability checks against a catalog snapshot.
//!
//! ## Rules Applied to Each Line
//! ```text
//! CartLine { product_id, quantity, unit_price }
//!      │
//!      ├── product missing from catalog?        → ProductNotFound
//!      ├── unit_price ≠ catalog price?          → PriceMismatch
//!      ├── preorder?                            → OK (no stock check)
//!      ├── no stock record?                     → MissingStock
//!      ├── remaining stock < quantity?          → InsufficientStock
//!      └── OK → ValidatedLine { preorder: false }
//! ```
//!
//! Lines for the same product draw on the same stock: two lines of 3
//! against a stock of 5 fail on the second line with 2 available.
//!
//! This is a read-time check only. The database decrement repeats the
//! `amount >= quantity` test at write time.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, ProductSnapshot};

/// A cart line that passed validation, carrying what later steps need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLine {
    /// Position in the submitted cart, starting at 1.
    pub line_no: i64,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Preorder lines never touch stock.
    pub preorder: bool,
    pub category_name: Option<String>,
}

impl ValidatedLine {
    /// Returns `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Validates every line of a cart against the catalog. Pure; no side effects.
///
/// ## Arguments
/// * `lines` - Submitted cart lines, in order
/// * `catalog` - Product snapshots keyed by product ID
///
/// ## Returns
/// One [`ValidatedLine`] per input line, in the same order, or the first
/// failure encountered.
pub fn validate_lines(
    lines: &[CartLine],
    catalog: &HashMap<String, ProductSnapshot>,
) -> CoreResult<Vec<ValidatedLine>> {
    let mut remaining: HashMap<&str, i64> = HashMap::new();
    let mut validated = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let product = catalog
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        if line.unit_price() != product.price() {
            return Err(CoreError::PriceMismatch {
                product_id: line.product_id.clone(),
                submitted: line.unit_price(),
                current: product.price(),
            });
        }

        if !product.is_preorder {
            let stock = product
                .stock_amount
                .ok_or_else(|| CoreError::MissingStock {
                    product_id: line.product_id.clone(),
                })?;

            let available = remaining.entry(product.id.as_str()).or_insert(stock);
            if *available < line.quantity {
                return Err(CoreError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available: *available,
                    requested: line.quantity,
                });
            }
            *available -= line.quantity;
        }

        validated.push(ValidatedLine {
            line_no: index as i64 + 1,
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price(),
            preorder: product.is_preorder,
            category_name: product.category_name.clone(),
        });
    }

    Ok(validated)
}

/// Σ(unit price × quantity) over validated lines.
pub fn raw_subtotal(lines: &[ValidatedLine]) -> Money {
    lines.iter().map(ValidatedLine::line_total).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
