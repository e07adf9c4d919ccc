//! # Error Types
//!
//! Domain-specific error types for imp-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  imp-core errors (this file)                                           │
//! │  ├── CoreError        - Cart rejected by a business rule               │
//! │  └── ValidationError  - Request failed boundary validation             │
//! │                                                                         │
//! │  imp-db errors (separate crate)                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  imp-checkout errors                                                   │
//! │  └── CheckoutError    - What the caller of place_order sees            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError ← DbError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product ID, amounts)
//! 3. Errors are enum variants, never String
//! 4. Every variant here aborts the order before anything is written

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected while validating a cart.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product referenced by a cart line does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Submitted unit price differs from the catalog price.
    ///
    /// ## When This Occurs
    /// - The cart was built before a price change (stale cart)
    /// - The client tampered with the price
    #[error("Price mismatch for {product_id}: submitted {submitted}, current {current}")]
    PriceMismatch {
        product_id: String,
        submitted: Money,
        current: Money,
    },

    /// Product is stocked physically but has no stock record.
    #[error("No stock information for product {product_id}")]
    MissingStock { product_id: String },

    /// Not enough stock to satisfy a cart line.
    ///
    /// ## User Workflow
    /// ```text
    /// Order line (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Caller shows: "Only 3 left in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a request doesn't meet requirements.
/// Raised at the boundary, before any transaction is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "card-001".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for card-001: available 3, requested 5"
        );

        let err = CoreError::PriceMismatch {
            product_id: "card-001".to_string(),
            submitted: Money::from_cents(900),
            current: Money::from_cents(1000),
        };
        assert_eq!(
            err.to_string(),
            "Price mismatch for card-001: submitted £9.00, current £10.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 999,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 999");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
