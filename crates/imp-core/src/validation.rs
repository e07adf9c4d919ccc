//! # Validation Module
//!
//! Boundary validation for order placement requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  └── Shape and types of the request                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any transaction opens)                   │
//! │  ├── Quantities, prices, cart size                                     │
//! │  └── Customer fields                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Business rules inside the transaction                        │
//! │  └── stock::validate_lines (catalog price + availability)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── CHECK (amount >= 0) on stock                                      │
//! │  └── UNIQUE (order_number)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::PlaceOrderRequest;
use crate::{MAX_AMOUNT_CENTS, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_TEXT_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;
const MAX_DISCOUNT_CODE_LEN: usize = 50;

// =============================================================================
// Request Validator
// =============================================================================

/// Validates a whole placement request.
///
/// Runs every field check; the first failure is returned.
///
/// ## Example
/// ```rust,ignore
/// validate_order_request(&request)?;
/// // safe to open the transaction
/// ```
pub fn validate_order_request(request: &PlaceOrderRequest) -> ValidationResult<()> {
    validate_cart_size(request.items.len())?;

    for line in &request.items {
        validate_product_id(&line.product_id)?;
        validate_quantity(line.quantity)?;
        validate_price_cents("unit price", line.unit_price_cents)?;
    }

    validate_price_cents("shipping", request.shipping_cents)?;

    let customer = &request.customer;
    validate_email(&customer.email)?;
    validate_required_text("name", &customer.name)?;
    validate_required_text("address line 1", &customer.address_line1)?;
    validate_required_text("city", &customer.city)?;
    validate_required_text("postcode", &customer.postcode)?;
    validate_required_text("country", &customer.country)?;

    if let Some(code) = request.normalized_discount_code() {
        validate_discount_code(code)?;
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field (names, address parts).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_required_text(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Exactly one `@`, with a non-empty local part and a dotted domain
///
/// ## Example
/// ```rust
/// use imp_core::validation::validate_email;
///
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("ada.example.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates a product reference on a cart line.
pub fn validate_product_id(product_id: &str) -> ValidationResult<()> {
    if product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product id".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount code's shape. Whether it exists is not checked here.
pub fn validate_discount_code(code: &str) -> ValidationResult<()> {
    if code.chars().count() > MAX_DISCOUNT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "discount code".to_string(),
            max: MAX_DISCOUNT_CODE_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in pence.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, free shipping)
/// - Must not exceed MAX_AMOUNT_CENTS (£1,000,000)
///
/// ## Example
/// ```rust
/// use imp_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("unit price", 1099).is_ok());
/// assert!(validate_price_cents("shipping", 0).is_ok());
/// assert!(validate_price_cents("shipping", -100).is_err());
/// assert!(validate_price_cents("shipping", i64::MAX).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in an order.
///
/// ## Rules
/// - At least one line
/// - At most MAX_CART_ITEMS (100)
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
