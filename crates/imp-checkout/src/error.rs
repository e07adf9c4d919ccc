//! # Checkout Error Type
//!
//! What a caller of [`Checkout::place_order`](crate::Checkout::place_order)
//! sees when an order is not placed.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Order Placement                        │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► CheckoutError ──► ErrorResponse   │
//! │  DbError ────────────────────────┘         │            { code,         │
//! │                                            │              message }     │
//! │                                            ▼                            │
//! │                                   is_retryable()?                       │
//! │                                   ├── yes: back off, run again          │
//! │                                   └── no:  surface verbatim             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is ever partially applied: every variant here means the order
//! transaction was rolled back (or never opened).

use serde::Serialize;
use thiserror::Error;

use imp_core::{CoreError, ValidationError};
use imp_db::DbError;

/// Reasons an order was not placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart broke a business rule (stale price, no stock, bad input).
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Stock ran out between validation and the write-time re-check.
    #[error("Stock for {product_id} changed while the order was being placed")]
    StockConflict { product_id: String },

    /// Every order number tried in a scope was already taken.
    #[error("No free order number in {scope} after {attempts} attempts")]
    OrderNumberConflict { scope: String, attempts: u32 },

    /// Another writer held the database and busy_timeout elapsed.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// The attempt did not finish within the transaction timeout.
    #[error("Order placement timed out after {after_secs}s")]
    TimedOut { after_secs: u64 },

    /// Retryable failures persisted across every allowed attempt.
    #[error("Order could not be placed after {attempts} attempts, please try again")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<CheckoutError>,
    },

    /// The storage layer failed for a non-transient reason.
    #[error("Order transaction aborted: {0}")]
    TransactionAborted(DbError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Whether running the whole attempt again might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::StockConflict { .. }
                | CheckoutError::OrderNumberConflict { .. }
                | CheckoutError::Busy(_)
        )
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::Rejected(err) => match err {
                CoreError::ProductNotFound(_) => ErrorCode::ProductNotFound,
                CoreError::PriceMismatch { .. } => ErrorCode::PriceMismatch,
                CoreError::MissingStock { .. } => ErrorCode::MissingStock,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            CheckoutError::StockConflict { .. } => ErrorCode::StockConflict,
            CheckoutError::OrderNumberConflict { .. } => ErrorCode::OrderNumberConflict,
            CheckoutError::Busy(_) => ErrorCode::DatabaseBusy,
            CheckoutError::TimedOut { .. } => ErrorCode::TimedOut,
            CheckoutError::RetriesExhausted { .. } => ErrorCode::TryAgain,
            CheckoutError::TransactionAborted(_) => ErrorCode::TransactionAborted,
            CheckoutError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// The body handed back to whoever submitted the order.
    ///
    /// Storage internals are logged here and replaced with a generic message.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            CheckoutError::TransactionAborted(err) => {
                tracing::error!(error = %err, "Order transaction aborted");
                "The order could not be saved".to_string()
            }
            other => other.to_string(),
        };
        ErrorResponse {
            code: self.code(),
            message,
        }
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Rejected(CoreError::Validation(err))
    }
}

/// Lock contention stays retryable; anything else aborts the order.
impl From<DbError> for CheckoutError {
    fn from(err: DbError) -> Self {
        if err.is_transient() {
            CheckoutError::Busy(err.to_string())
        } else {
            CheckoutError::TransactionAborted(err)
        }
    }
}

/// Convenience type alias for Results with CheckoutError.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Response Body
// =============================================================================

/// Serialized failure:
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for card-001: available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

/// Error codes for failed placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request failed boundary validation
    ValidationError,

    /// A cart line names an unknown product
    ProductNotFound,

    /// Submitted price differs from the catalog
    PriceMismatch,

    /// Physical product without a stock record
    MissingStock,

    /// Not enough stock for a line
    InsufficientStock,

    /// Write-time stock re-check failed
    StockConflict,

    /// Order number scope exhausted for this attempt
    OrderNumberConflict,

    /// Database locked by another writer
    DatabaseBusy,

    /// Attempt exceeded the transaction timeout
    TimedOut,

    /// Transient failures outlasted the retry budget
    TryAgain,

    /// Non-transient storage failure
    TransactionAborted,

    /// Bad configuration
    ConfigError,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use imp_core::Money;

    #[test]
    fn test_retryable_classification() {
        assert!(CheckoutError::StockConflict {
            product_id: "p".to_string()
        }
        .is_retryable());
        assert!(CheckoutError::OrderNumberConflict {
            scope: "IMP-CARDS-20260314".to_string(),
            attempts: 5
        }
        .is_retryable());
        assert!(CheckoutError::from(DbError::Busy("database is locked".to_string())).is_retryable());
        assert!(CheckoutError::from(DbError::PoolExhausted).is_retryable());

        assert!(!CheckoutError::TimedOut { after_secs: 10 }.is_retryable());
        assert!(!CheckoutError::from(DbError::QueryFailed("syntax".to_string())).is_retryable());
        assert!(!CheckoutError::from(CoreError::MissingStock {
            product_id: "p".to_string()
        })
        .is_retryable());
    }

    #[test]
    fn test_codes_follow_core_errors() {
        let err = CheckoutError::from(CoreError::PriceMismatch {
            product_id: "p".to_string(),
            submitted: Money::from_cents(900),
            current: Money::from_cents(1000),
        });
        assert_eq!(err.code(), ErrorCode::PriceMismatch);

        let err = CheckoutError::from(ValidationError::Required {
            field: "items".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.to_string(), "Validation error: items is required");
    }

    #[test]
    fn test_response_serialization() {
        let err = CheckoutError::from(CoreError::InsufficientStock {
            product_id: "card-001".to_string(),
            available: 3,
            requested: 5,
        });
        let json = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert_eq!(
            json["message"],
            "Insufficient stock for card-001: available 3, requested 5"
        );

        let err = CheckoutError::RetriesExhausted {
            attempts: 5,
            last: Box::new(CheckoutError::Busy("database is locked".to_string())),
        };
        let json = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(json["code"], "TRY_AGAIN");
    }

    #[test]
    fn test_storage_details_hidden() {
        let err = CheckoutError::from(DbError::QueryFailed("no such table: orders".to_string()));
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::TransactionAborted);
        assert!(!response.message.contains("no such table"));
    }
}
