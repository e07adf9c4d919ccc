//! # imp-checkout: Order Placement
//!
//! Turns a [`PlaceOrderRequest`](imp_core::PlaceOrderRequest) into a committed
//! order with its items, stock movements and VAT record, or into nothing.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   checkout (CLI)          other callers (HTTP handler, job, test)       │
//! │        │                            │                                   │
//! │        └─────────────┬──────────────┘                                   │
//! │                      ▼                                                  │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │                  imp-checkout (THIS CRATE)                        │  │
//! │  │                                                                   │  │
//! │  │   CheckoutConfig ──► Checkout::place_order ──► CheckoutError      │  │
//! │  │                         │   retry + backoff                       │  │
//! │  │                         │   per-attempt timeout                   │  │
//! │  └─────────────────────────┼─────────────────────────────────────────┘  │
//! │                            ▼                                            │
//! │          imp-core (pricing rules)   imp-db (OrderTransaction)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use imp_checkout::{Checkout, CheckoutConfig};
//!
//! let checkout = Checkout::from_config(CheckoutConfig::load(None)?).await?;
//! let placed = checkout.place_order(&request).await?;
//! println!("{}", placed.order.order_number); // IMP-TRADINGCARDS-20260314-001
//! ```

pub mod config;
pub mod coordinator;
pub mod error;

pub use config::CheckoutConfig;
pub use coordinator::Checkout;
pub use error::{CheckoutError, CheckoutResult, ErrorCode, ErrorResponse};
