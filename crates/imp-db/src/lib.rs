//! # imp-db: Storage Layer for Order Placement
//!
//! SQLite storage for the checkout core, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Placement Data Flow                        │
//! │                                                                         │
//! │  imp-checkout (Checkout::place_order)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     imp-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌──────────────────┐  ┌──────────────┐   │   │
//! │  │   │   Database    │  │ OrderTransaction │  │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │  │ (write side)     │  │  (embedded)  │   │   │
//! │  │   │               │  ├──────────────────┤  │              │   │   │
//! │  │   │ SqlitePool    │◄─│ Repositories     │  │ 001_initial_ │   │   │
//! │  │   │ busy_timeout  │  │ (read side)      │  │ schema.sql   │   │   │
//! │  │   └───────────────┘  └──────────────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, stock, orders, ...)
//! - [`transaction`] - The order placement unit of work
//!
//! ## Usage
//!
//! ```rust,ignore
//! use imp_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/imp.db")).await?;
//!
//! let mut tx = db.begin_order_transaction().await?;
//! let seq = tx.next_order_sequence("IMP-CARDS-20260314", Utc::now()).await?;
//! // ... inserts ...
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use transaction::OrderTransaction;

// Repository re-exports for convenience
pub use repository::catalog::{CatalogRepository, NewProduct};
pub use repository::counter::CounterRepository;
pub use repository::discount::DiscountCodeRepository;
pub use repository::order::OrderRepository;
pub use repository::stock::StockRepository;
pub use repository::vat::VatRepository;
