//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Read side                          Write side                          │
//! │                                                                         │
//! │  db.orders().get_by_number(..)      db.begin_order_transaction()        │
//! │  db.stock().get(..)                     │                               │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  XxxRepository { pool }             OrderTransaction { tx }             │
//! │       │                                 │                               │
//! │       └──────────► shared statement functions ◄──┘                      │
//! │                    (generic over sqlx::Executor)                        │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                    SQLite Database                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Categories and product snapshots
//! - [`stock::StockRepository`] - Stock levels
//! - [`discount::DiscountCodeRepository`] - Discount codes
//! - [`order::OrderRepository`] - Orders and order items
//! - [`vat::VatRepository`] - VAT records
//! - [`counter::CounterRepository`] - Order number counters

pub mod catalog;
pub mod counter;
pub mod discount;
pub mod order;
pub mod stock;
pub mod vat;
