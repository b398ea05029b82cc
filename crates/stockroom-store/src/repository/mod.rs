//! # Repository Module
//!
//! Async, lock-holding wrappers around the pure rules in `stockroom-core`.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Operation, End to End                            │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  store.orders().place("ana", &cart)                            │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │       │  tx = store.begin()          (writer lock held from here)      │
//! │       │  tx.load::<Product>() ...    (snapshot of each table)          │
//! │       ▼                                                                 │
//! │  stockroom_core::Ledger::place_order(...)   pure, no I/O               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tx.stage(..) × 3, tx.commit()       (journaled, lock released)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`] - Product CRUD and paging
//! - [`CredentialRepository`] - Registration, login, admin bootstrap
//! - [`OrderRepository`] - Place, validate, cancel, list orders
//! - [`StatsRepository`] - Sales figures over validated orders
//! - [`AuditLog`] - Append-only authentication log

pub mod audit;
pub mod catalog;
pub mod credentials;
pub mod orders;
pub mod stats;

pub use audit::AuditLog;
pub use catalog::CatalogRepository;
pub use credentials::CredentialRepository;
pub use orders::OrderRepository;
pub use stats::StatsRepository;
