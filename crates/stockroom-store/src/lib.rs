//! # stockroom-store: Flat-File Storage for Stockroom
//!
//! Persists the catalog, accounts, orders and audit log as CSV tables in
//! one data directory, and runs every operation as an atomic
//! load-mutate-save cycle.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Caller (HTTP layer, CLI, tests)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 stockroom-store (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Store      │    │ Repositories  │    │   Journal    │  │   │
//! │  │   │  (store.rs)   │    │               │    │ (journal.rs) │  │   │
//! │  │   │               │    │ Catalog       │    │              │  │   │
//! │  │   │ writer lock   │◄───│ Credentials   │───►│ staged files │  │   │
//! │  │   │ Transaction   │    │ Orders, Stats │    │ commit point │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                                ▼                               │   │
//! │  │                      stockroom-core (pure rules)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  data_dir/  products.csv  users.csv  orders.csv  ...           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - Store handle, writer lock and transactions
//! - [`tables`] - CSV codec with exact header checks
//! - [`journal`] - Crash-safe multi-table commits
//! - [`breach`] - Breached-password range client
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Storage error types
//! - [`repository`] - Catalog, credential, order, stats and audit repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_store::{Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::load_or_default(None)).await?;
//!
//! store.credentials().register("ana", "Abcdef12").await?;
//! let placed = store.orders().place("ana", &cart).await?;
//! let top = store.stats().top_products(None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod breach;
pub mod config;
pub mod error;
pub mod journal;
pub mod repository;
pub mod store;
pub mod tables;

// =============================================================================
// Re-exports
// =============================================================================

pub use breach::{BreachCheck, BreachCheckError, BreachVerdict, PwnedRangeClient};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use journal::Recovery;
pub use store::{Store, Transaction};

// Repository re-exports for convenience
pub use repository::{
    AuditLog, CatalogRepository, CredentialRepository, OrderRepository, StatsRepository,
};
