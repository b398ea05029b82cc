//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds every business rule of the inventory and order backend
//! as pure functions over in-memory snapshots. It never touches a file,
//! socket or clock; callers hand it the data and the current time.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              API layer (routing, tokens, roles)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-store (repositories)                  │   │
//! │  │     load snapshot ──► call core ──► journaled commit            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌────────┐ ┌────────┐ ┌─────────────┐ ┌────────┐  │   │
//! │  │  │ catalog │ │  cart  │ │ orders │ │ credentials │ │ stats  │  │   │
//! │  │  └─────────┘ └────────┘ └────────┘ └─────────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO NETWORK • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, User, Order, OrderLine, AuditEntry)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types and the error-kind taxonomy
//! - [`validation`] - Input and password rules
//! - [`cart`] - Cart with merged lines
//! - [`catalog`] - Product list operations and pagination
//! - [`orders`] - Order reconciliation against stock
//! - [`credentials`] - Salted hashing and constant-time verification
//! - [`stats`] - Sales aggregates and top sellers
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price: Money = "12.99".parse().unwrap();
//! assert_eq!(price.cents(), 1299);
//! assert_eq!(price.multiply_quantity(2).to_string(), "25.98");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod money;
pub mod orders;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use orders::{CancelOutcome, Ledger};
pub use types::*;
pub use validation::PasswordRule;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct product lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single product in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Highest accepted unit price, in cents (1,000,000.00).
///
/// Keeps `price × MAX_ITEM_QUANTITY × MAX_CART_LINES` far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Length of the top-seller ranking when a caller does not ask for one.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;
