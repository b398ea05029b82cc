//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Taxonomy the API layer maps to status codes    │
//! │                                                                         │
//! │  stockroom-store errors (separate crate)                               │
//! │  └── StoreError       - File, CSV and journal failures                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → API layer            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product ID, username, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each variant reports its [`ErrorKind`]

use serde::Serialize;
use thiserror::Error;

use crate::types::OrderStatus;
use crate::validation::PasswordRule;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse error taxonomy shared by every operation.
///
/// ## Mapping
/// ```text
/// NotFound              → unknown product / order / user
/// ValidationFailure     → empty cart, weak password, bad input
/// ConflictFailure       → insufficient stock, invalid transition, duplicate user
/// AuthFailure           → wrong password, breached password
/// DependencyUnavailable → breach-check service down (never surfaced by register)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    ValidationFailure,
    ConflictFailure,
    AuthFailure,
    DependencyUnavailable,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They replace the
/// "(success flag, message)" pairs a caller would otherwise have to parse:
/// the `Display` text is the human-readable message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id does not resolve in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    /// Order id does not resolve.
    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    /// Username is not registered.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// Not enough stock to satisfy a cart line.
    ///
    /// ## User Workflow
    /// ```text
    /// Place order (product 3, qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 3, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Nothing is written: the whole order is rejected
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: u64,
        available: u32,
        requested: u32,
    },

    /// The order state machine does not allow this move.
    #[error("Order {order_id} is {from}, cannot become {to}")]
    InvalidTransition {
        order_id: u64,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// An order needs at least one line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// A line total or order total does not fit the money range.
    #[error("Order amount is too large")]
    AmountOverflow,

    /// Username already taken (exact, case-sensitive match).
    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    /// Password misses one or more strength rules. All misses are listed.
    #[error("Weak password: {}", join_rules(.0))]
    WeakPassword(Vec<PasswordRule>),

    /// Password appears in a breach corpus.
    #[error("Password has appeared in {occurrences} known data breaches")]
    CompromisedPassword { occurrences: u64 },

    /// Password does not match the stored hash.
    #[error("Incorrect password")]
    BadPassword,

    /// An administrator account already exists.
    #[error("An administrator account already exists")]
    AdminAlreadyExists,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::UnknownUser(_) => ErrorKind::NotFound,

            CoreError::InsufficientStock { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::DuplicateUser(_)
            | CoreError::AdminAlreadyExists => ErrorKind::ConflictFailure,

            CoreError::BadPassword | CoreError::CompromisedPassword { .. } => {
                ErrorKind::AuthFailure
            }

            CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::AmountOverflow
            | CoreError::WeakPassword(_)
            | CoreError::Validation(_) => ErrorKind::ValidationFailure,
        }
    }
}

fn join_rules(rules: &[PasswordRule]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Invalid format (e.g., malformed decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
