//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (u64)       │◄┐ │  id (u64)       │◄──│  order_id       │       │
//! │  │  name           │ │ │  username       │   │  product_id ────┼──┐    │
//! │  │  price          │ │ │  status         │   │  unit_price     │  │    │
//! │  │  quantity       │ │ │  total          │   │  line_total     │  │    │
//! │  └─────────────────┘ │ └─────────────────┘   └─────────────────┘  │    │
//! │                      └── weak reference (may dangle after delete) ┘    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │   OrderStatus   │   │   AuditEntry    │       │
//! │  │  username       │   │  Pending        │   │  username       │       │
//! │  │  password_hash  │   │  Validated      │   │  action         │       │
//! │  │  salt, role     │   │  Cancelled      │   │  success        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity id is a positive integer assigned as `max(existing) + 1`.
//! Ids are never reused while the highest id is still present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (≥ 1).
    pub id: u64,

    /// Display name.
    pub name: String,

    /// Free-form description, may be empty.
    pub description: String,

    /// Unit price (never negative).
    pub price: Money,

    /// Units on hand. Unsigned, so stock can never go below zero.
    pub quantity: u32,
}

/// Input for creating a product. The id is assigned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub quantity: u32,
}

impl NewProduct {
    /// Creates a product draft with an empty description.
    pub fn new(name: impl Into<String>, price: Money, quantity: u32) -> Self {
        NewProduct {
            name: name.into(),
            description: String::new(),
            price,
            quantity,
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Partial product update.
///
/// Every field is optional; unset fields keep their current value.
/// The product id is deliberately absent and can never be rewritten.
///
/// ## Example
/// ```rust
/// use stockroom_core::{Money, ProductUpdate};
///
/// let update = ProductUpdate::default()
///     .price(Money::from_cents(450))
///     .quantity(12);
/// assert!(update.name.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl ProductUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
    }
}

/// Highest id ever removed from one table.
///
/// Persisted so that ids freed by a deletion stay retired even when the
/// deleted row held the largest id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdWatermark {
    /// Table the id belongs to, e.g. `"products"`.
    pub table: String,
    pub highest_removed: u64,
}

// =============================================================================
// User
// =============================================================================

/// Account role. The API layer gates admin routes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["user".to_string(), "admin".to_string()],
            }),
        }
    }
}

/// A registered account, including its credential material.
///
/// Immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// Lowercase hex SHA-256 of `password ‖ salt`.
    pub password_hash: String,
    /// Lowercase hex of 16 random bytes.
    pub salt: String,
    pub created_at: DateTime<Utc>,
    pub role: Role,
}

/// Public view of a [`User`] without hash or salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            created_at: user.created_at,
            role: user.role,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order lifecycle status.
///
/// ## State Machine
/// ```text
///            validate
///   Pending ──────────► Validated
///      │                    │
///      │ cancel             │ cancel (only with CancelPolicy::PendingOrValidated)
///      ▼                    ▼
///   Cancelled ◄─────────────┘
///
///   Cancelled is terminal.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Validated,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Validated => "validated",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(OrderStatus::Pending),
            "validated" => Ok(OrderStatus::Validated),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "pending".to_string(),
                    "validated".to_string(),
                    "cancelled".to_string(),
                ],
            }),
        }
    }
}

/// Which statuses may be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Only pending orders may be cancelled.
    PendingOnly,

    /// Pending and validated orders may be cancelled; stock is restored either way.
    #[default]
    PendingOrValidated,
}

impl CancelPolicy {
    /// Returns true if an order in `status` may be cancelled under this policy.
    pub fn allows(&self, status: OrderStatus) -> bool {
        match status {
            OrderStatus::Pending => true,
            OrderStatus::Validated => matches!(self, CancelPolicy::PendingOrValidated),
            OrderStatus::Cancelled => false,
        }
    }
}

impl FromStr for CancelPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending_only" => Ok(CancelPolicy::PendingOnly),
            "pending_or_validated" => Ok(CancelPolicy::PendingOrValidated),
            _ => Err(ValidationError::NotAllowed {
                field: "cancel_policy".to_string(),
                allowed: vec![
                    "pending_only".to_string(),
                    "pending_or_validated".to_string(),
                ],
            }),
        }
    }
}

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Owner, as authenticated by the caller.
    pub username: String,
    /// When the order was placed.
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    /// Σ line_total of the order's lines. Fixed at placement.
    pub total: Money,
}

/// One line of an order. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: u64,
    pub order_id: u64,
    /// Weak reference: the product may have been deleted since.
    pub product_id: u64,
    pub quantity: u32,
    /// Product price at placement time.
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub line_total: Money,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

// =============================================================================
// Audit
// =============================================================================

/// Authentication events recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Register,
    Login,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Register => "register",
            AuditAction::Login => "login",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "register" => Ok(AuditAction::Register),
            "login" => Ok(AuditAction::Login),
            _ => Err(ValidationError::NotAllowed {
                field: "action".to_string(),
                allowed: vec!["register".to_string(), "login".to_string()],
            }),
        }
    }
}

/// One append-only audit log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub action: AuditAction,
    pub success: bool,
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: usize,
    /// 1-based page number that was served.
    pub page: usize,
    /// Number of pages, `ceil(total / limit)`.
    pub pages: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================
