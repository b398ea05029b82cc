//! # Order Engine
//!
//! Reconciles carts against stock and drives the order state machine over
//! one consistent snapshot of products, orders and order lines.
//!
//! ## Placement: Validate, Then Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      place_order(cart, username)                        │
//! │                                                                         │
//! │  Pass 1: VALIDATE (no mutation)                                        │
//! │  ├── cart empty?                 → EmptyCart                           │
//! │  ├── product id unknown?         → ProductNotFound                     │
//! │  ├── quantity > stock?           → InsufficientStock                   │
//! │  └── line or order total > i64?  → AmountOverflow                      │
//! │           │                                                             │
//! │           │  any error: ledger untouched, nothing to persist           │
//! │           ▼                                                             │
//! │  Pass 2: COMMIT (same snapshot)                                        │
//! │  ├── unit_price = product.price  (snapshot)                            │
//! │  ├── line_total = unit_price × quantity                                │
//! │  ├── product.quantity -= quantity                                      │
//! │  └── order.total = Σ line_total, status = pending                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The caller persists all three tables of the ledger in one commit.

use chrono::{DateTime, Utc};

use crate::cart::Cart;
use crate::catalog::next_id;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CancelPolicy, Order, OrderLine, OrderStatus, PlacedOrder, Product};

/// The three tables the order engine reads and writes together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub lines: Vec<OrderLine>,
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// The order, now cancelled.
    pub order: Order,
    /// `(product_id, quantity)` pairs put back into stock.
    pub restored: Vec<(u64, u32)>,
    /// Product ids that no longer exist; their quantities were dropped.
    pub skipped: Vec<u64>,
}

impl Ledger {
    pub fn new(products: Vec<Product>, orders: Vec<Order>, lines: Vec<OrderLine>) -> Self {
        Ledger {
            products,
            orders,
            lines,
        }
    }

    /// Validates `cart` against current stock and records a pending order.
    ///
    /// On error the ledger is unchanged.
    pub fn place_order(
        &mut self,
        cart: &Cart,
        username: &str,
        placed_at: DateTime<Utc>,
    ) -> CoreResult<PlacedOrder> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        // Pass 1: resolve every line to a product index and check stock.
        let mut plan = Vec::with_capacity(cart.lines().len());
        let mut total = Money::zero();
        for line in cart.lines() {
            let index = self
                .products
                .iter()
                .position(|p| p.id == line.product_id)
                .ok_or(CoreError::ProductNotFound(line.product_id))?;

            let available = self.products[index].quantity;
            if line.quantity > available {
                return Err(CoreError::InsufficientStock {
                    product_id: line.product_id,
                    available,
                    requested: line.quantity,
                });
            }
            let line_total = self.products[index]
                .price
                .checked_multiply_quantity(line.quantity)
                .ok_or(CoreError::AmountOverflow)?;
            total = total
                .checked_add(line_total)
                .ok_or(CoreError::AmountOverflow)?;
            plan.push((index, line.quantity, line_total));
        }

        // Pass 2: nothing below can fail.
        let order_id = next_id(self.orders.iter().map(|o| o.id));
        let mut line_id = next_id(self.lines.iter().map(|l| l.id));
        let mut lines = Vec::with_capacity(plan.len());

        for (index, quantity, line_total) in plan {
            let product = &mut self.products[index];
            let unit_price = product.price;
            product.quantity -= quantity;

            lines.push(OrderLine {
                id: line_id,
                order_id,
                product_id: product.id,
                quantity,
                unit_price,
                line_total,
            });
            line_id += 1;
        }

        let order = Order {
            id: order_id,
            username: username.to_string(),
            date: placed_at,
            status: OrderStatus::Pending,
            total,
        };

        self.orders.push(order.clone());
        self.lines.extend(lines.iter().cloned());

        Ok(PlacedOrder { order, lines })
    }

    /// Cancels an order and returns its quantities to stock.
    ///
    /// Lines whose product has been deleted are skipped and reported in
    /// [`CancelOutcome::skipped`].
    pub fn cancel_order(&mut self, order_id: u64, policy: CancelPolicy) -> CoreResult<CancelOutcome> {
        let index = self.order_index(order_id)?;
        let status = self.orders[index].status;
        if !policy.allows(status) {
            return Err(CoreError::InvalidTransition {
                order_id,
                from: status,
                to: OrderStatus::Cancelled,
            });
        }

        let mut restored = Vec::new();
        let mut skipped = Vec::new();
        for line in self.lines.iter().filter(|l| l.order_id == order_id) {
            match self.products.iter_mut().find(|p| p.id == line.product_id) {
                Some(product) => {
                    product.quantity = product.quantity.saturating_add(line.quantity);
                    restored.push((line.product_id, line.quantity));
                }
                None => skipped.push(line.product_id),
            }
        }

        let order = &mut self.orders[index];
        order.status = OrderStatus::Cancelled;

        Ok(CancelOutcome {
            order: order.clone(),
            restored,
            skipped,
        })
    }

    /// Moves a pending order to validated. Stock is not touched.
    pub fn validate_order(&mut self, order_id: u64) -> CoreResult<Order> {
        let index = self.order_index(order_id)?;
        let order = &mut self.orders[index];

        if order.status != OrderStatus::Pending {
            return Err(CoreError::InvalidTransition {
                order_id,
                from: order.status,
                to: OrderStatus::Validated,
            });
        }

        order.status = OrderStatus::Validated;
        Ok(order.clone())
    }

    /// Looks up an order with its lines.
    pub fn order(&self, order_id: u64) -> Option<PlacedOrder> {
        self.orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|order| self.with_lines(order))
    }

    /// Orders with their lines, optionally only those owned by `username`.
    pub fn orders_for(&self, username: Option<&str>) -> Vec<PlacedOrder> {
        self.orders
            .iter()
            .filter(|o| username.map_or(true, |u| o.username == u))
            .map(|order| self.with_lines(order))
            .collect()
    }

    fn with_lines(&self, order: &Order) -> PlacedOrder {
        PlacedOrder {
            order: order.clone(),
            lines: self
                .lines
                .iter()
                .filter(|l| l.order_id == order.id)
                .cloned()
                .collect(),
        }
    }

    fn order_index(&self, order_id: u64) -> CoreResult<usize> {
        self.orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(CoreError::OrderNotFound(order_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
