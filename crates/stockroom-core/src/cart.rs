//! # Cart
//!
//! The list of `(product_id, quantity)` pairs a customer submits as one order.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  add(3, 2)  ──► lines: [(3, 2)]                                        │
//! │  add(5, 1)  ──► lines: [(3, 2), (5, 1)]                                │
//! │  add(3, 4)  ──► lines: [(3, 6), (5, 1)]   ← merged, never duplicated   │
//! │  set_quantity(5, 0) ──► lines: [(3, 6)]                                │
//! │                                                                         │
//! │  The order engine checks each line against stock exactly once,         │
//! │  so merging here is what makes the stock check sound.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_quantity;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// One requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: u64,
    pub quantity: u32,
}

/// A cart whose lines are unique by `product_id`.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product sums quantities)
/// - Each quantity is in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_LINES` lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Builds a cart from raw pairs, merging repeated product ids.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::Cart;
    ///
    /// let cart = Cart::from_pairs([(1, 2), (2, 1), (1, 3)]).unwrap();
    /// assert_eq!(cart.lines().len(), 2);
    /// assert_eq!(cart.quantity_of(1), 5);
    /// ```
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, u32)>) -> CoreResult<Self> {
        let mut cart = Cart::new();
        for (product_id, quantity) in pairs {
            cart.add(product_id, quantity)?;
        }
        Ok(cart)
    }

    /// Adds a product to the cart or increases its quantity if already present.
    pub fn add(&mut self, product_id: u64, quantity: u32) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            let merged = line.quantity.saturating_add(quantity);
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = merged;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine {
            product_id,
            quantity,
        });
        Ok(())
    }

    /// Replaces the quantity of a line. Zero removes the line.
    ///
    /// Unknown product ids are ignored.
    pub fn set_quantity(&mut self, product_id: u64, quantity: u32) -> CoreResult<()> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }

        validate_quantity(quantity)?;
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Removes a line. Returns true if a line was removed.
    pub fn remove(&mut self, product_id: u64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Quantity requested for a product (0 if absent).
    pub fn quantity_of(&self, product_id: u64) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add(1, 2).unwrap();
        cart.add(2, 1).unwrap();
        cart.add(1, 3).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.quantity_of(1), 5);
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn test_add_rejects_bad_quantities() {
        let mut cart = Cart::new();
        assert!(matches!(cart.add(1, 0), Err(CoreError::Validation(_))));
        assert!(matches!(cart.add(1, 1000), Err(CoreError::Validation(_))));

        cart.add(1, 999).unwrap();
        assert!(matches!(
            cart.add(1, 1),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));
        assert_eq!(cart.quantity_of(1), 999);
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::new();
        for id in 0..MAX_CART_LINES as u64 {
            cart.add(id, 1).unwrap();
        }
        assert!(matches!(
            cart.add(10_000, 1),
            Err(CoreError::CartTooLarge { .. })
        ));
        // Existing lines can still grow
        assert!(cart.add(0, 1).is_ok());
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::from_pairs([(1, 2), (2, 2)]).unwrap();
        cart.set_quantity(1, 7).unwrap();
        assert_eq!(cart.quantity_of(1), 7);

        cart.set_quantity(2, 0).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert!(!cart.remove(2));

        cart.clear();
        assert!(cart.is_empty());
    }
}
