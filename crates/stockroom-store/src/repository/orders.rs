//! # Order Repository
//!
//! Places, validates and cancels orders across `products.csv`,
//! `orders.csv` and `order_lines.csv`.
//!
//! ## What Each Operation Writes
//! ```text
//! ┌──────────────┬──────────────┬────────────┬─────────────────┐
//! │ operation    │ products.csv │ orders.csv │ order_lines.csv │
//! ├──────────────┼──────────────┼────────────┼─────────────────┤
//! │ place        │      ✓       │     ✓      │        ✓        │
//! │ cancel       │      ✓       │     ✓      │                 │
//! │ validate     │              │     ✓      │                 │
//! └──────────────┴──────────────┴────────────┴─────────────────┘
//! ```
//!
//! Each row above is a single journaled commit made while the writer lock
//! is held, so a stock check and its decrement can't interleave with
//! another order.

use chrono::Utc;
use tracing::{debug, info};

use stockroom_core::{CancelOutcome, Cart, Ledger, Order, OrderLine, PlacedOrder, Product};

use crate::error::StoreResult;
use crate::store::{Store, Transaction};

/// Repository for order operations.
///
/// ## Usage
/// ```rust,ignore
/// let mut cart = Cart::new();
/// cart.add(1, 4)?;
///
/// let placed = store.orders().place("ana", &cart).await?;
/// store.orders().validate(placed.order.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    store: Store,
}

async fn load_ledger(tx: &Transaction<'_>) -> StoreResult<Ledger> {
    let products: Vec<Product> = tx.load().await?;
    let orders: Vec<Order> = tx.load().await?;
    let lines: Vec<OrderLine> = tx.load().await?;
    Ok(Ledger::new(products, orders, lines))
}

impl OrderRepository {
    pub fn new(store: Store) -> Self {
        OrderRepository { store }
    }

    /// Checks `cart` against current stock and records a pending order.
    ///
    /// ## Errors
    /// * `EmptyCart` - no lines
    /// * `ProductNotFound` - a line names an unknown product
    /// * `InsufficientStock` - a line asks for more than is on hand
    ///
    /// Nothing is written on error.
    pub async fn place(&self, username: &str, cart: &Cart) -> StoreResult<PlacedOrder> {
        let mut tx = self.store.begin().await;
        let mut ledger = load_ledger(&tx).await?;

        let placed = ledger.place_order(cart, username, Utc::now())?;

        tx.stage(&ledger.products)?;
        tx.stage(&ledger.orders)?;
        tx.stage(&ledger.lines)?;
        tx.commit().await?;

        info!(
            order_id = placed.order.id,
            username = %username,
            lines = placed.lines.len(),
            total = %placed.order.total,
            "Order placed"
        );
        Ok(placed)
    }

    /// Cancels an order under the configured [`CancelPolicy`] and puts its
    /// quantities back into stock.
    ///
    /// [`CancelPolicy`]: stockroom_core::CancelPolicy
    pub async fn cancel(&self, order_id: u64) -> StoreResult<CancelOutcome> {
        let policy = self.store.config().orders.cancel_policy;

        let mut tx = self.store.begin().await;
        let mut ledger = load_ledger(&tx).await?;

        let outcome = ledger.cancel_order(order_id, policy)?;

        tx.stage(&ledger.products)?;
        tx.stage(&ledger.orders)?;
        tx.commit().await?;

        for product_id in &outcome.skipped {
            debug!(order_id, product_id, "Product no longer in catalog, stock not restored");
        }
        info!(
            order_id,
            restored = outcome.restored.len(),
            skipped = outcome.skipped.len(),
            "Order cancelled"
        );
        Ok(outcome)
    }

    /// Moves a pending order to validated. Stock is untouched.
    pub async fn validate(&self, order_id: u64) -> StoreResult<Order> {
        let mut tx = self.store.begin().await;
        let mut ledger = load_ledger(&tx).await?;

        let order = ledger.validate_order(order_id)?;

        tx.stage(&ledger.orders)?;
        tx.commit().await?;

        info!(order_id, total = %order.total, "Order validated");
        Ok(order)
    }

    /// Looks up an order with its lines.
    pub async fn get(&self, order_id: u64) -> StoreResult<Option<PlacedOrder>> {
        let tx = self.store.begin().await;
        let ledger = load_ledger(&tx).await?;
        Ok(ledger.order(order_id))
    }

    /// Every order with its lines, or only those placed by `username`.
    pub async fn list(&self, username: Option<&str>) -> StoreResult<Vec<PlacedOrder>> {
        let tx = self.store.begin().await;
        let ledger = load_ledger(&tx).await?;
        let orders = ledger.orders_for(username);
        debug!(count = orders.len(), username = ?username, "Listed orders");
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::StoreError;
    use stockroom_core::{CancelPolicy, CoreError, Money, NewProduct, OrderStatus};

    async fn store_with(dir: &std::path::Path, policy: CancelPolicy) -> Store {
        let config = StoreConfig::with_data_dir(dir).cancel_policy(policy);
        Store::open_with(config, None).await.unwrap()
    }

    async fn stocked(store: &Store, quantity: u32, cents: i64) -> Product {
        store
            .catalog()
            .add(NewProduct::new("Stapler", Money::from_cents(cents), quantity))
            .await
            .unwrap()
    }

    fn cart(pairs: &[(u64, u32)]) -> Cart {
        Cart::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn test_place_decrements_stock_and_persists_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), CancelPolicy::default()).await;
        let product = stocked(&store, 10, 200).await;

        let placed = store
            .orders()
            .place("ana", &cart(&[(product.id, 4)]))
            .await
            .unwrap();

        assert_eq!(placed.order.total, Money::from_cents(800));
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.lines.len(), 1);
        assert_eq!(
            store.catalog().get(product.id).await.unwrap().unwrap().quantity,
            6
        );
        assert_eq!(
            store.orders().get(placed.order.id).await.unwrap(),
            Some(placed)
        );
    }

    #[tokio::test]
    async fn test_failed_place_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), CancelPolicy::default()).await;
        let product = stocked(&store, 3, 100).await;

        let err = store
            .orders()
            .place("ana", &cart(&[(product.id, 1), (99, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(CoreError::ProductNotFound(99))));

        assert_eq!(
            store.catalog().get(product.id).await.unwrap().unwrap().quantity,
            3
        );
        assert!(store.orders().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validated_cancel_respects_policy() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), CancelPolicy::PendingOnly).await;
        let product = stocked(&store, 5, 100).await;

        let placed = store
            .orders()
            .place("ana", &cart(&[(product.id, 2)]))
            .await
            .unwrap();
        store.orders().validate(placed.order.id).await.unwrap();

        assert!(matches!(
            store.orders().cancel(placed.order.id).await,
            Err(StoreError::Domain(CoreError::InvalidTransition { .. }))
        ));
        assert_eq!(
            store.catalog().get(product.id).await.unwrap().unwrap().quantity,
            3
        );
    }

    #[tokio::test]
    async fn test_cancel_skips_deleted_product() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), CancelPolicy::default()).await;
        let kept = stocked(&store, 5, 100).await;
        let gone = stocked(&store, 5, 100).await;

        let placed = store
            .orders()
            .place("ana", &cart(&[(kept.id, 1), (gone.id, 2)]))
            .await
            .unwrap();
        store.catalog().remove(gone.id).await.unwrap();

        let outcome = store.orders().cancel(placed.order.id).await.unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        assert_eq!(outcome.restored, vec![(kept.id, 1)]);
        assert_eq!(outcome.skipped, vec![gone.id]);
        assert_eq!(store.catalog().get(kept.id).await.unwrap().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(dir.path(), CancelPolicy::default()).await;
        let product = stocked(&store, 10, 100).await;

        store.orders().place("ana", &cart(&[(product.id, 1)])).await.unwrap();
        store.orders().place("bob", &cart(&[(product.id, 1)])).await.unwrap();
        store.orders().place("ana", &cart(&[(product.id, 1)])).await.unwrap();

        assert_eq!(store.orders().list(None).await.unwrap().len(), 3);
        let ana = store.orders().list(Some("ana")).await.unwrap();
        assert_eq!(ana.len(), 2);
        assert!(ana.iter().all(|p| p.order.username == "ana"));
    }
}
