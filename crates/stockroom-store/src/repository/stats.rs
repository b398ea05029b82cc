//! # Stats Repository
//!
//! Read-only sales figures. Every report reads its tables under one lock
//! acquisition so the figures come from a single consistent state.

use tracing::debug;

use stockroom_core::stats::{self, DailyRevenue, Overview, SalesSummary, TopProduct};
use stockroom_core::{Order, OrderLine, Product, User};

use crate::error::StoreResult;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct StatsRepository {
    store: Store,
}

impl StatsRepository {
    pub fn new(store: Store) -> Self {
        StatsRepository { store }
    }

    /// Validated-order totals plus catalog size and stock value.
    pub async fn summary(&self) -> StoreResult<SalesSummary> {
        let tx = self.store.begin().await;
        let products: Vec<Product> = tx.load().await?;
        let orders: Vec<Order> = tx.load().await?;
        let lines: Vec<OrderLine> = tx.load().await?;

        Ok(stats::summarize(&products, &orders, &lines))
    }

    /// Best sellers by units in validated orders. `None` uses the configured
    /// ranking length.
    ///
    /// Products deleted from the catalog are left out of the ranking.
    pub async fn top_products(&self, limit: Option<usize>) -> StoreResult<Vec<TopProduct>> {
        let limit = limit.unwrap_or(self.store.config().reports.top_products);

        let tx = self.store.begin().await;
        let products: Vec<Product> = tx.load().await?;
        let orders: Vec<Order> = tx.load().await?;
        let lines: Vec<OrderLine> = tx.load().await?;

        let sellers = stats::top_products(&products, &orders, &lines, limit);
        if !sellers.unresolved.is_empty() {
            let units: u64 = sellers.unresolved.iter().map(|(_, units)| units).sum();
            debug!(
                products = ?sellers.unresolved,
                units,
                "Sold products no longer in catalog left out of ranking"
            );
        }
        Ok(sellers.ranking)
    }

    /// Validated revenue per UTC calendar day, oldest first.
    pub async fn daily_revenue(&self) -> StoreResult<Vec<DailyRevenue>> {
        let tx = self.store.begin().await;
        let orders: Vec<Order> = tx.load().await?;
        Ok(stats::daily_revenue(&orders))
    }

    /// Admin dashboard counters.
    pub async fn overview(&self) -> StoreResult<Overview> {
        let tx = self.store.begin().await;
        let products: Vec<Product> = tx.load().await?;
        let orders: Vec<Order> = tx.load().await?;
        let users: Vec<User> = tx.load().await?;

        Ok(stats::overview(&products, &orders, users.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use stockroom_core::{Cart, Money, NewProduct};

    async fn sell(store: &Store, product_id: u64, quantity: u32, validate: bool) {
        let cart = Cart::from_pairs([(product_id, quantity)]).unwrap();
        let placed = store.orders().place("ana", &cart).await.unwrap();
        if validate {
            store.orders().validate(placed.order.id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_reports_count_only_validated_orders() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_with(StoreConfig::with_data_dir(dir.path()), None)
            .await
            .unwrap();
        let pen = store
            .catalog()
            .add(NewProduct::new("Pen", Money::from_cents(100), 20))
            .await
            .unwrap();
        let ink = store
            .catalog()
            .add(NewProduct::new("Ink", Money::from_cents(500), 20))
            .await
            .unwrap();

        sell(&store, pen.id, 3, true).await;
        sell(&store, ink.id, 5, true).await;
        sell(&store, pen.id, 9, false).await;

        let summary = store.stats().summary().await.unwrap();
        assert_eq!(summary.validated_orders, 2);
        assert_eq!(summary.units_sold, 8);
        assert_eq!(summary.revenue, Money::from_cents(300 + 2500));

        let top = store.stats().top_products(Some(1)).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].product_id, ink.id);
        assert_eq!(top[0].units_sold, 5);

        let overview = store.stats().overview().await.unwrap();
        assert_eq!(overview.order_count, 3);
        assert_eq!(overview.pending_orders, 1);
        assert_eq!(overview.stock_units, 17 + 15);

        let days = store.stats().daily_revenue().await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].orders, 2);
    }

    #[tokio::test]
    async fn test_top_products_drops_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_with(StoreConfig::with_data_dir(dir.path()), None)
            .await
            .unwrap();
        let pen = store
            .catalog()
            .add(NewProduct::new("Pen", Money::from_cents(100), 20))
            .await
            .unwrap();
        let ink = store
            .catalog()
            .add(NewProduct::new("Ink", Money::from_cents(100), 20))
            .await
            .unwrap();

        sell(&store, ink.id, 7, true).await;
        sell(&store, pen.id, 2, true).await;
        store.catalog().remove(ink.id).await.unwrap();

        let top = store.stats().top_products(None).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Pen");

        // Deleted product units still count in the summary
        assert_eq!(store.stats().summary().await.unwrap().units_sold, 9);
    }
}
