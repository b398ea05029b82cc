//! # Sales Statistics
//!
//! Read-only aggregates over a snapshot. Only **validated** orders count as
//! sales; pending and cancelled orders are ignored everywhere except the
//! admin [`Overview`] status counters.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::stock_value;
use crate::money::Money;
use crate::types::{Order, OrderLine, OrderStatus, Product};

/// Headline sales and catalog figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    /// Number of validated orders.
    pub validated_orders: usize,
    /// Σ total of validated orders.
    pub revenue: Money,
    /// Σ line quantity of validated orders, deleted products included.
    pub units_sold: u64,
    /// Products currently in the catalog.
    pub product_count: usize,
    /// Σ price × quantity over the catalog.
    pub stock_value: Money,
}

/// One entry of the top-seller ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: u64,
    pub name: String,
    pub units_sold: u64,
    pub revenue: Money,
}

/// Top-seller ranking plus what could not be ranked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopSellers {
    pub ranking: Vec<TopProduct>,
    /// Sold product ids missing from the catalog, with their unit counts.
    pub unresolved: Vec<(u64, u64)>,
}

/// Revenue of validated orders on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub orders: usize,
    pub revenue: Money,
}

/// Admin dashboard counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub product_count: usize,
    pub stock_units: u64,
    pub stock_value: Money,
    pub order_count: usize,
    pub pending_orders: usize,
    pub validated_orders: usize,
    pub cancelled_orders: usize,
    /// Same figure as [`SalesSummary::revenue`].
    pub revenue: Money,
    pub user_count: usize,
}

fn validated_ids(orders: &[Order]) -> HashSet<u64> {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Validated)
        .map(|o| o.id)
        .collect()
}

fn validated_revenue(orders: &[Order]) -> Money {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Validated)
        .map(|o| o.total)
        .sum()
}

/// Computes the headline figures.
pub fn summarize(products: &[Product], orders: &[Order], lines: &[OrderLine]) -> SalesSummary {
    let validated = validated_ids(orders);

    SalesSummary {
        validated_orders: validated.len(),
        revenue: validated_revenue(orders),
        units_sold: lines
            .iter()
            .filter(|l| validated.contains(&l.order_id))
            .map(|l| u64::from(l.quantity))
            .sum(),
        product_count: products.len(),
        stock_value: stock_value(products),
    }
}

/// Ranks products by units sold in validated orders.
///
/// ## Algorithm
/// ```text
/// 1. Group validated lines by product_id, first-seen order preserved
/// 2. Join with the catalog for names; ids not found go to `unresolved`
/// 3. Stable sort by units_sold descending (ties keep first-seen order)
/// 4. Keep the first `limit`
/// ```
pub fn top_products(
    products: &[Product],
    orders: &[Order],
    lines: &[OrderLine],
    limit: usize,
) -> TopSellers {
    let validated = validated_ids(orders);

    let mut grouped: Vec<(u64, u64, Money)> = Vec::new();
    let mut slots: HashMap<u64, usize> = HashMap::new();
    for line in lines.iter().filter(|l| validated.contains(&l.order_id)) {
        let slot = *slots.entry(line.product_id).or_insert_with(|| {
            grouped.push((line.product_id, 0, Money::zero()));
            grouped.len() - 1
        });
        let entry = &mut grouped[slot];
        entry.1 += u64::from(line.quantity);
        entry.2 += line.line_total;
    }

    let mut sellers = TopSellers::default();
    for (product_id, units_sold, revenue) in grouped {
        match products.iter().find(|p| p.id == product_id) {
            Some(product) => sellers.ranking.push(TopProduct {
                product_id,
                name: product.name.clone(),
                units_sold,
                revenue,
            }),
            None => sellers.unresolved.push((product_id, units_sold)),
        }
    }

    sellers.ranking.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
    sellers.ranking.truncate(limit);
    sellers
}

/// Validated revenue grouped by calendar day, oldest first.
pub fn daily_revenue(orders: &[Order]) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (usize, Money)> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.status == OrderStatus::Validated) {
        let day = days.entry(order.date.date_naive()).or_default();
        day.0 += 1;
        day.1 += order.total;
    }

    days.into_iter()
        .map(|(date, (orders, revenue))| DailyRevenue {
            date,
            orders,
            revenue,
        })
        .collect()
}

/// Builds the admin dashboard counters.
pub fn overview(products: &[Product], orders: &[Order], user_count: usize) -> Overview {
    let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();

    Overview {
        product_count: products.len(),
        stock_units: products.iter().map(|p| u64::from(p.quantity)).sum(),
        stock_value: stock_value(products),
        order_count: orders.len(),
        pending_orders: count(OrderStatus::Pending),
        validated_orders: count(OrderStatus::Validated),
        cancelled_orders: count(OrderStatus::Cancelled),
        revenue: validated_revenue(orders),
        user_count,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
