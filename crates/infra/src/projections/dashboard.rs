//! Dashboard figures, derived on read from the item and order views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use wms_outbound::OrderStatus;

use super::inventory::ItemView;
use super::orders::OrderView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_items: usize,
    pub total_on_hand: i64,
    /// Every status is present, zero counts included.
    pub orders_by_status: BTreeMap<OrderStatus, usize>,
    /// Mean of `shipped_at - created_at` over shipped orders, two decimals.
    pub avg_fulfillment_hours: Option<f64>,
    pub low_stock: Vec<ItemView>,
}

pub fn summarize(items: &[ItemView], orders: &[OrderView]) -> DashboardSummary {
    let mut orders_by_status: BTreeMap<OrderStatus, usize> =
        OrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for order in orders {
        *orders_by_status.entry(order.status).or_default() += 1;
    }

    let hours: Vec<f64> = orders.iter().filter_map(OrderView::fulfillment_hours).collect();
    let avg_fulfillment_hours = if hours.is_empty() {
        None
    } else {
        let mean = hours.iter().sum::<f64>() / hours.len() as f64;
        Some((mean * 100.0).round() / 100.0)
    };

    let mut low_stock: Vec<ItemView> = items.iter().filter(|i| i.low_stock).cloned().collect();
    low_stock.sort_by(|a, b| a.sku.cmp(&b.sku));

    DashboardSummary {
        total_items: items.len(),
        total_on_hand: items.iter().map(|i| i.on_hand).sum(),
        orders_by_status,
        avg_fulfillment_hours,
        low_stock,
    }
}
