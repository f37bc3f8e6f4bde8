//! Demo data for an empty warehouse.

use anyhow::Context;
use serde_json::Value as JsonValue;

use wms_auth::Role;
use wms_events::{EventBus, EventEnvelope};

use crate::event_store::EventStore;
use crate::workflow::{NewItem, WarehouseService};

const ITEMS: [(&str, &str, &str, &str, i64, i64); 3] = [
    ("SKU-001", "Cardboard Box Small", "1000001", "A1-01", 20, 100),
    ("SKU-002", "Bubble Wrap 50m", "1000002", "A1-02", 10, 25),
    ("SKU-003", "Packing Tape", "1000003", "B1-01", 15, 60),
];

const ADMIN: (&str, &str) = ("admin", "admin123");

const STAFF: [(&str, &str, Role); 2] = [
    ("supervisor", "super123", Role::Supervisor),
    ("picker", "picker123", Role::Picker),
];

/// Seed the first admin, then items, one receipt, one order and the
/// remaining default users.
///
/// Does nothing (and returns `false`) when the store already has history.
pub fn seed_demo<S, B>(service: &WarehouseService<S, B>) -> anyhow::Result<bool>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    if !service.is_empty().context("checking for existing data")? {
        tracing::info!("store not empty; skipping demo seed");
        return Ok(false);
    }

    let (username, password) = ADMIN;
    let admin = service
        .bootstrap_admin(username, password)
        .with_context(|| format!("seeding user {username}"))?;

    for (sku, name, barcode, bin, reorder_point, on_hand) in ITEMS {
        service
            .create_item(&admin, NewItem {
                sku: sku.to_string(),
                name: name.to_string(),
                barcode: Some(barcode.to_string()),
                bin_location: Some(bin.to_string()),
                reorder_point,
                opening_stock: on_hand,
            })
            .with_context(|| format!("seeding item {sku}"))?;
    }

    service
        .create_receipt(&admin, "RCPT-001", Some("Acme Supplies".to_string()))
        .context("seeding RCPT-001")?;
    for (sku, qty) in [("SKU-001", 50), ("SKU-002", 10)] {
        service
            .add_receipt_line(&admin, "RCPT-001", sku, qty)
            .with_context(|| format!("seeding RCPT-001 line {sku}"))?;
    }

    service
        .create_order(&admin, "ORD-001", Some("PT Nusantara".to_string()))
        .context("seeding ORD-001")?;
    for (sku, qty) in [("SKU-001", 5), ("SKU-003", 2)] {
        service
            .add_order_line(&admin, "ORD-001", sku, qty)
            .with_context(|| format!("seeding ORD-001 line {sku}"))?;
    }

    for (username, password, role) in STAFF {
        service
            .create_user(&admin, username, password, role)
            .with_context(|| format!("seeding user {username}"))?;
    }

    tracing::info!(items = ITEMS.len(), users = STAFF.len() + 1, "demo data seeded");
    Ok(true)
}
