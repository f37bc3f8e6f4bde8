use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use wms_events::EventEnvelope;
use wms_inventory::{ItemEvent, ItemId, MovementSource};

use super::{ProjectionCursorStore, ProjectionError, admit};
use crate::read_model::KeyedStore;
use crate::streams;

const PROJECTION: &str = "inventory";

/// Queryable item row: current stock and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub item_id: ItemId,
    pub sku: String,
    pub name: String,
    pub barcode: Option<String>,
    pub bin_location: Option<String>,
    pub reorder_point: i64,
    pub on_hand: i64,
    pub low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemView {
    fn matches(&self, needle: &str) -> bool {
        self.sku.to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self
                .barcode
                .as_deref()
                .is_some_and(|b| b.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Opening,
    Received,
    Picked,
}

/// One ledger line. `qty` is signed: picks are negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementView {
    pub sequence_number: u64,
    pub kind: MovementKind,
    pub qty: i64,
    pub on_hand_after: i64,
    pub source: Option<MovementSource>,
    pub occurred_at: DateTime<Utc>,
}

/// Current stock per item plus the movement history behind it.
pub struct InventoryProjection<S, M> {
    items: S,
    movements: M,
    cursors: Arc<dyn ProjectionCursorStore>,
}

impl<S, M> InventoryProjection<S, M>
where
    S: KeyedStore<ItemId, ItemView>,
    M: KeyedStore<ItemId, Vec<MovementView>>,
{
    pub fn new(items: S, movements: M, cursors: Arc<dyn ProjectionCursorStore>) -> Self {
        Self {
            items,
            movements,
            cursors,
        }
    }

    pub fn get(&self, item_id: &ItemId) -> Option<ItemView> {
        self.items.get(item_id)
    }

    /// All items ordered by SKU.
    pub fn list(&self) -> Vec<ItemView> {
        let mut items = self.items.list();
        items.sort_by(|a, b| a.sku.cmp(&b.sku));
        items
    }

    /// Case-insensitive substring search over SKU, name and barcode.
    pub fn search(&self, query: &str) -> Vec<ItemView> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.list();
        }
        self.list().into_iter().filter(|i| i.matches(&needle)).collect()
    }

    /// Items at or below their reorder point, ordered by SKU.
    pub fn low_stock(&self) -> Vec<ItemView> {
        self.list().into_iter().filter(|i| i.low_stock).collect()
    }

    pub fn movements(&self, item_id: &ItemId) -> Vec<MovementView> {
        self.movements.get(item_id).unwrap_or_default()
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != streams::ITEM {
            return Ok(());
        }
        if !admit(self.cursors.as_ref(), PROJECTION, envelope)? {
            return Ok(());
        }

        let event: ItemEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;
        let item_id = match &event {
            ItemEvent::ItemCreated(e) => e.item_id,
            ItemEvent::ItemDetailsUpdated(e) => e.item_id,
            ItemEvent::StockReceived(e) => e.item_id,
            ItemEvent::StockPicked(e) => e.item_id,
        };
        if item_id.0 != envelope.aggregate_id() {
            return Err(ProjectionError::StreamMismatch(
                "event item_id does not match envelope aggregate_id".to_string(),
            ));
        }

        let seq = envelope.sequence_number();
        match event {
            ItemEvent::ItemCreated(e) => {
                self.items.upsert(
                    e.item_id,
                    ItemView {
                        item_id: e.item_id,
                        sku: e.sku,
                        name: e.name,
                        barcode: e.barcode,
                        bin_location: e.bin_location,
                        reorder_point: e.reorder_point,
                        on_hand: e.opening_stock,
                        low_stock: e.opening_stock <= e.reorder_point,
                        created_at: e.occurred_at,
                        updated_at: e.occurred_at,
                    },
                );
                if e.opening_stock > 0 {
                    self.record(e.item_id, MovementView {
                        sequence_number: seq,
                        kind: MovementKind::Opening,
                        qty: e.opening_stock,
                        on_hand_after: e.opening_stock,
                        source: None,
                        occurred_at: e.occurred_at,
                    });
                }
            }
            ItemEvent::ItemDetailsUpdated(e) => {
                if let Some(mut view) = self.items.get(&e.item_id) {
                    view.name = e.name;
                    view.barcode = e.barcode;
                    view.bin_location = e.bin_location;
                    view.reorder_point = e.reorder_point;
                    view.low_stock = view.on_hand <= view.reorder_point;
                    view.updated_at = e.occurred_at;
                    self.items.upsert(e.item_id, view);
                }
            }
            ItemEvent::StockReceived(e) => {
                self.set_on_hand(e.item_id, e.on_hand_after, e.occurred_at);
                self.record(e.item_id, MovementView {
                    sequence_number: seq,
                    kind: MovementKind::Received,
                    qty: e.qty,
                    on_hand_after: e.on_hand_after,
                    source: Some(e.source),
                    occurred_at: e.occurred_at,
                });
            }
            ItemEvent::StockPicked(e) => {
                self.set_on_hand(e.item_id, e.on_hand_after, e.occurred_at);
                self.record(e.item_id, MovementView {
                    sequence_number: seq,
                    kind: MovementKind::Picked,
                    qty: -e.qty,
                    on_hand_after: e.on_hand_after,
                    source: Some(e.source),
                    occurred_at: e.occurred_at,
                });
            }
        }

        self.cursors.update_cursor(envelope.aggregate_id(), PROJECTION, seq);
        Ok(())
    }

    pub fn reset(&self) {
        self.cursors.clear_cursors(PROJECTION);
        self.items.clear();
        self.movements.clear();
    }

    fn set_on_hand(&self, item_id: ItemId, on_hand: i64, at: DateTime<Utc>) {
        if let Some(mut view) = self.items.get(&item_id) {
            view.on_hand = on_hand;
            view.low_stock = on_hand <= view.reorder_point;
            view.updated_at = at;
            self.items.upsert(item_id, view);
        }
    }

    fn record(&self, item_id: ItemId, movement: MovementView) {
        let mut history = self.movements.get(&item_id).unwrap_or_default();
        history.push(movement);
        self.movements.upsert(item_id, history);
    }
}
