use chrono::Utc;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use wms_auth::{Permission, Principal};
use wms_core::value_object::optional_text;
use wms_core::{Aggregate, AggregateId, DomainError};
use wms_events::{EventBus, EventEnvelope};
use wms_inventory::{CreateItem, Item, ItemCommand, ItemId, UpdateItemDetails};

use super::WarehouseService;
use crate::error::WorkflowResult;
use crate::event_store::EventStore;
use crate::projections::{ItemView, MovementView};
use crate::streams;
use crate::unique_index::IndexScope;

/// Fields of a new item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub bin_location: Option<String>,
    #[serde(default)]
    pub reorder_point: i64,
    #[serde(default)]
    pub opening_stock: i64,
}

/// Partial update; `None` keeps the current value.
///
/// For `barcode` and `bin_location`, a blank string clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub bin_location: Option<String>,
    pub reorder_point: Option<i64>,
}

impl<S, B> WarehouseService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn create_item(&self, actor: &Principal, new: NewItem) -> WorkflowResult<ItemView> {
        self.authorize(actor, Permission::ItemsCreate)?;

        let sku = new.sku.trim().to_string();
        if sku.is_empty() {
            return Err(DomainError::validation("sku is required").into());
        }
        let barcode = optional_text(new.barcode);
        let bin_location = optional_text(new.bin_location);

        let item_id = ItemId::new(AggregateId::new());
        let sku_claim = self.index.reserve(IndexScope::Sku, &sku, item_id.0)?;
        let barcode_claim = match &barcode {
            Some(code) => Some(self.index.reserve(IndexScope::Barcode, code, item_id.0)?),
            None => None,
        };

        self.run("items.create", |uow| {
            let item: Item = uow.load(item_id.0, || Item::empty(item_id))?;
            let events = item.handle(&ItemCommand::CreateItem(CreateItem {
                item_id,
                sku: sku.clone(),
                name: new.name.clone(),
                barcode: barcode.clone(),
                bin_location: bin_location.clone(),
                reorder_point: new.reorder_point,
                opening_stock: new.opening_stock,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(item_id.0, streams::ITEM, &events)
        })?;

        sku_claim.commit();
        if let Some(claim) = barcode_claim {
            claim.commit();
        }

        tracing::info!(sku = %sku, on_hand = new.opening_stock, by = %actor.username, "item created");
        Self::committed_view(self.projections.inventory.get(&item_id), format!("item {sku}"))
    }

    pub fn update_item(&self, actor: &Principal, sku: &str, changes: ItemChanges) -> WorkflowResult<ItemView> {
        self.authorize(actor, Permission::ItemsUpdate)?;

        let item_id = self.item_id(sku)?;
        let current = Self::committed_view(self.projections.inventory.get(&item_id), format!("item {sku}"))?;

        let barcode = match changes.barcode {
            Some(raw) => optional_text(Some(raw)),
            None => current.barcode.clone(),
        };
        let barcode_claim = match &barcode {
            Some(code) if current.barcode.as_ref() != Some(code) => {
                Some(self.index.reserve(IndexScope::Barcode, code, item_id.0)?)
            }
            _ => None,
        };

        self.run("items.update", |uow| {
            let item: Item = uow.load(item_id.0, || Item::empty(item_id))?;
            let events = item.handle(&ItemCommand::UpdateItemDetails(UpdateItemDetails {
                item_id,
                name: changes.name.clone().unwrap_or_else(|| item.name().to_string()),
                barcode: barcode.clone(),
                bin_location: match &changes.bin_location {
                    Some(raw) => optional_text(Some(raw.clone())),
                    None => item.bin_location().map(str::to_string),
                },
                reorder_point: changes.reorder_point.unwrap_or(item.reorder_point()),
                occurred_at: Utc::now(),
            }))?;
            uow.stage(item_id.0, streams::ITEM, &events)
        })?;

        if let Some(claim) = barcode_claim {
            claim.commit();
        }
        if let Some(old) = &current.barcode {
            if barcode.as_ref() != Some(old) {
                self.index.release(IndexScope::Barcode, old);
            }
        }

        tracing::info!(sku = %current.sku, by = %actor.username, "item updated");
        Self::committed_view(self.projections.inventory.get(&item_id), format!("item {sku}"))
    }

    /// All items, or those whose SKU, name or barcode contains `query`.
    pub fn list_items(&self, actor: &Principal, query: Option<&str>) -> WorkflowResult<Vec<ItemView>> {
        self.authorize(actor, Permission::ItemsRead)?;
        Ok(match query {
            Some(q) => self.projections.inventory.search(q),
            None => self.projections.inventory.list(),
        })
    }

    pub fn get_item(&self, actor: &Principal, sku: &str) -> WorkflowResult<ItemView> {
        self.authorize(actor, Permission::ItemsRead)?;
        let item_id = self.item_id(sku)?;
        Self::committed_view(self.projections.inventory.get(&item_id), format!("item {sku}"))
    }

    /// The stock ledger of one item, oldest first.
    pub fn item_movements(&self, actor: &Principal, sku: &str) -> WorkflowResult<Vec<MovementView>> {
        self.authorize(actor, Permission::ItemsRead)?;
        let item_id = self.item_id(sku)?;
        Ok(self.projections.inventory.movements(&item_id))
    }
}
