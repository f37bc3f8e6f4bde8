use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wms_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Quantity};
use wms_events::Event;

use crate::movement::MovementSource;

/// Item identifier (one stock ledger stream per item).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub AggregateId);

impl ItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    sku: String,
    name: String,
    barcode: Option<String>,
    bin_location: Option<String>,
    reorder_point: i64,
    on_hand: i64,
    version: u64,
    created: bool,
}

impl Item {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            sku: String::new(),
            name: String::new(),
            barcode: None,
            bin_location: None,
            reorder_point: 0,
            on_hand: 0,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn bin_location(&self) -> Option<&str> {
        self.bin_location.as_deref()
    }

    pub fn reorder_point(&self) -> i64 {
        self.reorder_point
    }

    pub fn on_hand(&self) -> i64 {
        self.on_hand
    }

    /// At or below the reorder point.
    pub fn is_low_stock(&self) -> bool {
        self.on_hand <= self.reorder_point
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub item_id: ItemId,
    pub sku: String,
    pub name: String,
    pub barcode: Option<String>,
    pub bin_location: Option<String>,
    pub reorder_point: i64,
    pub opening_stock: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateItemDetails.
///
/// Carries the full new set of descriptive fields; the SKU and stock level are
/// not editable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItemDetails {
    pub item_id: ItemId,
    pub name: String,
    pub barcode: Option<String>,
    pub bin_location: Option<String>,
    pub reorder_point: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveStock (credit the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub item_id: ItemId,
    pub qty: Quantity,
    pub source: MovementSource,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PickStock (debit the ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickStock {
    pub item_id: ItemId,
    pub qty: Quantity,
    pub source: MovementSource,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemCommand {
    CreateItem(CreateItem),
    UpdateItemDetails(UpdateItemDetails),
    ReceiveStock(ReceiveStock),
    PickStock(PickStock),
}

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub item_id: ItemId,
    pub sku: String,
    pub name: String,
    pub barcode: Option<String>,
    pub bin_location: Option<String>,
    pub reorder_point: i64,
    pub opening_stock: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetailsUpdated {
    pub item_id: ItemId,
    pub name: String,
    pub barcode: Option<String>,
    pub bin_location: Option<String>,
    pub reorder_point: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub item_id: ItemId,
    pub sku: String,
    pub qty: i64,
    /// Balance after this movement.
    pub on_hand_after: i64,
    pub source: MovementSource,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockPicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPicked {
    pub item_id: ItemId,
    pub sku: String,
    pub qty: i64,
    pub on_hand_after: i64,
    pub source: MovementSource,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEvent {
    ItemCreated(ItemCreated),
    ItemDetailsUpdated(ItemDetailsUpdated),
    StockReceived(StockReceived),
    StockPicked(StockPicked),
}

impl Event for ItemEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ItemEvent::ItemCreated(_) => "inventory.item.created",
            ItemEvent::ItemDetailsUpdated(_) => "inventory.item.details_updated",
            ItemEvent::StockReceived(_) => "inventory.stock.received",
            ItemEvent::StockPicked(_) => "inventory.stock.picked",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ItemEvent::ItemCreated(e) => e.occurred_at,
            ItemEvent::ItemDetailsUpdated(e) => e.occurred_at,
            ItemEvent::StockReceived(e) => e.occurred_at,
            ItemEvent::StockPicked(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Item {
    type Command = ItemCommand;
    type Event = ItemEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ItemEvent::ItemCreated(e) => {
                self.id = e.item_id;
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.barcode = e.barcode.clone();
                self.bin_location = e.bin_location.clone();
                self.reorder_point = e.reorder_point;
                self.on_hand = e.opening_stock;
                self.created = true;
            }
            ItemEvent::ItemDetailsUpdated(e) => {
                self.name = e.name.clone();
                self.barcode = e.barcode.clone();
                self.bin_location = e.bin_location.clone();
                self.reorder_point = e.reorder_point;
            }
            ItemEvent::StockReceived(e) => {
                self.on_hand = e.on_hand_after;
            }
            ItemEvent::StockPicked(e) => {
                self.on_hand = e.on_hand_after;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ItemCommand::CreateItem(cmd) => self.handle_create(cmd),
            ItemCommand::UpdateItemDetails(cmd) => self.handle_update(cmd),
            ItemCommand::ReceiveStock(cmd) => self.handle_receive(cmd),
            ItemCommand::PickStock(cmd) => self.handle_pick(cmd),
        }
    }
}

impl Item {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("item {}", self.id)));
        }
        Ok(())
    }

    fn ensure_item_id(&self, item_id: ItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateItem) -> Result<Vec<ItemEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("item already exists"));
        }
        let sku = cmd.sku.trim();
        if sku.is_empty() {
            return Err(DomainError::validation("sku is required"));
        }
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        ensure_reorder_point(cmd.reorder_point)?;
        if cmd.opening_stock < 0 {
            return Err(DomainError::validation("opening stock cannot be negative"));
        }

        Ok(vec![ItemEvent::ItemCreated(ItemCreated {
            item_id: cmd.item_id,
            sku: sku.to_string(),
            name: name.to_string(),
            barcode: cmd.barcode.clone(),
            bin_location: cmd.bin_location.clone(),
            reorder_point: cmd.reorder_point,
            opening_stock: cmd.opening_stock,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateItemDetails) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_item_id(cmd.item_id)?;

        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        ensure_reorder_point(cmd.reorder_point)?;

        Ok(vec![ItemEvent::ItemDetailsUpdated(ItemDetailsUpdated {
            item_id: cmd.item_id,
            name: name.to_string(),
            barcode: cmd.barcode.clone(),
            bin_location: cmd.bin_location.clone(),
            reorder_point: cmd.reorder_point,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Credit: bounded only by the width of `i64`, the caller is
    /// responsible for not double-submitting.
    fn handle_receive(&self, cmd: &ReceiveStock) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_item_id(cmd.item_id)?;

        let qty = cmd.qty.get();
        let on_hand_after = self.on_hand.checked_add(qty).ok_or_else(|| {
            DomainError::invariant(format!(
                "receiving {qty} of {} would overflow on-hand ({})",
                self.sku, self.on_hand
            ))
        })?;
        Ok(vec![ItemEvent::StockReceived(StockReceived {
            item_id: cmd.item_id,
            sku: self.sku.clone(),
            qty,
            on_hand_after,
            source: cmd.source.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_pick(&self, cmd: &PickStock) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_item_id(cmd.item_id)?;

        let qty = cmd.qty.get();
        if qty > self.on_hand {
            return Err(DomainError::InsufficientStock {
                sku: self.sku.clone(),
                requested: qty,
                on_hand: self.on_hand,
            });
        }

        Ok(vec![ItemEvent::StockPicked(StockPicked {
            item_id: cmd.item_id,
            sku: self.sku.clone(),
            qty,
            on_hand_after: self.on_hand - qty,
            source: cmd.source.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn ensure_reorder_point(value: i64) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation("reorder point cannot be negative"));
    }
    Ok(())
}
