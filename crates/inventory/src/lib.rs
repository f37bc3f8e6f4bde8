//! Stock ledger (event-sourced).
//!
//! Each [`Item`] stream is the ledger for one SKU: `on_hand` is the opening
//! stock plus every `StockReceived` minus every `StockPicked`. Pure domain
//! logic; uniqueness of SKU/barcode and cross-document rules live in
//! `wms-infra`.

pub mod item;
pub mod movement;

pub use item::{
    CreateItem, Item, ItemCommand, ItemCreated, ItemDetailsUpdated, ItemEvent, ItemId, PickStock,
    ReceiveStock, StockPicked, StockReceived, UpdateItemDetails,
};
pub use movement::MovementSource;
