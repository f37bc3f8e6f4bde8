//! Outbound orders (event-sourced).
//!
//! An [`Order`] moves strictly forward through
//! `open → picking → packed → shipped → closed`. Picking a line is paired
//! with a stock ledger debit by the unit of work in `wms-infra`.

pub mod order;

pub use order::{
    AddOrderLine, CloseOrder, CreateOrder, LinePicked, Order, OrderClosed, OrderCommand,
    OrderCreated, OrderEvent, OrderId, OrderLine, OrderLineAdded, OrderPacked, OrderShipped,
    OrderStatus, PackOrder, PickLine, ShipOrder, Shipment,
};
