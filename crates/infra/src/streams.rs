//! Aggregate type names recorded on every stored event.

pub const ITEM: &str = "inventory.item";
pub const RECEIPT: &str = "inbound.receipt";
pub const ORDER: &str = "outbound.order";
pub const USER: &str = "auth.user";
