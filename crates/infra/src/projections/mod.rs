//! Projection implementations (read model builders).
//!
//! Projections consume committed envelopes and build query-optimized views.
//! They are rebuildable from the event store and idempotent under
//! at-least-once delivery (per-stream sequence cursors).

pub mod cursor_store;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod receipts;
pub mod users;

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use wms_core::UserId;
use wms_events::EventEnvelope;
use wms_inbound::ReceiptId;
use wms_inventory::ItemId;
use wms_outbound::OrderId;

use crate::read_model::InMemoryStore;

pub use cursor_store::{InMemoryCursorStore, ProjectionCursorStore};
pub use dashboard::{DashboardSummary, summarize};
pub use inventory::{InventoryProjection, ItemView, MovementKind, MovementView};
pub use orders::{OrderView, OrdersProjection};
pub use receipts::{ReceiptView, ReceiptsProjection};
pub use users::{UserView, UsersProjection};

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event: {0}")]
    Deserialize(String),

    #[error("envelope/event mismatch: {0}")]
    StreamMismatch(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Whether `envelope` is the next event of its stream for `projection`.
///
/// `Ok(false)` is a replay at or below the cursor.
fn admit(
    cursors: &dyn ProjectionCursorStore,
    projection: &str,
    envelope: &EventEnvelope<JsonValue>,
) -> Result<bool, ProjectionError> {
    let seq = envelope.sequence_number();
    let last = cursors
        .get_cursor(envelope.aggregate_id(), projection)
        .unwrap_or(0);

    if seq == 0 {
        return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
    }
    if seq <= last {
        return Ok(false);
    }
    if last != 0 && seq != last + 1 {
        return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
    }
    Ok(true)
}

pub type InventoryViews = InventoryProjection<InMemoryStore<ItemId, ItemView>, InMemoryStore<ItemId, Vec<MovementView>>>;
pub type ReceiptViews = ReceiptsProjection<InMemoryStore<ReceiptId, ReceiptView>>;
pub type OrderViews = OrdersProjection<InMemoryStore<OrderId, OrderView>>;
pub type UserViews = UsersProjection<InMemoryStore<UserId, UserView>>;

/// Every read model of the service, fed from one envelope stream.
pub struct Projections {
    pub inventory: InventoryViews,
    pub receipts: ReceiptViews,
    pub orders: OrderViews,
    pub users: UserViews,
}

impl Projections {
    pub fn in_memory() -> Self {
        let cursors: Arc<dyn ProjectionCursorStore> = Arc::new(InMemoryCursorStore::new());
        Self {
            inventory: InventoryProjection::new(InMemoryStore::new(), InMemoryStore::new(), Arc::clone(&cursors)),
            receipts: ReceiptsProjection::new(InMemoryStore::new(), Arc::clone(&cursors)),
            orders: OrdersProjection::new(InMemoryStore::new(), Arc::clone(&cursors)),
            users: UsersProjection::new(InMemoryStore::new(), cursors),
        }
    }

    /// Route an envelope to the projection that owns its aggregate type.
    pub fn apply(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        self.inventory.apply_envelope(envelope)?;
        self.receipts.apply_envelope(envelope)?;
        self.orders.apply_envelope(envelope)?;
        self.users.apply_envelope(envelope)?;
        Ok(())
    }

    /// Drop every view and replay `envelopes` in the order given.
    pub fn rebuild(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<usize, ProjectionError> {
        self.inventory.reset();
        self.receipts.reset();
        self.orders.reset();
        self.users.reset();

        let mut applied = 0;
        for envelope in envelopes {
            self.apply(&envelope)?;
            applied += 1;
        }
        Ok(applied)
    }
}

impl Default for Projections {
    fn default() -> Self {
        Self::in_memory()
    }
}
