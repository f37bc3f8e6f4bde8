use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use wms_events::EventEnvelope;
use wms_outbound::{OrderEvent, OrderId, OrderLine, OrderStatus, Shipment};

use super::{ProjectionCursorStore, ProjectionError, admit};
use crate::read_model::KeyedStore;
use crate::streams;

const PROJECTION: &str = "orders";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub order_ref: String,
    pub customer: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub picked_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLine>,
    pub shipments: Vec<Shipment>,
}

impl OrderView {
    /// Hours from creation to the latest shipment.
    pub fn fulfillment_hours(&self) -> Option<f64> {
        let shipped_at = self.shipped_at?;
        Some((shipped_at - self.created_at).num_seconds() as f64 / 3600.0)
    }
}

pub struct OrdersProjection<S> {
    store: S,
    cursors: Arc<dyn ProjectionCursorStore>,
}

impl<S> OrdersProjection<S>
where
    S: KeyedStore<OrderId, OrderView>,
{
    pub fn new(store: S, cursors: Arc<dyn ProjectionCursorStore>) -> Self {
        Self { store, cursors }
    }

    pub fn get(&self, order_id: &OrderId) -> Option<OrderView> {
        self.store.get(order_id)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<OrderView> {
        let mut orders = self.store.list();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_ref.cmp(&a.order_ref))
        });
        orders
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != streams::ORDER {
            return Ok(());
        }
        if !admit(self.cursors.as_ref(), PROJECTION, envelope)? {
            return Ok(());
        }

        let event: OrderEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;
        let order_id = match &event {
            OrderEvent::OrderCreated(e) => e.order_id,
            OrderEvent::OrderLineAdded(e) => e.order_id,
            OrderEvent::LinePicked(e) => e.order_id,
            OrderEvent::OrderPacked(e) => e.order_id,
            OrderEvent::OrderShipped(e) => e.order_id,
            OrderEvent::OrderClosed(e) => e.order_id,
        };
        if order_id.0 != envelope.aggregate_id() {
            return Err(ProjectionError::StreamMismatch(
                "event order_id does not match envelope aggregate_id".to_string(),
            ));
        }

        if let OrderEvent::OrderCreated(e) = &event {
            self.store.upsert(
                e.order_id,
                OrderView {
                    order_id: e.order_id,
                    order_ref: e.order_ref.as_str().to_string(),
                    customer: e.customer.clone(),
                    status: OrderStatus::Open,
                    created_at: e.occurred_at,
                    picked_at: None,
                    shipped_at: None,
                    closed_at: None,
                    lines: vec![],
                    shipments: vec![],
                },
            );
        } else if let Some(mut view) = self.store.get(&order_id) {
            match event {
                OrderEvent::OrderCreated(_) => {}
                OrderEvent::OrderLineAdded(e) => view.lines.push(OrderLine {
                    line_no: e.line_no,
                    item_id: e.item_id,
                    sku: e.sku,
                    qty: e.qty,
                    picked_qty: 0,
                }),
                OrderEvent::LinePicked(e) => {
                    if let Some(line) = view.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                        line.picked_qty = e.picked_qty_after;
                    }
                    view.status = OrderStatus::Picking;
                    view.picked_at = Some(e.occurred_at);
                }
                OrderEvent::OrderPacked(_) => view.status = OrderStatus::Packed,
                OrderEvent::OrderShipped(e) => {
                    view.shipments.push(Shipment {
                        shipment_no: e.shipment_no,
                        carrier: e.carrier,
                        tracking_no: e.tracking_no,
                        created_at: e.occurred_at,
                    });
                    view.status = OrderStatus::Shipped;
                    view.shipped_at = Some(e.occurred_at);
                }
                OrderEvent::OrderClosed(e) => {
                    view.status = OrderStatus::Closed;
                    view.closed_at = Some(e.occurred_at);
                }
            }
            self.store.upsert(order_id, view);
        }

        self.cursors
            .update_cursor(envelope.aggregate_id(), PROJECTION, envelope.sequence_number());
        Ok(())
    }

    pub fn reset(&self) {
        self.cursors.clear_cursors(PROJECTION);
        self.store.clear();
    }
}
