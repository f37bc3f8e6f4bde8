use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use wms_events::EventEnvelope;
use wms_inbound::{ReceiptEvent, ReceiptId, ReceiptLine, ReceiptStatus};

use super::{ProjectionCursorStore, ProjectionError, admit};
use crate::read_model::KeyedStore;
use crate::streams;

const PROJECTION: &str = "receipts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptView {
    pub receipt_id: ReceiptId,
    pub receipt_ref: String,
    pub vendor: Option<String>,
    pub status: ReceiptStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub lines: Vec<ReceiptLine>,
}

pub struct ReceiptsProjection<S> {
    store: S,
    cursors: Arc<dyn ProjectionCursorStore>,
}

impl<S> ReceiptsProjection<S>
where
    S: KeyedStore<ReceiptId, ReceiptView>,
{
    pub fn new(store: S, cursors: Arc<dyn ProjectionCursorStore>) -> Self {
        Self { store, cursors }
    }

    pub fn get(&self, receipt_id: &ReceiptId) -> Option<ReceiptView> {
        self.store.get(receipt_id)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<ReceiptView> {
        let mut receipts = self.store.list();
        receipts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.receipt_ref.cmp(&a.receipt_ref))
        });
        receipts
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != streams::RECEIPT {
            return Ok(());
        }
        if !admit(self.cursors.as_ref(), PROJECTION, envelope)? {
            return Ok(());
        }

        let event: ReceiptEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;
        let receipt_id = match &event {
            ReceiptEvent::ReceiptCreated(e) => e.receipt_id,
            ReceiptEvent::ReceiptLineAdded(e) => e.receipt_id,
            ReceiptEvent::ReceiptLineReceived(e) => e.receipt_id,
            ReceiptEvent::ReceiptClosed(e) => e.receipt_id,
        };
        if receipt_id.0 != envelope.aggregate_id() {
            return Err(ProjectionError::StreamMismatch(
                "event receipt_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match event {
            ReceiptEvent::ReceiptCreated(e) => {
                self.store.upsert(
                    e.receipt_id,
                    ReceiptView {
                        receipt_id: e.receipt_id,
                        receipt_ref: e.receipt_ref.as_str().to_string(),
                        vendor: e.vendor,
                        status: ReceiptStatus::Open,
                        created_at: e.occurred_at,
                        closed_at: None,
                        lines: vec![],
                    },
                );
            }
            ReceiptEvent::ReceiptLineAdded(e) => {
                if let Some(mut view) = self.store.get(&e.receipt_id) {
                    view.lines.push(ReceiptLine {
                        line_no: e.line_no,
                        item_id: e.item_id,
                        sku: e.sku,
                        qty: e.qty,
                        received_qty: 0,
                    });
                    self.store.upsert(e.receipt_id, view);
                }
            }
            ReceiptEvent::ReceiptLineReceived(e) => {
                if let Some(mut view) = self.store.get(&e.receipt_id) {
                    if let Some(line) = view.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                        line.received_qty = e.received_qty_after;
                    }
                    self.store.upsert(e.receipt_id, view);
                }
            }
            ReceiptEvent::ReceiptClosed(e) => {
                if let Some(mut view) = self.store.get(&e.receipt_id) {
                    view.status = ReceiptStatus::Received;
                    view.closed_at = Some(e.occurred_at);
                    self.store.upsert(e.receipt_id, view);
                }
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;
    use wms_core::{AggregateId, DocumentRef};
    use wms_inbound::ReceiptCreated;

    use crate::projections::InMemoryCursorStore;
    use crate::read_model::InMemoryStore;

    fn create(p: &ReceiptsProjection<InMemoryStore<ReceiptId, ReceiptView>>, r: &str, at: DateTime<Utc>) {
        let id = ReceiptId::new(AggregateId::new());
        let event = ReceiptEvent::ReceiptCreated(ReceiptCreated {
            receipt_id: id,
            receipt_ref: DocumentRef::new(r).unwrap(),
            vendor: None,
            occurred_at: at,
        });
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            id.0,
            streams::RECEIPT.to_string(),
            1,
            serde_json::to_value(event).unwrap(),
        );
        p.apply_envelope(&env).unwrap();
    }

    #[test]
    fn list_is_newest_first() {
        let p = ReceiptsProjection::new(InMemoryStore::new(), Arc::new(InMemoryCursorStore::new()));
        let now = Utc::now();
        create(&p, "RCPT-001", now - Duration::hours(2));
        create(&p, "RCPT-003", now);
        create(&p, "RCPT-002", now - Duration::hours(1));

        let refs: Vec<String> = p.list().into_iter().map(|r| r.receipt_ref).collect();
        assert_eq!(refs, ["RCPT-003", "RCPT-002", "RCPT-001"]);
    }

    #[test]
    fn other_aggregate_types_are_ignored() {
        let p = ReceiptsProjection::new(InMemoryStore::new(), Arc::new(InMemoryCursorStore::new()));
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            AggregateId::new(),
            streams::ORDER.to_string(),
            1,
            serde_json::json!({"not": "a receipt"}),
        );
        p.apply_envelope(&env).unwrap();
        assert!(p.list().is_empty());
    }
}
