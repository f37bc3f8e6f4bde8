use chrono::Utc;
use serde_json::Value as JsonValue;

use wms_auth::{Permission, Principal};
use wms_core::value_object::optional_text;
use wms_core::{Aggregate, AggregateId, DocumentRef, DomainError, Quantity};
use wms_events::{EventBus, EventEnvelope};
use wms_inbound::{
    AddReceiptLine, CloseReceipt, CreateReceipt, Receipt, ReceiptCommand, ReceiptId, ReceiveLine,
};
use wms_inventory::{Item, ItemCommand, MovementSource, ReceiveStock};

use super::WarehouseService;
use crate::error::WorkflowResult;
use crate::event_store::EventStore;
use crate::projections::ReceiptView;
use crate::streams;
use crate::unique_index::IndexScope;

impl<S, B> WarehouseService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn create_receipt(
        &self,
        actor: &Principal,
        receipt_ref: &str,
        vendor: Option<String>,
    ) -> WorkflowResult<ReceiptView> {
        self.authorize(actor, Permission::ReceiptsCreate)?;

        let receipt_ref = DocumentRef::new(receipt_ref)?;
        let vendor = optional_text(vendor);
        let receipt_id = ReceiptId::new(AggregateId::new());
        let claim = self
            .index
            .reserve(IndexScope::ReceiptRef, receipt_ref.as_str(), receipt_id.0)?;

        self.run("receipts.create", |uow| {
            let receipt: Receipt = uow.load(receipt_id.0, || Receipt::empty(receipt_id))?;
            let events = receipt.handle(&ReceiptCommand::CreateReceipt(CreateReceipt {
                receipt_id,
                receipt_ref: receipt_ref.clone(),
                vendor: vendor.clone(),
                occurred_at: Utc::now(),
            }))?;
            uow.stage(receipt_id.0, streams::RECEIPT, &events)
        })?;
        claim.commit();

        tracing::info!(receipt_ref = %receipt_ref, by = %actor.username, "receipt created");
        self.receipt_view(receipt_id, receipt_ref.as_str())
    }

    pub fn add_receipt_line(
        &self,
        actor: &Principal,
        receipt_ref: &str,
        sku: &str,
        qty: i64,
    ) -> WorkflowResult<ReceiptView> {
        self.authorize(actor, Permission::ReceiptsAddLine)?;

        let qty = Quantity::new(qty)?;
        let receipt_id = self.receipt_id(receipt_ref)?;
        let item_id = self.item_id(sku)?;

        self.run("receipts.add_line", |uow| {
            let receipt: Receipt = uow.load(receipt_id.0, || Receipt::empty(receipt_id))?;
            let item: Item = uow.load(item_id.0, || Item::empty(item_id))?;
            if !item.is_created() {
                return Err(DomainError::not_found(format!("item {sku}")).into());
            }
            let events = receipt.handle(&ReceiptCommand::AddReceiptLine(AddReceiptLine {
                receipt_id,
                item_id,
                sku: item.sku().to_string(),
                qty,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(receipt_id.0, streams::RECEIPT, &events)
        })?;

        tracing::info!(receipt_ref, sku, qty = qty.get(), "receipt line added");
        self.receipt_view(receipt_id, receipt_ref)
    }

    /// Credit stock for a receipt line. The receipt and the item are committed
    /// together or not at all.
    pub fn receive_receipt_line(
        &self,
        actor: &Principal,
        receipt_ref: &str,
        line_no: u32,
        qty: i64,
    ) -> WorkflowResult<ReceiptView> {
        self.authorize(actor, Permission::ReceiptsReceiveLine)?;

        let qty = Quantity::new(qty)?;
        let receipt_id = self.receipt_id(receipt_ref)?;
        let item_id = self
            .projections
            .receipts
            .get(&receipt_id)
            .and_then(|r| r.lines.iter().find(|l| l.line_no == line_no).map(|l| l.item_id))
            .ok_or_else(|| DomainError::not_found(format!("receipt line {receipt_ref}/{line_no}")))?;
        let allow_over_receipt = self.config.allow_over_receipt;

        self.item_locks.with_locks(&[item_id], || {
            self.run("receipts.receive_line", |uow| {
                let now = Utc::now();
                let receipt: Receipt = uow.load(receipt_id.0, || Receipt::empty(receipt_id))?;
                let receipt_events = receipt.handle(&ReceiptCommand::ReceiveLine(ReceiveLine {
                    receipt_id,
                    line_no,
                    qty,
                    allow_over_receipt,
                    occurred_at: now,
                }))?;

                let document_ref = receipt
                    .receipt_ref()
                    .cloned()
                    .ok_or_else(|| DomainError::not_found(format!("receipt {receipt_ref}")))?;
                let item: Item = uow.load(item_id.0, || Item::empty(item_id))?;
                let stock_events = item.handle(&ItemCommand::ReceiveStock(ReceiveStock {
                    item_id,
                    qty,
                    source: MovementSource::ReceiptLine {
                        receipt_ref: document_ref,
                        line_no,
                    },
                    occurred_at: now,
                }))?;

                uow.stage(receipt_id.0, streams::RECEIPT, &receipt_events)?;
                uow.stage(item_id.0, streams::ITEM, &stock_events)
            })
        })?;

        tracing::info!(receipt_ref, line_no, qty = qty.get(), "receipt line received");
        self.receipt_view(receipt_id, receipt_ref)
    }

    /// Mark the receipt received, whatever quantities arrived.
    pub fn close_receipt(&self, actor: &Principal, receipt_ref: &str) -> WorkflowResult<ReceiptView> {
        self.authorize(actor, Permission::ReceiptsClose)?;

        let receipt_id = self.receipt_id(receipt_ref)?;
        self.run("receipts.close", |uow| {
            let receipt: Receipt = uow.load(receipt_id.0, || Receipt::empty(receipt_id))?;
            let events = receipt.handle(&ReceiptCommand::CloseReceipt(CloseReceipt {
                receipt_id,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(receipt_id.0, streams::RECEIPT, &events)
        })?;

        tracing::info!(receipt_ref, by = %actor.username, "receipt closed");
        self.receipt_view(receipt_id, receipt_ref)
    }

    /// Newest first.
    pub fn list_receipts(&self, actor: &Principal) -> WorkflowResult<Vec<ReceiptView>> {
        self.authorize(actor, Permission::ReceiptsRead)?;
        Ok(self.projections.receipts.list())
    }

    pub fn get_receipt(&self, actor: &Principal, receipt_ref: &str) -> WorkflowResult<ReceiptView> {
        self.authorize(actor, Permission::ReceiptsRead)?;
        let receipt_id = self.receipt_id(receipt_ref)?;
        self.receipt_view(receipt_id, receipt_ref)
    }

    fn receipt_view(&self, receipt_id: ReceiptId, receipt_ref: &str) -> WorkflowResult<ReceiptView> {
        Self::committed_view(
            self.projections.receipts.get(&receipt_id),
            format!("receipt {}", receipt_ref.trim()),
        )
    }
}
