use chrono::Utc;
use serde_json::Value as JsonValue;

use wms_auth::{Permission, Principal};
use wms_core::value_object::optional_text;
use wms_core::{Aggregate, AggregateId, DocumentRef, DomainError, Quantity};
use wms_events::{EventBus, EventEnvelope};
use wms_inventory::{Item, ItemCommand, MovementSource, PickStock};
use wms_outbound::{
    AddOrderLine, CloseOrder, CreateOrder, Order, OrderCommand, OrderId, PackOrder, PickLine,
    ShipOrder,
};

use super::WarehouseService;
use crate::error::WorkflowResult;
use crate::event_store::EventStore;
use crate::projections::OrderView;
use crate::streams;
use crate::unique_index::IndexScope;

impl<S, B> WarehouseService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn create_order(
        &self,
        actor: &Principal,
        order_ref: &str,
        customer: Option<String>,
    ) -> WorkflowResult<OrderView> {
        self.authorize(actor, Permission::OrdersCreate)?;

        let order_ref = DocumentRef::new(order_ref)?;
        let customer = optional_text(customer);
        let order_id = OrderId::new(AggregateId::new());
        let claim = self
            .index
            .reserve(IndexScope::OrderRef, order_ref.as_str(), order_id.0)?;

        self.run("orders.create", |uow| {
            let order: Order = uow.load(order_id.0, || Order::empty(order_id))?;
            let events = order.handle(&OrderCommand::CreateOrder(CreateOrder {
                order_id,
                order_ref: order_ref.clone(),
                customer: customer.clone(),
                occurred_at: Utc::now(),
            }))?;
            uow.stage(order_id.0, streams::ORDER, &events)
        })?;
        claim.commit();

        tracing::info!(order_ref = %order_ref, by = %actor.username, "order created");
        self.order_view(order_id, order_ref.as_str())
    }

    pub fn add_order_line(
        &self,
        actor: &Principal,
        order_ref: &str,
        sku: &str,
        qty: i64,
    ) -> WorkflowResult<OrderView> {
        self.authorize(actor, Permission::OrdersAddLine)?;

        let qty = Quantity::new(qty)?;
        let order_id = self.order_id(order_ref)?;
        let item_id = self.item_id(sku)?;

        self.run("orders.add_line", |uow| {
            let order: Order = uow.load(order_id.0, || Order::empty(order_id))?;
            let item: Item = uow.load(item_id.0, || Item::empty(item_id))?;
            if !item.is_created() {
                return Err(DomainError::not_found(format!("item {sku}")).into());
            }
            let events = order.handle(&OrderCommand::AddOrderLine(AddOrderLine {
                order_id,
                item_id,
                sku: item.sku().to_string(),
                qty,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(order_id.0, streams::ORDER, &events)
        })?;

        tracing::info!(order_ref, sku, qty = qty.get(), "order line added");
        self.order_view(order_id, order_ref)
    }

    /// Pick `qty` for one line: the line's picked quantity and the item's
    /// on-hand move together. Fails with `InsufficientStock` when the item
    /// has less than `qty` on hand.
    pub fn pick_order_line(
        &self,
        actor: &Principal,
        order_ref: &str,
        line_no: u32,
        qty: i64,
    ) -> WorkflowResult<OrderView> {
        self.authorize(actor, Permission::OrdersPickLine)?;

        let qty = Quantity::new(qty)?;
        let order_id = self.order_id(order_ref)?;
        let item_id = self
            .projections
            .orders
            .get(&order_id)
            .and_then(|o| o.lines.iter().find(|l| l.line_no == line_no).map(|l| l.item_id))
            .ok_or_else(|| DomainError::not_found(format!("order line {order_ref}/{line_no}")))?;

        self.item_locks.with_locks(&[item_id], || {
            self.run("orders.pick_line", |uow| {
                let now = Utc::now();
                let order: Order = uow.load(order_id.0, || Order::empty(order_id))?;
                let order_events = order.handle(&OrderCommand::PickLine(PickLine {
                    order_id,
                    line_no,
                    qty,
                    occurred_at: now,
                }))?;

                let document_ref = order
                    .order_ref()
                    .cloned()
                    .ok_or_else(|| DomainError::not_found(format!("order {order_ref}")))?;
                let item: Item = uow.load(item_id.0, || Item::empty(item_id))?;
                let stock_events = item.handle(&ItemCommand::PickStock(PickStock {
                    item_id,
                    qty,
                    source: MovementSource::OrderLine {
                        order_ref: document_ref,
                        line_no,
                    },
                    occurred_at: now,
                }))?;

                uow.stage(order_id.0, streams::ORDER, &order_events)?;
                uow.stage(item_id.0, streams::ITEM, &stock_events)
            })
        })?;

        tracing::info!(order_ref, line_no, qty = qty.get(), by = %actor.username, "order line picked");
        self.order_view(order_id, order_ref)
    }

    /// Fails with `IncompleteLines` unless every line is fully picked.
    pub fn pack_order(&self, actor: &Principal, order_ref: &str) -> WorkflowResult<OrderView> {
        self.authorize(actor, Permission::OrdersPack)?;

        let order_id = self.order_id(order_ref)?;
        self.run("orders.pack", |uow| {
            let order: Order = uow.load(order_id.0, || Order::empty(order_id))?;
            let events = order.handle(&OrderCommand::PackOrder(PackOrder {
                order_id,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(order_id.0, streams::ORDER, &events)
        })?;

        tracing::info!(order_ref, by = %actor.username, "order packed");
        self.order_view(order_id, order_ref)
    }

    /// Record a shipment. Whether the order must be packed first is a
    /// configuration choice (`ship_requires_packed`).
    pub fn ship_order(
        &self,
        actor: &Principal,
        order_ref: &str,
        carrier: Option<String>,
        tracking_no: Option<String>,
    ) -> WorkflowResult<OrderView> {
        self.authorize(actor, Permission::OrdersShip)?;

        let order_id = self.order_id(order_ref)?;
        let carrier = optional_text(carrier);
        let tracking_no = optional_text(tracking_no);
        let require_packed = self.config.ship_requires_packed;

        self.run("orders.ship", |uow| {
            let order: Order = uow.load(order_id.0, || Order::empty(order_id))?;
            let events = order.handle(&OrderCommand::ShipOrder(ShipOrder {
                order_id,
                carrier: carrier.clone(),
                tracking_no: tracking_no.clone(),
                require_packed,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(order_id.0, streams::ORDER, &events)
        })?;

        tracing::info!(order_ref, carrier = ?carrier, by = %actor.username, "order shipped");
        self.order_view(order_id, order_ref)
    }

    pub fn close_order(&self, actor: &Principal, order_ref: &str) -> WorkflowResult<OrderView> {
        self.authorize(actor, Permission::OrdersClose)?;

        let order_id = self.order_id(order_ref)?;
        self.run("orders.close", |uow| {
            let order: Order = uow.load(order_id.0, || Order::empty(order_id))?;
            let events = order.handle(&OrderCommand::CloseOrder(CloseOrder {
                order_id,
                occurred_at: Utc::now(),
            }))?;
            uow.stage(order_id.0, streams::ORDER, &events)
        })?;

        tracing::info!(order_ref, by = %actor.username, "order closed");
        self.order_view(order_id, order_ref)
    }

    /// Newest first.
    pub fn list_orders(&self, actor: &Principal) -> WorkflowResult<Vec<OrderView>> {
        self.authorize(actor, Permission::OrdersRead)?;
        Ok(self.projections.orders.list())
    }

    pub fn get_order(&self, actor: &Principal, order_ref: &str) -> WorkflowResult<OrderView> {
        self.authorize(actor, Permission::OrdersRead)?;
        let order_id = self.order_id(order_ref)?;
        self.order_view(order_id, order_ref)
    }

    fn order_view(&self, order_id: OrderId, order_ref: &str) -> WorkflowResult<OrderView> {
        Self::committed_view(
            self.projections.orders.get(&order_id),
            format!("order {}", order_ref.trim()),
        )
    }
}
