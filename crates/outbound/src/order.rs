use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wms_core::{Aggregate, AggregateId, AggregateRoot, DocumentRef, DomainError, Quantity};
use wms_events::Event;
use wms_inventory::ItemId;

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Picking,
    Packed,
    Shipped,
    Closed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Open,
        OrderStatus::Picking,
        OrderStatus::Packed,
        OrderStatus::Shipped,
        OrderStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Picking => "picking",
            OrderStatus::Packed => "packed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Closed => "closed",
        }
    }

    /// Lines may be added and picked only before packing.
    fn accepts_lines(self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::Picking)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered vs picked quantity for one item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub item_id: ItemId,
    pub sku: String,
    pub qty: i64,
    pub picked_qty: i64,
}

impl OrderLine {
    pub fn is_fully_picked(&self) -> bool {
        self.picked_qty >= self.qty
    }
}

/// A physical dispatch of an order. One order may have several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_no: u32,
    pub carrier: Option<String>,
    pub tracking_no: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    order_ref: Option<DocumentRef>,
    customer: Option<String>,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    shipments: Vec<Shipment>,
    created_at: Option<DateTime<Utc>>,
    picked_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_ref: None,
            customer: None,
            status: OrderStatus::Open,
            lines: Vec::new(),
            shipments: Vec::new(),
            created_at: None,
            picked_at: None,
            shipped_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn order_ref(&self) -> Option<&DocumentRef> {
        self.order_ref.as_ref()
    }

    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn picked_at(&self) -> Option<DateTime<Utc>> {
        self.picked_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    /// Line numbers that still block packing.
    pub fn incomplete_lines(&self) -> Vec<u32> {
        self.lines
            .iter()
            .filter(|l| !l.is_fully_picked())
            .map(|l| l.line_no)
            .collect()
    }

    /// Hours between creation and the latest shipment, if shipped.
    pub fn fulfillment_hours(&self) -> Option<f64> {
        let created = self.created_at?;
        let shipped = self.shipped_at?;
        Some((shipped - created).num_seconds() as f64 / 3600.0)
    }

    fn ref_label(&self) -> String {
        self.order_ref
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| self.id.to_string())
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub order_ref: DocumentRef,
    pub customer: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddOrderLine (open or picking only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOrderLine {
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub sku: String,
    pub qty: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PickLine.
///
/// Stock availability is checked by the item aggregate in the same unit of
/// work. Picking beyond the ordered quantity is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickLine {
    pub order_id: OrderId,
    pub line_no: u32,
    pub qty: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PackOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ShipOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipOrder {
    pub order_id: OrderId,
    pub carrier: Option<String>,
    pub tracking_no: Option<String>,
    /// When true, only packed (or already shipped) orders may ship.
    pub require_packed: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CloseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    CreateOrder(CreateOrder),
    AddOrderLine(AddOrderLine),
    PickLine(PickLine),
    PackOrder(PackOrder),
    ShipOrder(ShipOrder),
    CloseOrder(CloseOrder),
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub order_ref: DocumentRef,
    pub customer: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderLineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineAdded {
    pub order_id: OrderId,
    pub line_no: u32,
    pub item_id: ItemId,
    pub sku: String,
    pub qty: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LinePicked.
///
/// Always committed together with an `inventory.stock.picked` event for the
/// same item and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePicked {
    pub order_id: OrderId,
    pub line_no: u32,
    pub item_id: ItemId,
    pub qty: i64,
    pub picked_qty_after: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderPacked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPacked {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderShipped (one shipment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShipped {
    pub order_id: OrderId,
    pub shipment_no: u32,
    pub carrier: Option<String>,
    pub tracking_no: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClosed {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    OrderLineAdded(OrderLineAdded),
    LinePicked(LinePicked),
    OrderPacked(OrderPacked),
    OrderShipped(OrderShipped),
    OrderClosed(OrderClosed),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "outbound.order.created",
            OrderEvent::OrderLineAdded(_) => "outbound.order.line_added",
            OrderEvent::LinePicked(_) => "outbound.order.line_picked",
            OrderEvent::OrderPacked(_) => "outbound.order.packed",
            OrderEvent::OrderShipped(_) => "outbound.order.shipped",
            OrderEvent::OrderClosed(_) => "outbound.order.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::OrderLineAdded(e) => e.occurred_at,
            OrderEvent::LinePicked(e) => e.occurred_at,
            OrderEvent::OrderPacked(e) => e.occurred_at,
            OrderEvent::OrderShipped(e) => e.occurred_at,
            OrderEvent::OrderClosed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.order_ref = Some(e.order_ref.clone());
                self.customer = e.customer.clone();
                self.status = OrderStatus::Open;
                self.lines.clear();
                self.shipments.clear();
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            OrderEvent::OrderLineAdded(e) => {
                self.lines.push(OrderLine {
                    line_no: e.line_no,
                    item_id: e.item_id,
                    sku: e.sku.clone(),
                    qty: e.qty,
                    picked_qty: 0,
                });
            }
            OrderEvent::LinePicked(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.picked_qty = e.picked_qty_after;
                }
                self.status = OrderStatus::Picking;
                self.picked_at = Some(e.occurred_at);
            }
            OrderEvent::OrderPacked(_) => {
                self.status = OrderStatus::Packed;
            }
            OrderEvent::OrderShipped(e) => {
                self.shipments.push(Shipment {
                    shipment_no: e.shipment_no,
                    carrier: e.carrier.clone(),
                    tracking_no: e.tracking_no.clone(),
                    created_at: e.occurred_at,
                });
                self.status = OrderStatus::Shipped;
                self.shipped_at = Some(e.occurred_at);
            }
            OrderEvent::OrderClosed(_) => {
                self.status = OrderStatus::Closed;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::CreateOrder(cmd) => self.handle_create(cmd),
            OrderCommand::AddOrderLine(cmd) => self.handle_add_line(cmd),
            OrderCommand::PickLine(cmd) => self.handle_pick(cmd),
            OrderCommand::PackOrder(cmd) => self.handle_pack(cmd),
            OrderCommand::ShipOrder(cmd) => self.handle_ship(cmd),
            OrderCommand::CloseOrder(cmd) => self.handle_close(cmd),
        }
    }
}

impl Order {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("order {}", self.id)));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_accepts_lines(&self, action: &str) -> Result<(), DomainError> {
        if !self.status.accepts_lines() {
            return Err(DomainError::invariant(format!(
                "cannot {action}: order is {}",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }

        Ok(vec![OrderEvent::OrderCreated(OrderCreated {
            order_id: cmd.order_id,
            order_ref: cmd.order_ref.clone(),
            customer: cmd.customer.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddOrderLine) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_accepts_lines("add lines")?;

        let next_line_no = self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1;
        Ok(vec![OrderEvent::OrderLineAdded(OrderLineAdded {
            order_id: cmd.order_id,
            line_no: next_line_no,
            item_id: cmd.item_id,
            sku: cmd.sku.clone(),
            qty: cmd.qty.get(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_pick(&self, cmd: &PickLine) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_accepts_lines("pick")?;

        let line = self
            .line(cmd.line_no)
            .ok_or_else(|| DomainError::not_found(format!("order line {}", cmd.line_no)))?;
        let picked_qty_after = line.picked_qty.checked_add(cmd.qty.get()).ok_or_else(|| {
            DomainError::invariant(format!("line {} picked quantity overflows", line.line_no))
        })?;

        Ok(vec![OrderEvent::LinePicked(LinePicked {
            order_id: cmd.order_id,
            line_no: line.line_no,
            item_id: line.item_id,
            qty: cmd.qty.get(),
            picked_qty_after,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_pack(&self, cmd: &PackOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_accepts_lines("pack")?;

        let incomplete = self.incomplete_lines();
        if !incomplete.is_empty() {
            return Err(DomainError::IncompleteLines {
                order_ref: self.ref_label(),
                lines: incomplete,
            });
        }

        Ok(vec![OrderEvent::OrderPacked(OrderPacked {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_ship(&self, cmd: &ShipOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_order_id(cmd.order_id)?;

        if self.status == OrderStatus::Closed {
            return Err(DomainError::invariant("cannot ship: order is closed"));
        }
        if cmd.require_packed && !matches!(self.status, OrderStatus::Packed | OrderStatus::Shipped) {
            return Err(DomainError::invariant(format!(
                "cannot ship: order must be packed first (is {})",
                self.status
            )));
        }

        Ok(vec![OrderEvent::OrderShipped(OrderShipped {
            order_id: cmd.order_id,
            shipment_no: self.shipments.len() as u32 + 1,
            carrier: cmd.carrier.clone(),
            tracking_no: cmd.tracking_no.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Close from any state; closing a closed order emits nothing.
    fn handle_close(&self, cmd: &CloseOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_order_id(cmd.order_id)?;

        if self.status == OrderStatus::Closed {
            return Ok(vec![]);
        }

        Ok(vec![OrderEvent::OrderClosed(OrderClosed {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use wms_events::execute;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn open_order() -> Order {
        let id = OrderId::new(AggregateId::new());
        let mut order = Order::empty(id);
        let cmd = OrderCommand::CreateOrder(CreateOrder {
            order_id: id,
            order_ref: DocumentRef::new("ORD-001").unwrap(),
            customer: Some("PT Nusantara".into()),
            occurred_at: now(),
        });
        execute(&mut order, &cmd).unwrap();
        order
    }

    fn add_line(order: &mut Order, qty: i64) -> Result<Vec<OrderEvent>, DomainError> {
        let cmd = OrderCommand::AddOrderLine(AddOrderLine {
            order_id: order.id_typed(),
            item_id: ItemId::new(AggregateId::new()),
            sku: "SKU-001".into(),
            qty: Quantity::new(qty).unwrap(),
            occurred_at: now(),
        });
        execute(order, &cmd)
    }

    fn pick(order: &mut Order, line_no: u32, qty: i64) -> Result<Vec<OrderEvent>, DomainError> {
        let cmd = OrderCommand::PickLine(PickLine {
            order_id: order.id_typed(),
            line_no,
            qty: Quantity::new(qty).unwrap(),
            occurred_at: now(),
        });
        execute(order, &cmd)
    }

    fn pack(order: &mut Order) -> Result<Vec<OrderEvent>, DomainError> {
        let cmd = OrderCommand::PackOrder(PackOrder {
            order_id: order.id_typed(),
            occurred_at: now(),
        });
        execute(order, &cmd)
    }

    fn ship(order: &mut Order, require_packed: bool) -> Result<Vec<OrderEvent>, DomainError> {
        ship_at(order, require_packed, now())
    }

    fn ship_at(
        order: &mut Order,
        require_packed: bool,
        at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        let cmd = OrderCommand::ShipOrder(ShipOrder {
            order_id: order.id_typed(),
            carrier: Some("JNE".into()),
            tracking_no: None,
            require_packed,
            occurred_at: at,
        });
        execute(order, &cmd)
    }

    fn close(order: &mut Order) -> Result<Vec<OrderEvent>, DomainError> {
        let cmd = OrderCommand::CloseOrder(CloseOrder {
            order_id: order.id_typed(),
            occurred_at: now(),
        });
        execute(order, &cmd)
    }

    #[test]
    fn pick_moves_order_to_picking_and_stamps_time() {
        let mut order = open_order();
        add_line(&mut order, 5).unwrap();

        pick(&mut order, 1, 5).unwrap();
        assert_eq!(order.status(), OrderStatus::Picking);
        assert_eq!(order.line(1).unwrap().picked_qty, 5);
        assert!(order.picked_at().is_some());
    }

    #[test]
    fn pack_requires_every_line_fully_picked() {
        let mut order = open_order();
        add_line(&mut order, 5).unwrap();
        add_line(&mut order, 2).unwrap();
        pick(&mut order, 1, 5).unwrap();
        pick(&mut order, 2, 1).unwrap();

        let err = pack(&mut order).unwrap_err();
        assert_eq!(
            err,
            DomainError::IncompleteLines {
                order_ref: "ORD-001".into(),
                lines: vec![2],
            }
        );
        assert_eq!(order.status(), OrderStatus::Picking);

        pick(&mut order, 2, 1).unwrap();
        pack(&mut order).unwrap();
        assert_eq!(order.status(), OrderStatus::Packed);
    }

    #[test]
    fn over_pick_counts_as_fully_picked() {
        let mut order = open_order();
        add_line(&mut order, 2).unwrap();
        pick(&mut order, 1, 3).unwrap();
        assert_eq!(order.line(1).unwrap().picked_qty, 3);
        pack(&mut order).unwrap();
    }

    #[test]
    fn picked_quantity_overflow_is_rejected() {
        let mut order = open_order();
        add_line(&mut order, 2).unwrap();
        pick(&mut order, 1, 1).unwrap();
        let err = pick(&mut order, 1, i64::MAX).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(order.line(1).unwrap().picked_qty, 1);
    }

    #[test]
    fn empty_order_can_be_packed() {
        let mut order = open_order();
        pack(&mut order).unwrap();
        assert_eq!(order.status(), OrderStatus::Packed);
    }

    #[test]
    fn packed_order_rejects_lines_and_picks() {
        let mut order = open_order();
        add_line(&mut order, 1).unwrap();
        pick(&mut order, 1, 1).unwrap();
        pack(&mut order).unwrap();

        assert!(matches!(
            pick(&mut order, 1, 1),
            Err(DomainError::InvariantViolation(_))
        ));
        assert!(matches!(
            add_line(&mut order, 1),
            Err(DomainError::InvariantViolation(_))
        ));
        assert!(matches!(pack(&mut order), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn ship_without_packing_by_default() {
        let mut order = open_order();
        ship(&mut order, false).unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);
        assert_eq!(order.shipments().len(), 1);
        assert!(order.shipped_at().is_some());
    }

    #[test]
    fn ship_can_require_packing() {
        let mut order = open_order();
        assert!(matches!(
            ship(&mut order, true),
            Err(DomainError::InvariantViolation(_))
        ));
        pack(&mut order).unwrap();
        ship(&mut order, true).unwrap();
        ship(&mut order, true).unwrap();
        assert_eq!(order.shipments().len(), 2);
    }

    #[test]
    fn repeated_shipping_accumulates_shipments() {
        let mut order = open_order();
        ship(&mut order, false).unwrap();
        ship(&mut order, false).unwrap();
        let numbers: Vec<u32> = order.shipments().iter().map(|s| s.shipment_no).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn close_from_any_state_and_is_idempotent() {
        let mut order = open_order();
        close(&mut order).unwrap();
        assert_eq!(order.status(), OrderStatus::Closed);

        let version = order.version();
        assert!(close(&mut order).unwrap().is_empty());
        assert_eq!(order.version(), version);

        assert!(matches!(
            ship(&mut order, false),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn fulfillment_hours_spans_creation_to_shipment() {
        let mut order = open_order();
        assert_eq!(order.fulfillment_hours(), None);
        let created = order.created_at().unwrap();
        ship_at(&mut order, false, created + Duration::minutes(90)).unwrap();
        assert_eq!(order.fulfillment_hours(), Some(1.5));
    }

    #[test]
    fn pick_on_unknown_line_is_not_found() {
        let mut order = open_order();
        assert!(matches!(pick(&mut order, 9, 1), Err(DomainError::NotFound(_))));
    }

    proptest! {
        #[test]
        fn picked_qty_is_sum_of_picks(picks in proptest::collection::vec(1_i64..10, 1..20)) {
            let mut order = open_order();
            add_line(&mut order, 10).unwrap();
            for q in &picks {
                pick(&mut order, 1, *q).unwrap();
            }
            let total: i64 = picks.iter().sum();
            prop_assert_eq!(order.line(1).unwrap().picked_qty, total);
            prop_assert_eq!(order.line(1).unwrap().is_fully_picked(), total >= 10);
        }
    }
}
