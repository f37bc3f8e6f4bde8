use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wms_core::{Aggregate, AggregateId, AggregateRoot, DocumentRef, DomainError, Quantity};
use wms_events::Event;
use wms_inventory::ItemId;

/// Receipt identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(pub AggregateId);

impl ReceiptId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Receipt lifecycle: `open → received`, one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Open,
    Received,
}

impl ReceiptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptStatus::Open => "open",
            ReceiptStatus::Received => "received",
        }
    }
}

/// Expected vs received quantity for one item on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub line_no: u32,
    pub item_id: ItemId,
    pub sku: String,
    pub qty: i64,
    pub received_qty: i64,
}

impl ReceiptLine {
    pub fn outstanding(&self) -> i64 {
        (self.qty - self.received_qty).max(0)
    }
}

/// Aggregate root: Receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    id: ReceiptId,
    receipt_ref: Option<DocumentRef>,
    vendor: Option<String>,
    status: ReceiptStatus,
    lines: Vec<ReceiptLine>,
    created_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Receipt {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ReceiptId) -> Self {
        Self {
            id,
            receipt_ref: None,
            vendor: None,
            status: ReceiptStatus::Open,
            lines: Vec::new(),
            created_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ReceiptId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn receipt_ref(&self) -> Option<&DocumentRef> {
        self.receipt_ref.as_ref()
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&ReceiptLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl AggregateRoot for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReceipt {
    pub receipt_id: ReceiptId,
    pub receipt_ref: DocumentRef,
    pub vendor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddReceiptLine (only while open).
///
/// The item must already exist; the caller resolves it and passes its SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReceiptLine {
    pub receipt_id: ReceiptId,
    pub item_id: ItemId,
    pub sku: String,
    pub qty: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReceiveLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveLine {
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub qty: Quantity,
    /// When false, `received_qty` may not exceed the ordered `qty`.
    pub allow_over_receipt: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CloseReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReceipt {
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptCommand {
    CreateReceipt(CreateReceipt),
    AddReceiptLine(AddReceiptLine),
    ReceiveLine(ReceiveLine),
    CloseReceipt(CloseReceipt),
}

/// Event: ReceiptCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCreated {
    pub receipt_id: ReceiptId,
    pub receipt_ref: DocumentRef,
    pub vendor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptLineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLineAdded {
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub item_id: ItemId,
    pub sku: String,
    pub qty: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptLineReceived.
///
/// Always committed together with an `inventory.stock.received` event for
/// the same item and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLineReceived {
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub item_id: ItemId,
    pub qty: i64,
    pub received_qty_after: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptClosed {
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptEvent {
    ReceiptCreated(ReceiptCreated),
    ReceiptLineAdded(ReceiptLineAdded),
    ReceiptLineReceived(ReceiptLineReceived),
    ReceiptClosed(ReceiptClosed),
}

impl Event for ReceiptEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReceiptEvent::ReceiptCreated(_) => "inbound.receipt.created",
            ReceiptEvent::ReceiptLineAdded(_) => "inbound.receipt.line_added",
            ReceiptEvent::ReceiptLineReceived(_) => "inbound.receipt.line_received",
            ReceiptEvent::ReceiptClosed(_) => "inbound.receipt.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReceiptEvent::ReceiptCreated(e) => e.occurred_at,
            ReceiptEvent::ReceiptLineAdded(e) => e.occurred_at,
            ReceiptEvent::ReceiptLineReceived(e) => e.occurred_at,
            ReceiptEvent::ReceiptClosed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Receipt {
    type Command = ReceiptCommand;
    type Event = ReceiptEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReceiptEvent::ReceiptCreated(e) => {
                self.id = e.receipt_id;
                self.receipt_ref = Some(e.receipt_ref.clone());
                self.vendor = e.vendor.clone();
                self.status = ReceiptStatus::Open;
                self.lines.clear();
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            ReceiptEvent::ReceiptLineAdded(e) => {
                self.lines.push(ReceiptLine {
                    line_no: e.line_no,
                    item_id: e.item_id,
                    sku: e.sku.clone(),
                    qty: e.qty,
                    received_qty: 0,
                });
            }
            ReceiptEvent::ReceiptLineReceived(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.received_qty = e.received_qty_after;
                }
            }
            ReceiptEvent::ReceiptClosed(_) => {
                self.status = ReceiptStatus::Received;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReceiptCommand::CreateReceipt(cmd) => self.handle_create(cmd),
            ReceiptCommand::AddReceiptLine(cmd) => self.handle_add_line(cmd),
            ReceiptCommand::ReceiveLine(cmd) => self.handle_receive_line(cmd),
            ReceiptCommand::CloseReceipt(cmd) => self.handle_close(cmd),
        }
    }
}

impl Receipt {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("receipt {}", self.id)));
        }
        Ok(())
    }

    fn ensure_receipt_id(&self, receipt_id: ReceiptId) -> Result<(), DomainError> {
        if self.id != receipt_id {
            return Err(DomainError::invariant("receipt_id mismatch"));
        }
        Ok(())
    }

    fn ensure_open(&self, action: &str) -> Result<(), DomainError> {
        if self.status != ReceiptStatus::Open {
            return Err(DomainError::invariant(format!(
                "cannot {action}: receipt is already received"
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateReceipt) -> Result<Vec<ReceiptEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("receipt already exists"));
        }

        Ok(vec![ReceiptEvent::ReceiptCreated(ReceiptCreated {
            receipt_id: cmd.receipt_id,
            receipt_ref: cmd.receipt_ref.clone(),
            vendor: cmd.vendor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddReceiptLine) -> Result<Vec<ReceiptEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_receipt_id(cmd.receipt_id)?;
        self.ensure_open("add lines")?;

        let next_line_no = self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1;
        Ok(vec![ReceiptEvent::ReceiptLineAdded(ReceiptLineAdded {
            receipt_id: cmd.receipt_id,
            line_no: next_line_no,
            item_id: cmd.item_id,
            sku: cmd.sku.clone(),
            qty: cmd.qty.get(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_receive_line(&self, cmd: &ReceiveLine) -> Result<Vec<ReceiptEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_receipt_id(cmd.receipt_id)?;
        self.ensure_open("receive")?;

        let line = self
            .line(cmd.line_no)
            .ok_or_else(|| DomainError::not_found(format!("receipt line {}", cmd.line_no)))?;

        let received_qty_after = line
            .received_qty
            .checked_add(cmd.qty.get())
            .ok_or_else(|| {
                DomainError::invariant(format!("line {} received quantity overflows", line.line_no))
            })?;
        if !cmd.allow_over_receipt && received_qty_after > line.qty {
            return Err(DomainError::invariant(format!(
                "line {} would be over-received ({} of {})",
                line.line_no, received_qty_after, line.qty
            )));
        }

        Ok(vec![ReceiptEvent::ReceiptLineReceived(ReceiptLineReceived {
            receipt_id: cmd.receipt_id,
            line_no: line.line_no,
            item_id: line.item_id,
            qty: cmd.qty.get(),
            received_qty_after,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Closing does not check received quantities. Closing an already
    /// received receipt emits nothing.
    fn handle_close(&self, cmd: &CloseReceipt) -> Result<Vec<ReceiptEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_receipt_id(cmd.receipt_id)?;

        if self.status == ReceiptStatus::Received {
            return Ok(vec![]);
        }

        Ok(vec![ReceiptEvent::ReceiptClosed(ReceiptClosed {
            receipt_id: cmd.receipt_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wms_events::execute;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn open_receipt() -> Receipt {
        let id = ReceiptId::new(AggregateId::new());
        let mut receipt = Receipt::empty(id);
        let cmd = ReceiptCommand::CreateReceipt(CreateReceipt {
            receipt_id: id,
            receipt_ref: DocumentRef::new("RCPT-002").unwrap(),
            vendor: Some("Acme Supplies".into()),
            occurred_at: now(),
        });
        execute(&mut receipt, &cmd).unwrap();
        receipt
    }

    fn add_line(receipt: &mut Receipt, qty: i64) -> u32 {
        let cmd = ReceiptCommand::AddReceiptLine(AddReceiptLine {
            receipt_id: receipt.id_typed(),
            item_id: ItemId::new(AggregateId::new()),
            sku: "SKU-002".into(),
            qty: Quantity::new(qty).unwrap(),
            occurred_at: now(),
        });
        match &execute(receipt, &cmd).unwrap()[0] {
            ReceiptEvent::ReceiptLineAdded(e) => e.line_no,
            other => panic!("unexpected event {other:?}"),
        }
    }

    fn receive(
        receipt: &mut Receipt,
        line_no: u32,
        qty: i64,
        allow_over_receipt: bool,
    ) -> Result<Vec<ReceiptEvent>, DomainError> {
        let cmd = ReceiptCommand::ReceiveLine(ReceiveLine {
            receipt_id: receipt.id_typed(),
            line_no,
            qty: Quantity::new(qty).unwrap(),
            allow_over_receipt,
            occurred_at: now(),
        });
        execute(receipt, &cmd)
    }

    fn close(receipt: &mut Receipt) -> Result<Vec<ReceiptEvent>, DomainError> {
        let cmd = ReceiptCommand::CloseReceipt(CloseReceipt {
            receipt_id: receipt.id_typed(),
            occurred_at: now(),
        });
        execute(receipt, &cmd)
    }

    #[test]
    fn receive_full_line_then_close() {
        let mut receipt = open_receipt();
        let line_no = add_line(&mut receipt, 10);

        let events = receive(&mut receipt, line_no, 10, true).unwrap();
        match &events[0] {
            ReceiptEvent::ReceiptLineReceived(e) => {
                assert_eq!(e.qty, 10);
                assert_eq!(e.received_qty_after, 10);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(receipt.line(line_no).unwrap().received_qty, 10);

        close(&mut receipt).unwrap();
        assert_eq!(receipt.status(), ReceiptStatus::Received);
    }

    #[test]
    fn close_ignores_outstanding_quantities() {
        let mut receipt = open_receipt();
        let line_no = add_line(&mut receipt, 10);
        receive(&mut receipt, line_no, 3, true).unwrap();

        close(&mut receipt).unwrap();
        assert_eq!(receipt.status(), ReceiptStatus::Received);
        assert_eq!(receipt.line(line_no).unwrap().outstanding(), 7);
    }

    #[test]
    fn closing_twice_is_a_no_op() {
        let mut receipt = open_receipt();
        close(&mut receipt).unwrap();
        let version = receipt.version();

        assert!(close(&mut receipt).unwrap().is_empty());
        assert_eq!(receipt.version(), version);
    }

    #[test]
    fn closed_receipt_rejects_lines_and_receiving() {
        let mut receipt = open_receipt();
        let line_no = add_line(&mut receipt, 4);
        close(&mut receipt).unwrap();

        let err = receive(&mut receipt, line_no, 1, true).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let cmd = ReceiptCommand::AddReceiptLine(AddReceiptLine {
            receipt_id: receipt.id_typed(),
            item_id: ItemId::new(AggregateId::new()),
            sku: "SKU-001".into(),
            qty: Quantity::new(1).unwrap(),
            occurred_at: now(),
        });
        assert!(matches!(
            receipt.handle(&cmd),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn over_receipt_allowed_unless_disabled() {
        let mut receipt = open_receipt();
        let line_no = add_line(&mut receipt, 5);

        receive(&mut receipt, line_no, 7, true).unwrap();
        assert_eq!(receipt.line(line_no).unwrap().received_qty, 7);

        let mut strict = open_receipt();
        let strict_line = add_line(&mut strict, 5);
        receive(&mut strict, strict_line, 5, false).unwrap();
        let err = receive(&mut strict, strict_line, 1, false).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(strict.line(strict_line).unwrap().received_qty, 5);
    }

    #[test]
    fn received_quantity_overflow_is_rejected() {
        let mut receipt = open_receipt();
        let line_no = add_line(&mut receipt, 5);
        receive(&mut receipt, line_no, 1, true).unwrap();
        let err = receive(&mut receipt, line_no, i64::MAX, true).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(receipt.line(line_no).unwrap().received_qty, 1);
    }

    #[test]
    fn unknown_line_is_not_found() {
        let mut receipt = open_receipt();
        add_line(&mut receipt, 1);
        let err = receive(&mut receipt, 42, 1, true).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn lines_are_numbered_in_order() {
        let mut receipt = open_receipt();
        assert_eq!(add_line(&mut receipt, 50), 1);
        assert_eq!(add_line(&mut receipt, 10), 2);
        assert_eq!(receipt.lines().len(), 2);
    }

    proptest! {
        #[test]
        fn received_qty_is_sum_of_receipts(qtys in proptest::collection::vec(1_i64..20, 1..15)) {
            let mut receipt = open_receipt();
            let line_no = add_line(&mut receipt, 10);
            for q in &qtys {
                receive(&mut receipt, line_no, *q, true).unwrap();
            }
            prop_assert_eq!(receipt.line(line_no).unwrap().received_qty, qtys.iter().sum::<i64>());
        }
    }
}
