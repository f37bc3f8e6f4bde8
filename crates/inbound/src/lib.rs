//! Inbound receipts (event-sourced).
//!
//! A [`Receipt`] records what a vendor is expected to deliver and what has
//! actually been received, line by line. Receiving a line is always paired
//! with a stock ledger credit; that pairing is done by the unit of work in
//! `wms-infra`, not here.

pub mod receipt;

pub use receipt::{
    AddReceiptLine, CloseReceipt, CreateReceipt, Receipt, ReceiptClosed, ReceiptCommand,
    ReceiptCreated, ReceiptEvent, ReceiptId, ReceiptLine, ReceiptLineAdded, ReceiptLineReceived,
    ReceiptStatus, ReceiveLine,
};
