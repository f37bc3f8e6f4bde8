use serde::{Deserialize, Serialize};

use wms_core::DocumentRef;

/// Why a stock movement happened.
///
/// Every receive and pick names the document line that caused it, so the
/// movement history of an item can explain its `on_hand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementSource {
    ReceiptLine { receipt_ref: DocumentRef, line_no: u32 },
    OrderLine { order_ref: DocumentRef, line_no: u32 },
}

impl MovementSource {
    pub fn document_ref(&self) -> &DocumentRef {
        match self {
            MovementSource::ReceiptLine { receipt_ref, .. } => receipt_ref,
            MovementSource::OrderLine { order_ref, .. } => order_ref,
        }
    }

    pub fn line_no(&self) -> u32 {
        match self {
            MovementSource::ReceiptLine { line_no, .. } | MovementSource::OrderLine { line_no, .. } => {
                *line_no
            }
        }
    }
}

impl core::fmt::Display for MovementSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MovementSource::ReceiptLine { receipt_ref, line_no } => {
                write!(f, "receipt {receipt_ref} line {line_no}")
            }
            MovementSource::OrderLine { order_ref, line_no } => {
                write!(f, "order {order_ref} line {line_no}")
            }
        }
    }
}
