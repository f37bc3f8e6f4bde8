//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only. Every variant leaves state
/// unchanged: the command that produced it emits no events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or a value was malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The command is illegal in the aggregate's current state.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced document, item or user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique key (SKU, barcode, receipt/order ref, username) is taken.
    #[error("duplicate reference: {0}")]
    DuplicateRef(String),

    /// A pick asked for more than the item has on hand.
    #[error("insufficient stock for {sku}: requested {requested}, on hand {on_hand}")]
    InsufficientStock {
        sku: String,
        requested: i64,
        on_hand: i64,
    },

    /// Packing was attempted while some lines are not fully picked.
    #[error("order {order_ref} has lines not fully picked: {lines:?}")]
    IncompleteLines { order_ref: String, lines: Vec<u32> },

    /// Unknown username or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// A user tried to delete their own account.
    #[error("you cannot delete your own account")]
    SelfDeletion,

    /// Stale version / concurrent modification.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn duplicate(what: impl Into<String>) -> Self {
        Self::DuplicateRef(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable code, used by the HTTP layer and in logs.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) | DomainError::InvalidId(_) => "validation_error",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::NotFound(_) => "not_found",
            DomainError::DuplicateRef(_) => "duplicate_ref",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::IncompleteLines { .. } => "incomplete_lines",
            DomainError::InvalidCredentials => "invalid_credentials",
            DomainError::SelfDeletion => "self_deletion",
            DomainError::Conflict(_) => "conflict",
        }
    }
}
