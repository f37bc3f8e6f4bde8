use chrono::{DateTime, Utc};

/// A warehouse domain event.
///
/// Events are facts: once appended to a stream they are never edited. The
/// ledger of stock movements is simply the item streams read in order.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. `"inventory.stock.picked"`).
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
