//! Projection cursor/offset persistence.
//!
//! A cursor is the last applied `sequence_number` per (projection, stream).
//! Envelopes at or below the cursor are replays and are skipped, which makes
//! projections safe under at-least-once delivery.

use std::collections::HashMap;
use std::sync::RwLock;

use wms_core::AggregateId;

pub trait ProjectionCursorStore: Send + Sync {
    fn get_cursor(&self, aggregate_id: AggregateId, projection_name: &str) -> Option<u64>;

    fn update_cursor(&self, aggregate_id: AggregateId, projection_name: &str, sequence_number: u64);

    /// Forget every cursor of one projection (for rebuilds).
    fn clear_cursors(&self, projection_name: &str);
}

#[derive(Debug, Default)]
pub struct InMemoryCursorStore {
    cursors: RwLock<HashMap<(String, AggregateId), u64>>,
}

impl InMemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectionCursorStore for InMemoryCursorStore {
    fn get_cursor(&self, aggregate_id: AggregateId, projection_name: &str) -> Option<u64> {
        let cursors = self.cursors.read().ok()?;
        cursors.get(&(projection_name.to_string(), aggregate_id)).copied()
    }

    fn update_cursor(&self, aggregate_id: AggregateId, projection_name: &str, sequence_number: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert((projection_name.to_string(), aggregate_id), sequence_number);
        }
    }

    fn clear_cursors(&self, projection_name: &str) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|(name, _), _| name != projection_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursors_are_per_projection() {
        let store = InMemoryCursorStore::new();
        let id = AggregateId::new();
        store.update_cursor(id, "inventory", 3);
        store.update_cursor(id, "orders", 1);

        store.clear_cursors("inventory");

        assert_eq!(store.get_cursor(id, "inventory"), None);
        assert_eq!(store.get_cursor(id, "orders"), Some(1));
    }
}
