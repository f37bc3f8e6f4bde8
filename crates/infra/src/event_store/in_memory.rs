use std::collections::HashMap;
use std::sync::RwLock;

use wms_core::AggregateId;

use super::r#trait::{EventStore, EventStoreError, StoredEvent, StreamAppend};

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<AggregateId, Vec<StoredEvent>>,
    next_position: u64,
}

/// In-memory append-only event store.
///
/// All streams live behind one `RwLock`, which makes multi-stream appends
/// trivially atomic.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: RwLock<Inner>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }

    fn validate(batch: &StreamAppend) -> Result<(), EventStoreError> {
        let Some(first) = batch.events.first() else {
            return Ok(());
        };
        for (idx, e) in batch.events.iter().enumerate() {
            if e.aggregate_id != batch.aggregate_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch contains multiple aggregate_ids (index {idx})"
                )));
            }
            if e.aggregate_type != first.aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "batch contains multiple aggregate_types (index {idx})"
                )));
            }
        }
        Ok(())
    }
}

impl EventStore for InMemoryEventStore {
    fn append_batch(&self, batch: Vec<StreamAppend>) -> Result<Vec<StoredEvent>, EventStoreError> {
        let batch: Vec<StreamAppend> = batch.into_iter().filter(|b| !b.events.is_empty()).collect();
        if batch.is_empty() {
            return Ok(vec![]);
        }

        for (idx, b) in batch.iter().enumerate() {
            Self::validate(b)?;
            if batch[..idx].iter().any(|o| o.aggregate_id == b.aggregate_id) {
                return Err(EventStoreError::InvalidAppend(format!(
                    "stream {} appears twice in one batch",
                    b.aggregate_id
                )));
            }
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        // Check every stream before writing any of them.
        for b in &batch {
            let stream = inner.streams.get(&b.aggregate_id).map(Vec::as_slice).unwrap_or(&[]);
            let current = Self::current_version(stream);
            if !b.expected_version.matches(current) {
                return Err(EventStoreError::Concurrency(format!(
                    "stream {}: expected {:?}, found {current}",
                    b.aggregate_id, b.expected_version
                )));
            }
            if let (Some(existing), Some(incoming)) = (stream.first(), b.events.first()) {
                if existing.aggregate_type != incoming.aggregate_type {
                    return Err(EventStoreError::AggregateTypeMismatch(format!(
                        "stream aggregate_type is '{}', attempted append with '{}'",
                        existing.aggregate_type, incoming.aggregate_type
                    )));
                }
            }
        }

        let mut committed = Vec::new();
        for b in batch {
            let mut position = inner.next_position;
            let stream = inner.streams.entry(b.aggregate_id).or_default();
            let mut next = Self::current_version(stream) + 1;
            for e in b.events {
                position += 1;
                let stored = StoredEvent {
                    event_id: e.event_id,
                    aggregate_id: e.aggregate_id,
                    aggregate_type: e.aggregate_type,
                    sequence_number: next,
                    global_position: position,
                    event_type: e.event_type,
                    event_version: e.event_version,
                    occurred_at: e.occurred_at,
                    payload: e.payload,
                };
                next += 1;
                stream.push(stored.clone());
                committed.push(stored);
            }
            inner.next_position = position;
        }

        Ok(committed)
    }

    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>, EventStoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        Ok(inner.streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    fn load_all(&self) -> Result<Vec<StoredEvent>, EventStoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        let mut all: Vec<StoredEvent> = inner.streams.values().flatten().cloned().collect();
        all.sort_by_key(|e| e.global_position);
        Ok(all)
    }
}
