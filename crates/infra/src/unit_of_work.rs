//! Explicit unit of work for one workflow operation.
//!
//! ```text
//! load (snapshot + stream version) ─┐
//! load ...                          ├─ decide ─ stage ─ commit (CAS per stream, all-or-nothing)
//! ```
//!
//! Loaded aggregates are plain values; nothing is written until [`UnitOfWork::commit`].
//! Receiving a receipt line stages events for the receipt *and* the item, and both
//! land in one atomic append or neither does.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use wms_core::{Aggregate, AggregateId, ExpectedVersion};

use crate::error::{WorkflowError, WorkflowResult};
use crate::event_store::{EventStore, EventStoreError, StoredEvent, StreamAppend, UncommittedEvent};

pub struct UnitOfWork<'s, S: ?Sized> {
    store: &'s S,
    loaded: HashMap<AggregateId, u64>,
    staged: Vec<StreamAppend>,
}

impl<'s, S> UnitOfWork<'s, S>
where
    S: EventStore + ?Sized,
{
    pub fn begin(store: &'s S) -> Self {
        Self {
            store,
            loaded: HashMap::new(),
            staged: Vec::new(),
        }
    }

    /// Rehydrate an aggregate and remember the stream version it was read at.
    ///
    /// A stream that does not exist yields `make()` untouched (version 0).
    pub fn load<A>(&mut self, aggregate_id: AggregateId, make: impl FnOnce() -> A) -> WorkflowResult<A>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;

        let mut aggregate = make();
        apply_history(&mut aggregate, &history)?;

        self.loaded.insert(aggregate_id, stream_version(&history));
        Ok(aggregate)
    }

    /// Queue decided events for `aggregate_id`.
    ///
    /// The stream is expected to still be at the version it was loaded at
    /// (or absent, if it was never loaded).
    pub fn stage<E>(
        &mut self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        events: &[E],
    ) -> WorkflowResult<()>
    where
        E: wms_events::Event + Serialize,
    {
        if events.is_empty() {
            return Ok(());
        }

        let uncommitted = events
            .iter()
            .map(|ev| UncommittedEvent::from_typed(aggregate_id, aggregate_type, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(existing) = self.staged.iter_mut().find(|s| s.aggregate_id == aggregate_id) {
            existing.events.extend(uncommitted);
            return Ok(());
        }

        let expected_version = match self.loaded.get(&aggregate_id) {
            Some(0) | None => ExpectedVersion::NoStream,
            Some(v) => ExpectedVersion::Exact(*v),
        };

        self.staged.push(StreamAppend {
            aggregate_id,
            expected_version,
            events: uncommitted,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Number of staged events across all streams.
    pub fn staged_len(&self) -> usize {
        self.staged.iter().map(|s| s.events.len()).sum()
    }

    /// Append everything staged in one atomic batch.
    pub fn commit(self) -> WorkflowResult<Vec<StoredEvent>> {
        if self.staged.is_empty() {
            return Ok(vec![]);
        }
        Ok(self.store.append_batch(self.staged)?)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(aggregate_id: AggregateId, stream: &[StoredEvent]) -> WorkflowResult<()> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))
            .into());
        }
        if e.sequence_number != last + 1 {
            return Err(EventStoreError::InvalidAppend(format!(
                "gap or reorder in loaded stream (last={last}, found={})",
                e.sequence_number
            ))
            .into());
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> WorkflowResult<()>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| WorkflowError::Deserialize(format!("{}: {e}", stored.event_type)))?;
        aggregate.apply(&ev);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wms_core::{AggregateRoot, DocumentRef, Quantity};
    use wms_inventory::{CreateItem, Item, ItemCommand, ItemId, MovementSource, PickStock};

    use crate::event_store::InMemoryEventStore;

    fn create_item(item_id: ItemId, opening_stock: i64) -> ItemCommand {
        ItemCommand::CreateItem(CreateItem {
            item_id,
            sku: "SKU-001".to_string(),
            name: "Cardboard Box Small".to_string(),
            barcode: None,
            bin_location: None,
            reorder_point: 20,
            opening_stock,
            occurred_at: Utc::now(),
        })
    }

    fn pick(item_id: ItemId, qty: i64) -> ItemCommand {
        ItemCommand::PickStock(PickStock {
            item_id,
            qty: Quantity::new(qty).unwrap(),
            source: MovementSource::OrderLine {
                order_ref: DocumentRef::new("ORD-001").unwrap(),
                line_no: 1,
            },
            occurred_at: Utc::now(),
        })
    }

    fn run(store: &InMemoryEventStore, item_id: ItemId, cmd: ItemCommand) -> WorkflowResult<Item> {
        let mut uow = UnitOfWork::begin(store);
        let item: Item = uow.load(item_id.0, || Item::empty(item_id))?;
        let events = item.handle(&cmd)?;
        uow.stage(item_id.0, "inventory.item", &events)?;
        uow.commit()?;
        let mut check = UnitOfWork::begin(store);
        check.load(item_id.0, || Item::empty(item_id))
    }

    #[test]
    fn load_rehydrates_at_stream_version() {
        let store = InMemoryEventStore::new();
        let item_id = ItemId::new(AggregateId::new());

        run(&store, item_id, create_item(item_id, 100)).unwrap();
        let item = run(&store, item_id, pick(item_id, 5)).unwrap();

        assert_eq!(item.on_hand(), 95);
        assert_eq!(item.version(), 2);
    }

    #[test]
    fn stale_snapshot_loses_the_compare_and_swap() {
        let store = InMemoryEventStore::new();
        let item_id = ItemId::new(AggregateId::new());
        run(&store, item_id, create_item(item_id, 100)).unwrap();

        let mut slow = UnitOfWork::begin(&store);
        let stale: Item = slow.load(item_id.0, || Item::empty(item_id)).unwrap();

        run(&store, item_id, pick(item_id, 60)).unwrap();

        let events = stale.handle(&pick(item_id, 60)).unwrap();
        slow.stage(item_id.0, "inventory.item", &events).unwrap();
        let err = slow.commit().unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(store.load_stream(item_id.0).unwrap().len(), 2);
    }

    #[test]
    fn empty_unit_of_work_commits_nothing() {
        let store = InMemoryEventStore::new();
        let uow = UnitOfWork::begin(&store);
        assert!(uow.is_empty());
        assert!(uow.commit().unwrap().is_empty());
        assert!(store.load_all().unwrap().is_empty());
    }
}
