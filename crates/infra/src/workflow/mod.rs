//! Warehouse workflow service: the operations a UI calls.
//!
//! Every mutating operation follows the same path:
//!
//! ```text
//! authorize (policy table, once)
//!   ↓
//! UnitOfWork: load snapshots → decide → stage   (item lock held for stock moves)
//!   ↓
//! commit: atomic append, CAS per stream          (retried on a lost race)
//!   ↓
//! projections updated → envelopes published
//! ```

mod items;
mod orders;
mod receipts;
mod users;

use std::sync::{Mutex, PoisonError};

use serde_json::Value as JsonValue;

use wms_auth::{Permission, PasswordHasher, Policy, Principal, authorize, explain_authorization};
use wms_core::{AggregateId, DomainError};
use wms_events::{EventBus, EventEnvelope, InMemoryEventBus};
use wms_inbound::ReceiptId;
use wms_inventory::ItemId;
use wms_outbound::OrderId;

use crate::config::WmsConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::event_store::{EventStore, InMemoryEventStore, StoredEvent};
use crate::locks::KeyedLocks;
use crate::projections::{DashboardSummary, Projections, summarize};
use crate::unique_index::{IndexScope, UniqueIndex};
use crate::unit_of_work::UnitOfWork;

pub use items::{ItemChanges, NewItem};
pub use users::UserChanges;

pub type InMemoryWarehouse = WarehouseService<InMemoryEventStore, InMemoryEventBus<EventEnvelope<JsonValue>>>;

pub struct WarehouseService<S, B> {
    store: S,
    bus: B,
    projections: Projections,
    index: UniqueIndex,
    item_locks: KeyedLocks<ItemId>,
    commit_lock: Mutex<()>,
    policy: Policy,
    hasher: PasswordHasher,
    config: WmsConfig,
}

impl InMemoryWarehouse {
    pub fn in_memory(config: WmsConfig) -> Self {
        Self {
            store: InMemoryEventStore::new(),
            bus: InMemoryEventBus::new(),
            projections: Projections::in_memory(),
            index: UniqueIndex::new(),
            item_locks: KeyedLocks::new(),
            commit_lock: Mutex::new(()),
            policy: Policy::standard(),
            hasher: PasswordHasher::new(config.bcrypt_cost),
            config,
        }
    }
}

impl<S, B> WarehouseService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Open a service over an existing store, rebuilding read models and
    /// unique indexes from its history.
    pub fn open(store: S, bus: B, config: WmsConfig) -> WorkflowResult<Self> {
        let service = Self {
            store,
            bus,
            projections: Projections::in_memory(),
            index: UniqueIndex::new(),
            item_locks: KeyedLocks::new(),
            commit_lock: Mutex::new(()),
            policy: Policy::standard(),
            hasher: PasswordHasher::new(config.bcrypt_cost),
            config,
        };
        service.rebuild()?;
        Ok(service)
    }

    pub fn config(&self) -> &WmsConfig {
        &self.config
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replay the whole store into fresh read models and indexes.
    pub fn rebuild(&self) -> WorkflowResult<usize> {
        let _guard = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let events = self.store.load_all()?;
        let applied = self
            .projections
            .rebuild(events.iter().map(StoredEvent::to_envelope))?;

        self.index.clear();
        for item in self.projections.inventory.list() {
            self.index.insert(IndexScope::Sku, &item.sku, item.item_id.0);
            if let Some(barcode) = &item.barcode {
                self.index.insert(IndexScope::Barcode, barcode, item.item_id.0);
            }
        }
        for receipt in self.projections.receipts.list() {
            self.index.insert(IndexScope::ReceiptRef, &receipt.receipt_ref, receipt.receipt_id.0);
        }
        for order in self.projections.orders.list() {
            self.index.insert(IndexScope::OrderRef, &order.order_ref, order.order_id.0);
        }
        for user in self.projections.users.list() {
            self.index.insert(IndexScope::Username, &user.username, user.user_id.into());
        }

        tracing::info!(events = applied, "read models rebuilt");
        Ok(applied)
    }

    pub fn is_empty(&self) -> WorkflowResult<bool> {
        Ok(self.store.load_all()?.is_empty())
    }

    pub fn dashboard(&self, actor: &Principal) -> WorkflowResult<DashboardSummary> {
        self.authorize(actor, Permission::DashboardRead)?;
        let items = self.projections.inventory.list();
        let orders = self.projections.orders.list();
        Ok(summarize(&items, &orders))
    }

    /// The caller as the user store sees them now.
    ///
    /// A deleted user is rejected, and the stored role replaces whatever
    /// role the caller's token was issued with.
    pub fn resolve_principal(&self, actor: &Principal) -> WorkflowResult<Principal> {
        let Some(user) = self.projections.users.get(&actor.user_id) else {
            tracing::warn!(user = %actor.username, user_id = %actor.user_id, "unknown or deleted user");
            return Err(WorkflowError::Unauthenticated(format!(
                "user {} does not exist",
                actor.user_id
            )));
        };
        Ok(Principal::new(user.user_id, user.username, user.role))
    }

    fn authorize(&self, actor: &Principal, permission: Permission) -> WorkflowResult<()> {
        let current = self.resolve_principal(actor)?;
        authorize(&current, permission, &self.policy).map_err(|e| {
            let explanation = explain_authorization(&current, permission, &self.policy);
            tracing::warn!(
                user = %current.username,
                role = %current.role,
                permission = %permission,
                reason = %explanation.reason,
                "operation denied"
            );
            WorkflowError::from(e)
        })
    }

    /// Run `attempt` in a fresh unit of work and commit it, retrying from a
    /// fresh load when the commit loses a compare-and-swap.
    fn run<T>(
        &self,
        op: &'static str,
        attempt: impl Fn(&mut UnitOfWork<'_, S>) -> WorkflowResult<T>,
    ) -> WorkflowResult<T> {
        let max_attempts = self.config.commit_retries.max(1);
        for n in 1..=max_attempts {
            let mut uow = UnitOfWork::begin(&self.store);
            let outcome = attempt(&mut uow).and_then(|value| {
                self.commit(op, uow)?;
                Ok(value)
            });

            match outcome {
                Err(e) if e.is_retryable() => {
                    tracing::debug!(op, attempt = n, error = %e, "commit lost a race; retrying");
                }
                Err(e) => {
                    tracing::warn!(op, code = e.code(), error = %e, "operation rejected");
                    return Err(e);
                }
                Ok(value) => return Ok(value),
            }
        }

        let err = WorkflowError::from(DomainError::conflict(format!(
            "{op}: concurrent modification, gave up after {max_attempts} attempts"
        )));
        tracing::warn!(op, code = err.code(), "operation rejected");
        Err(err)
    }

    fn commit(&self, op: &'static str, uow: UnitOfWork<'_, S>) -> WorkflowResult<()> {
        let _guard = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let staged = uow.staged_len();
        let committed = uow.commit()?;
        tracing::debug!(op, staged, committed = committed.len(), "unit of work committed");

        for stored in &committed {
            let envelope = stored.to_envelope();
            if let Err(e) = self.projections.apply(&envelope) {
                tracing::error!(op, event_type = %stored.event_type, error = %e, "projection failed");
            }
            if let Err(e) = self.bus.publish(envelope) {
                tracing::warn!(op, event_type = %stored.event_type, error = ?e, "publish failed");
            }
        }
        Ok(())
    }

    fn resolve(&self, scope: IndexScope, key: &str) -> WorkflowResult<AggregateId> {
        self.index
            .lookup(scope, key.trim())
            .ok_or_else(|| DomainError::not_found(format!("{} '{}'", scope.label(), key.trim())).into())
    }

    fn item_id(&self, sku: &str) -> WorkflowResult<ItemId> {
        self.resolve(IndexScope::Sku, sku).map(ItemId::new)
    }

    fn receipt_id(&self, receipt_ref: &str) -> WorkflowResult<ReceiptId> {
        self.resolve(IndexScope::ReceiptRef, receipt_ref).map(ReceiptId::new)
    }

    fn order_id(&self, order_ref: &str) -> WorkflowResult<OrderId> {
        self.resolve(IndexScope::OrderRef, order_ref).map(OrderId::new)
    }

    /// A view that must exist right after our own commit.
    fn committed_view<T>(view: Option<T>, what: impl Into<String>) -> WorkflowResult<T> {
        view.ok_or_else(|| DomainError::not_found(what).into())
    }
}
