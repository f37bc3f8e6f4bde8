//! Uniqueness of human-facing keys (SKU, barcode, document refs, usernames).
//!
//! Aggregates cannot see each other, so "is this ref taken?" is answered here.
//! A key is first *reserved* for the operation that wants it, then either
//! committed with the events or released when the operation fails.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use wms_core::{AggregateId, DomainError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexScope {
    Sku,
    Barcode,
    ReceiptRef,
    OrderRef,
    Username,
}

impl IndexScope {
    pub fn label(self) -> &'static str {
        match self {
            IndexScope::Sku => "sku",
            IndexScope::Barcode => "barcode",
            IndexScope::ReceiptRef => "receipt ref",
            IndexScope::OrderRef => "order ref",
            IndexScope::Username => "username",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Slot {
    Reserved(AggregateId),
    Taken(AggregateId),
}

#[derive(Debug, Default)]
pub struct UniqueIndex {
    entries: RwLock<HashMap<(IndexScope, String), Slot>>,
}

impl UniqueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for `owner`, failing with `DuplicateRef` if anyone holds it.
    ///
    /// The returned guard releases the claim on drop unless committed.
    pub fn reserve(
        &self,
        scope: IndexScope,
        key: &str,
        owner: AggregateId,
    ) -> Result<Reservation<'_>, DomainError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let k = (scope, key.to_string());
        if let Some(Slot::Reserved(holder) | Slot::Taken(holder)) = entries.get(&k) {
            if *holder != owner {
                return Err(DomainError::duplicate(format!(
                    "{} '{key}' already exists",
                    scope.label()
                )));
            }
            return Ok(Reservation {
                index: self,
                key: None,
            });
        }
        entries.insert(k.clone(), Slot::Reserved(owner));
        Ok(Reservation {
            index: self,
            key: Some(k),
        })
    }

    /// Resolve a committed key to the aggregate holding it.
    pub fn lookup(&self, scope: IndexScope, key: &str) -> Option<AggregateId> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&(scope, key.to_string())) {
            Some(Slot::Taken(id)) => Some(*id),
            _ => None,
        }
    }

    /// Free a committed key (renames, barcode changes, deleted users).
    pub fn release(&self, scope: IndexScope, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(scope, key.to_string()));
    }

    /// Record a key as taken without going through a reservation (rebuilds).
    pub fn insert(&self, scope: IndexScope, key: &str, owner: AggregateId) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert((scope, key.to_string()), Slot::Taken(owner));
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    fn settle(&self, key: &(IndexScope, String), commit: bool) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key).copied() {
            Some(Slot::Reserved(owner)) if commit => {
                entries.insert(key.clone(), Slot::Taken(owner));
            }
            Some(Slot::Reserved(_)) => {
                entries.remove(key);
            }
            _ => {}
        }
    }
}

/// A pending claim on a unique key.
#[must_use = "a reservation is released when dropped; call commit() once the events are stored"]
#[derive(Debug)]
pub struct Reservation<'a> {
    index: &'a UniqueIndex,
    /// `None` when the owner already held the key.
    key: Option<(IndexScope, String)>,
}

impl Reservation<'_> {
    pub fn commit(mut self) {
        if let Some(key) = self.key.take() {
            self.index.settle(&key, true);
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.index.settle(&key, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_reservation_frees_the_key() {
        let index = UniqueIndex::new();
        let a = AggregateId::new();
        let b = AggregateId::new();

        let held = index.reserve(IndexScope::OrderRef, "ORD-001", a).unwrap();
        let err = index.reserve(IndexScope::OrderRef, "ORD-001", b).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateRef(_)));
        assert_eq!(index.lookup(IndexScope::OrderRef, "ORD-001"), None);

        drop(held);
        assert!(index.reserve(IndexScope::OrderRef, "ORD-001", b).is_ok());
    }

    #[test]
    fn committed_key_resolves_and_blocks_others() {
        let index = UniqueIndex::new();
        let a = AggregateId::new();

        index.reserve(IndexScope::Sku, "SKU-001", a).unwrap().commit();
        assert_eq!(index.lookup(IndexScope::Sku, "SKU-001"), Some(a));
        assert!(index.reserve(IndexScope::Sku, "SKU-001", AggregateId::new()).is_err());

        // Same owner may re-reserve its own key.
        index.reserve(IndexScope::Sku, "SKU-001", a).unwrap().commit();
        assert_eq!(index.lookup(IndexScope::Sku, "SKU-001"), Some(a));
    }

    #[test]
    fn scopes_are_independent() {
        let index = UniqueIndex::new();
        index.insert(IndexScope::ReceiptRef, "X-1", AggregateId::new());
        assert!(index.reserve(IndexScope::OrderRef, "X-1", AggregateId::new()).is_ok());
    }

    #[test]
    fn release_frees_a_committed_key() {
        let index = UniqueIndex::new();
        index.insert(IndexScope::Username, "picker", AggregateId::new());
        index.release(IndexScope::Username, "picker");
        assert_eq!(index.lookup(IndexScope::Username, "picker"), None);
    }
}
