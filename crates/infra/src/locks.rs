//! Per-key mutual exclusion for stock mutations.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A lazily-populated table of one mutex per key.
///
/// Stock-moving operations lock the items they touch so that two picks on
/// the same SKU decide against the same `on_hand`. Keys are always locked in
/// sorted order, so operations touching several items cannot deadlock.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    table: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Clone + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &K) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.entry(key.clone()).or_default().clone()
    }

    /// Run `f` while holding the locks for every key in `keys`.
    pub fn with_locks<R>(&self, keys: &[K], f: impl FnOnce() -> R) -> R {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = keys.iter().map(|k| self.handle(k)).collect();
        // A panic inside a previous holder left no partial state: the guarded
        // value is `()`, the real state lives in the event store.
        let _guards: Vec<MutexGuard<'_, ()>> = mutexes
            .iter()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        f()
    }

    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::thread;

    #[test]
    fn same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let in_section = Arc::new(AtomicI64::new(0));
        let max_seen = Arc::new(AtomicI64::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let in_section = Arc::clone(&in_section);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks.with_locks(&[7], || {
                        let now = in_section.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        in_section.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_keys_do_not_self_deadlock() {
        let locks = KeyedLocks::<u32>::new();
        let out = locks.with_locks(&[2, 1, 2], || 42);
        assert_eq!(out, 42);
        assert_eq!(locks.len(), 2);
    }
}
