//! Named mutual exclusion across resources.
//!
//! Resources that must not be mutated concurrently (e.g. children of one
//! parent that the backend serialises badly) declare a common lock name.
//! A [`LockTable`] hands out one async mutex per name; [`LockSet`] holds the
//! guards of one mutation and releases all of them when dropped.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct LockTable {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Guards held for one mutation, released together on drop.
///
/// Dropping the set also forgets every name nobody else is holding or
/// waiting for, so the table only tracks names in use.
#[derive(Debug)]
pub struct LockSet {
    names: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl LockSet {
    /// Names held, in acquisition order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Drop for LockSet {
    fn drop(&mut self) {
        if !self.guards.is_empty() {
            tracing::debug!(locks = ?self.names, "releasing locks");
        }
        self.guards.clear();
        // The table's own reference is the only one left when no task holds
        // or awaits the mutex. Waiters clone it under the same shard lock.
        for name in &self.names {
            self.locks
                .remove_if(name, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutex(&self, name: &str) -> Arc<Mutex<()>> {
        // The shard guard must not live across an await point.
        self.locks.entry(name.to_string()).or_default().clone()
    }

    /// Blocks until every named lock is held.
    ///
    /// Names are de-duplicated and taken in sorted order, so two mutations
    /// naming the same locks in different orders cannot deadlock. If the
    /// returned future is dropped half-way, locks taken so far are released.
    pub async fn acquire_all<S: AsRef<str>>(&self, names: &[S]) -> LockSet {
        let mut sorted: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        sorted.sort();
        sorted.dedup();

        let mut set = LockSet {
            guards: Vec::with_capacity(sorted.len()),
            names: sorted,
            locks: self.locks.clone(),
        };
        for name in &set.names {
            tracing::debug!(lock = %name, "acquiring lock");
            set.guards.push(self.mutex(name).lock_owned().await);
        }
        set
    }

    /// Number of lock names currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Whether some mutation currently holds `name`.
    pub fn is_locked(&self, name: &str) -> bool {
        match self.locks.get(name) {
            Some(mutex) => mutex.try_lock().is_err(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_release_on_drop() {
        let table = LockTable::new();
        let set = table.acquire_all(&["b", "a", "b"]).await;
        assert_eq!(set.names(), ["a", "b"]);
        assert!(table.is_locked("a"));
        assert!(table.is_locked("b"));
        drop(set);
        assert!(!table.is_locked("a"));
        assert!(!table.is_locked("b"));
        assert!(!table.is_locked("never-used"));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_names_with_waiters_stay_tracked() {
        let table = LockTable::new();
        let held = table.acquire_all(&["shared"]).await;

        let contender = table.clone();
        let waiter = tokio::spawn(async move {
            let set = contender.acquire_all(&["shared"]).await;
            set.names().to_vec()
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        assert_eq!(table.len(), 1);
        let names = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(names, ["shared"]);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_sets_serialize() {
        let table = LockTable::new();
        let held = table.acquire_all(&["shared"]).await;

        let contender = table.clone();
        let waiter = tokio::spawn(async move {
            let _set = contender.acquire_all(&["other", "shared"]).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_acquisition_releases_partial_locks() {
        let table = LockTable::new();
        let held = table.acquire_all(&["b"]).await;

        let attempt = tokio::time::timeout(
            Duration::from_millis(20),
            table.acquire_all(&["a", "b"]),
        )
        .await;
        assert!(attempt.is_err());
        assert!(!table.is_locked("a"));
        drop(held);
        assert!(table.is_empty());
    }
}
