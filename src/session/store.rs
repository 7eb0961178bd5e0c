// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded, expiring keyed store.
//!
//! Backs both the pending-authorization table and the internal session
//! table. Only atomic per-key operations are exposed; there is no raw
//! iteration that could race with mutation.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// A record with a deadline in Unix milliseconds.
pub trait Expiring {
    fn expires_at(&self) -> u64;

    fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at()
    }
}

/// Why an insert was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertError {
    Occupied,
    Full,
}

pub struct BoundedStore<T> {
    entries: DashMap<String, T>,
    capacity: usize,
}

impl<T: Expiring> BoundedStore<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert unless the key exists or the store is full. A full store is
    /// swept once before giving up.
    ///
    /// The capacity check is per-call; concurrent inserts may overshoot it by
    /// at most the number of racing writers.
    pub fn insert_if_absent(&self, key: String, value: T, now_ms: u64) -> Result<(), InsertError> {
        if self.entries.len() >= self.capacity {
            self.sweep_expired(now_ms);
            if self.entries.len() >= self.capacity {
                return Err(InsertError::Full);
            }
        }

        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(InsertError::Occupied),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Atomically remove and return the entry. Two concurrent callers never
    /// both receive it.
    pub fn take(&self, key: &str) -> Option<T> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    /// Replace the entry only if it is still present. Returns the previous
    /// value, which the caller drops.
    pub fn replace_if_present(&self, key: &str, value: T) -> Result<T, T> {
        match self.entries.get_mut(key) {
            Some(mut slot) => Ok(std::mem::replace(slot.value_mut(), value)),
            None => Err(value),
        }
    }

    /// Run `f` against the entry under its shard lock.
    pub fn with<R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.entries.get(key).map(|entry| f(entry.value()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, value| !value.is_expired(now_ms));
        before.saturating_sub(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    struct Item(u64);

    impl Expiring for Item {
        fn expires_at(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn insert_if_absent_refuses_duplicates() {
        let store = BoundedStore::new(10);
        assert!(store.insert_if_absent("a".into(), Item(100), 0).is_ok());
        assert_eq!(
            store.insert_if_absent("a".into(), Item(200), 0),
            Err(InsertError::Occupied)
        );
        assert_eq!(store.with("a", |item| item.0), Some(100));
    }

    #[test]
    fn full_store_sweeps_before_refusing() {
        let store = BoundedStore::new(2);
        store.insert_if_absent("a".into(), Item(10), 0).unwrap();
        store.insert_if_absent("b".into(), Item(1_000), 0).unwrap();

        // "a" is expired at t=50 and gets swept to make room.
        assert!(store.insert_if_absent("c".into(), Item(1_000), 50).is_ok());
        assert!(!store.contains("a"));

        assert_eq!(
            store.insert_if_absent("d".into(), Item(1_000), 50),
            Err(InsertError::Full)
        );
    }

    #[test]
    fn take_is_single_use() {
        let store = BoundedStore::new(10);
        store.insert_if_absent("k".into(), Item(100), 0).unwrap();
        assert_eq!(store.take("k"), Some(Item(100)));
        assert_eq!(store.take("k"), None);
    }

    #[test]
    fn take_races_have_one_winner() {
        let store = Arc::new(BoundedStore::new(10));
        store.insert_if_absent("k".into(), Item(100), 0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.take("k").is_some())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn replace_only_when_present() {
        let store = BoundedStore::new(10);
        assert_eq!(store.replace_if_present("k", Item(1)), Err(Item(1)));

        store.insert_if_absent("k".into(), Item(1), 0).unwrap();
        assert_eq!(store.replace_if_present("k", Item(2)), Ok(Item(1)));
        assert_eq!(store.with("k", |item| item.0), Some(2));
    }

    #[test]
    fn sweep_removes_only_expired() {
        let store = BoundedStore::new(10);
        store.insert_if_absent("old".into(), Item(10), 0).unwrap();
        store.insert_if_absent("new".into(), Item(100), 0).unwrap();

        assert_eq!(store.sweep_expired(10), 1);
        assert!(store.contains("new"));
        assert_eq!(store.len(), 1);
    }
}
