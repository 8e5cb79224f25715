//! Index Table - Concurrent key → partition map
//!
//! Maps `IndexKey` → append-only `Partition` of records.
//!
//! # Design Notes
//! - `DashMap` shards the key space, so inserts under different keys rarely contend
//! - Each partition has its own `RwLock`; the shard lock is only held long
//!   enough to find or create the partition
//! - Records are shared as `Arc<T>`: one record indexed under three keys is stored once
//! - Nothing is ever removed

use crate::index::IndexKey;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only multiset of records stored under one key
#[derive(Debug)]
pub struct Partition<T> {
    records: RwLock<Vec<Arc<T>>>,
}

impl<T> Default for Partition<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T> Partition<T> {
    /// Append a record
    pub fn push(&self, record: Arc<T>) {
        self.records.write().push(record);
    }

    /// Copy out the records present right now
    ///
    /// Only the `Arc`s are cloned; the returned vector is unaffected by later pushes.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Concurrent mapping from index key to partition
#[derive(Debug)]
pub struct IndexTable<T> {
    partitions: DashMap<IndexKey, Arc<Partition<T>>>,
}

impl<T> Default for IndexTable<T> {
    fn default() -> Self {
        Self {
            partitions: DashMap::new(),
        }
    }
}

impl<T> IndexTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` to the partition for `key`, creating it if absent
    pub fn insert(&self, key: IndexKey, record: Arc<T>) {
        // Release the shard guard before taking the partition lock
        let partition = Arc::clone(self.partitions.entry(key).or_default().value());
        partition.push(record);
    }

    /// Snapshot of every record stored under `key`
    ///
    /// Unseen keys yield an empty vector.
    pub fn lookup(&self, key: &IndexKey) -> Vec<Arc<T>> {
        match self.partition(key) {
            Some(partition) => partition.snapshot(),
            None => Vec::new(),
        }
    }

    /// Number of records under `key` without copying them
    pub fn count(&self, key: &IndexKey) -> usize {
        self.partition(key).map(|p| p.len()).unwrap_or(0)
    }

    fn partition(&self, key: &IndexKey) -> Option<Arc<Partition<T>>> {
        self.partitions.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.partitions.contains_key(key)
    }

    /// Number of distinct keys
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Total number of (key, record) entries across all partitions
    pub fn entry_count(&self) -> usize {
        self.partitions.iter().map(|entry| entry.value().len()).sum()
    }

    /// All keys seen so far (unordered)
    pub fn keys(&self) -> Vec<IndexKey> {
        self.partitions.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_insert_and_lookup() {
        let table = IndexTable::new();
        let john = IndexKey::field("name", "john");
        let alice = IndexKey::field("name", "alice");

        table.insert(john.clone(), Arc::new("John"));
        table.insert(john.clone(), Arc::new("JOHN"));
        table.insert(alice.clone(), Arc::new("alice"));

        let johns = table.lookup(&john);
        assert_eq!(johns.len(), 2);
        assert!(johns.iter().any(|r| **r == "John"));
        assert!(johns.iter().any(|r| **r == "JOHN"));

        assert_eq!(table.count(&alice), 1);
        assert_eq!(table.partition_count(), 2);
        assert_eq!(table.entry_count(), 3);
    }

    #[test]
    fn test_lookup_missing_is_empty() {
        let table: IndexTable<u32> = IndexTable::new();
        let key = IndexKey::field("never", "seen");

        assert!(table.lookup(&key).is_empty());
        assert_eq!(table.count(&key), 0);
        assert!(!table.contains_key(&key));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let table = IndexTable::new();
        let key = IndexKey::field("n", 1);
        let record = Arc::new(7u32);

        table.insert(key.clone(), Arc::clone(&record));
        table.insert(key.clone(), Arc::clone(&record));

        assert_eq!(table.count(&key), 2);
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let table = IndexTable::new();
        let key = IndexKey::field("n", 1);
        table.insert(key.clone(), Arc::new(1u32));

        let snapshot = table.lookup(&key);
        table.insert(key.clone(), Arc::new(2u32));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(table.count(&key), 2);
    }

    #[test]
    fn test_concurrent_inserts() {
        let table = Arc::new(IndexTable::new());
        let shared = IndexKey::field("bucket", "shared");

        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let table = Arc::clone(&table);
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..500u32 {
                        let value = t * 1000 + i;
                        table.insert(shared.clone(), Arc::new(value));
                        table.insert(IndexKey::field("value", value), Arc::new(value));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.count(&shared), 8 * 500);
        assert_eq!(table.partition_count(), 8 * 500 + 1);
        assert_eq!(table.count(&IndexKey::field("value", 7042u32)), 1);
    }

    #[test]
    fn test_keys() {
        let table = IndexTable::new();
        table.insert(IndexKey::field("a", 1), Arc::new(()));
        table.insert(IndexKey::field("b", 2), Arc::new(()));

        let mut keys = table.keys();
        keys.sort();
        assert_eq!(keys, vec![IndexKey::field("a", 1), IndexKey::field("b", 2)]);
    }
}
