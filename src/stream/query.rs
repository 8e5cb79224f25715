//! Query results and the read-only handle given to analyzers
//!
//! Every query copies the partition's record pointers once, at call time.
//! Iterating the result never observes records inserted afterwards; call
//! `query` again for a fresh view.

use crate::index::{IndexKey, IndexTable};
use std::sync::Arc;

/// Point-in-time snapshot of one partition
#[derive(Debug)]
pub struct QueryResults<T> {
    records: std::vec::IntoIter<Arc<T>>,
}

impl<T> QueryResults<T> {
    pub(crate) fn new(records: Vec<Arc<T>>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }

    /// Records remaining in the snapshot
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl<T> Iterator for QueryResults<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Arc<T>> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl<T> ExactSizeIterator for QueryResults<T> {}

/// Lazily filtered snapshot; the predicate runs as the caller iterates
pub struct Matching<T, P> {
    snapshot: QueryResults<T>,
    predicate: P,
}

impl<T, P> Iterator for Matching<T, P>
where
    P: FnMut(&T) -> bool,
{
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Arc<T>> {
        let predicate = &mut self.predicate;
        self.snapshot.by_ref().find(|record| predicate(&**record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.snapshot.remaining()))
    }
}

/// Read-only view of the engine's index table
///
/// Handed to every analyzer so it can run aggregate queries while reacting
/// to a record. It cannot insert or register anything.
pub struct QueryHandle<'a, T> {
    table: &'a IndexTable<T>,
}

impl<T> Clone for QueryHandle<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for QueryHandle<'_, T> {}

impl<'a, T> QueryHandle<'a, T> {
    pub(crate) fn new(table: &'a IndexTable<T>) -> Self {
        Self { table }
    }

    /// All records indexed under `key`; empty if the key was never produced
    pub fn query(&self, key: &IndexKey) -> QueryResults<T> {
        QueryResults::new(self.table.lookup(key))
    }

    /// Records under `key` accepted by `predicate`
    pub fn query_where<P>(&self, key: &IndexKey, predicate: P) -> Matching<T, P>
    where
        P: FnMut(&T) -> bool,
    {
        Matching {
            snapshot: self.query(key),
            predicate,
        }
    }

    /// Number of records under `key`
    pub fn count(&self, key: &IndexKey) -> usize {
        self.table.count(key)
    }
}
