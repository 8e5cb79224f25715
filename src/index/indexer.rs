//! Indexers derive at most one key per record.
//!
//! Any `Fn(&T) -> Option<IndexKey>` closure is an indexer. Wrap it in
//! [`NamedIndexer`] to get a readable name in logs and fault reports.

use crate::index::IndexKey;

/// Pure mapping from a record to an optional index key
///
/// Returning `None` leaves the record out of this indexer's contribution.
/// The engine may call `derive_key` for the same record from several threads
/// (one call per indexer), so implementations must not mutate shared state.
pub trait Indexer<T>: Send + Sync {
    fn derive_key(&self, record: &T) -> Option<IndexKey>;

    /// Name used in logs and fault reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T, F> Indexer<T> for F
where
    F: Fn(&T) -> Option<IndexKey> + Send + Sync,
{
    fn derive_key(&self, record: &T) -> Option<IndexKey> {
        self(record)
    }
}

/// A closure indexer with an explicit name
pub struct NamedIndexer<F> {
    name: String,
    derive: F,
}

impl<F> NamedIndexer<F> {
    pub fn new(name: impl Into<String>, derive: F) -> Self {
        Self {
            name: name.into(),
            derive,
        }
    }
}

impl<T, F> Indexer<T> for NamedIndexer<F>
where
    F: Fn(&T) -> Option<IndexKey> + Send + Sync,
{
    fn derive_key(&self, record: &T) -> Option<IndexKey> {
        (self.derive)(record)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowercase_name(name: &String) -> Option<IndexKey> {
        Some(IndexKey::field("name", name.to_lowercase()))
    }

    #[test]
    fn test_closure_indexer() {
        let indexer = |n: &i64| (*n > 0).then(|| IndexKey::field("positive", true));

        assert_eq!(indexer.derive_key(&5), Some(IndexKey::field("positive", true)));
        assert_eq!(indexer.derive_key(&-5), None);
    }

    #[test]
    fn test_fn_item_indexer() {
        let key = Indexer::derive_key(&lowercase_name, &"JoHn".to_string());
        assert_eq!(key, Some(IndexKey::field("name", "john")));
    }

    #[test]
    fn test_named_indexer() {
        let indexer = NamedIndexer::new("first-letter", |s: &String| {
            s.chars()
                .next()
                .map(|c| IndexKey::field("name", c.to_lowercase().to_string()))
        });

        assert_eq!(Indexer::<String>::name(&indexer), "first-letter");
        assert_eq!(
            indexer.derive_key(&"Alice".to_string()),
            Some(IndexKey::field("name", "a"))
        );
        assert_eq!(indexer.derive_key(&String::new()), None);
    }
}
