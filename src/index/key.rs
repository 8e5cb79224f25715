//! Index keys
//!
//! An `IndexKey` is a small bundle of named fields derived from a record by an
//! indexer. Keys compare structurally: `{name: "john"}` produced by one indexer
//! is the same partition as `{name: "john"}` produced by any other.
//!
//! # Example
//! ```
//! use tributary::IndexKey;
//!
//! let a = IndexKey::field("name", "john").with("age", 2);
//! let b = IndexKey::field("age", 2).with("name", "john");
//! assert_eq!(a, b);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single field value inside an index key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Str(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Str(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(value as i64)
    }
}

impl From<u32> for KeyValue {
    fn from(value: u32) -> Self {
        KeyValue::Int(value as i64)
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        KeyValue::Bool(value)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Bool(b) => write!(f, "{}", b),
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Structurally-compared key for one index partition
///
/// Fields are kept sorted by name, so equality and hashing never depend on
/// the order an indexer added them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexKey {
    fields: BTreeMap<String, KeyValue>,
}

impl IndexKey {
    /// Create an empty key
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a key with a single field
    pub fn field(name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        Self::new().with(name, value)
    }

    /// Builder method: add or replace a field
    pub fn with(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value by name
    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.fields.get(name)
    }

    /// Iterate over fields in canonical (name) order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = IndexKey::field("name", "john");
        let b = IndexKey::field("name", "john".to_string());
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_field_order_is_canonical() {
        let a = IndexKey::new().with("name", "john").with("age", 2);
        let b = IndexKey::new().with("age", 2).with("name", "john");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_different_fields_differ() {
        let by_name = IndexKey::field("name", "j");
        let by_initial = IndexKey::field("initial", "j");
        assert_ne!(by_name, by_initial);

        // Value types are part of equality
        assert_ne!(IndexKey::field("n", 4), IndexKey::field("n", "4"));
    }

    #[test]
    fn test_accessors() {
        let key = IndexKey::field("name", "john").with("adult", true);

        assert_eq!(key.len(), 2);
        assert!(!key.is_empty());
        assert_eq!(key.get("adult"), Some(&KeyValue::Bool(true)));
        assert!(key.get("missing").is_none());

        let names: Vec<&str> = key.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["adult", "name"]);
    }

    #[test]
    fn test_display() {
        let key = IndexKey::field("name", "john").with("age", 2);
        assert_eq!(key.to_string(), r#"{age: 2, name: "john"}"#);
        assert_eq!(IndexKey::new().to_string(), "{}");
    }

    #[test]
    fn test_json_shape() {
        let key = IndexKey::field("name", "john").with("age", 2);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"age":2,"name":"john"}"#);

        let parsed: IndexKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
