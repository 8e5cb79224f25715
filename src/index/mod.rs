//! Tributary Index Structures
//!
//! - **IndexKey**: structural key derived from a record
//! - **Indexer**: record → optional key, applied to every ingested record
//! - **IndexTable**: concurrent key → append-only partition map
//!
//! # Architecture
//!
//! ```text
//! put(person)
//!     ↓
//! FirstLetterIndexer → {name: "j"}     ─┐
//! NameIndexer        → {name: "john"}  ─┼→ IndexTable
//! AdultIndexer       → None (skipped)   │   {name: "j"}    → [.., person]
//!                                       └─  {name: "john"} → [.., person]
//! ```

mod indexer;
mod key;
mod table;

pub use indexer::{Indexer, NamedIndexer};
pub use key::{IndexKey, KeyValue};
pub use table::{IndexTable, Partition};
