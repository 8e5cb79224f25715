//! Tributary Stream Engine
//!
//! This module provides ingestion, reactive analysis and querying:
//!
//! - **analyzer**: Analyzer trait with optional index gate and filter
//! - **gate**: Gating cache built once per analyzer at registration
//! - **query**: Snapshot results and the read-only analyzer handle
//! - **engine**: StreamEngine orchestrating the two-phase `put`
//! - **error**: Error and fault types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   put(record) → [indexers ∥] → IndexTable + matched keys
//!               ── barrier ──
//!               → [gate → analyzer ∥] → side effects / self-queries
//!
//! Read Path:
//!   query(key) → partition snapshot → optional lazy predicate
//! ```
//!
//! # Example
//!
//! ```rust
//! use tributary::stream::{Analyzer, QueryHandle, StreamEngine};
//! use tributary::IndexKey;
//!
//! struct JohnWatcher;
//!
//! impl Analyzer<String> for JohnWatcher {
//!     fn analyze(&self, stream: &QueryHandle<'_, String>, _record: &String) {
//!         let johns = stream.query(&IndexKey::field("name", "john")).count();
//!         println!("Johns found: {}", johns);
//!     }
//!
//!     fn only_on_index(&self) -> Option<IndexKey> {
//!         Some(IndexKey::field("name", "john"))
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = StreamEngine::new()?;
//!     stream.add_indexer(|name: &String| Some(IndexKey::field("name", name.to_lowercase())))?;
//!     stream.add_analyzer(JohnWatcher)?;
//!
//!     stream.put("John".to_string());
//!     stream.put("alice".to_string());
//!
//!     assert_eq!(stream.query(&IndexKey::field("name", "john")).count(), 1);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod engine;
pub mod error;
pub mod gate;
pub mod query;

// Re-export commonly used types
pub use analyzer::Analyzer;
pub use engine::{BatchReport, EngineStats, PutReport, StreamEngine};
pub use error::{EngineError, EngineResult, Fault, RegistrantKind, Stage};
pub use gate::{Gate, GateKind, MatchedKeys};
pub use query::{Matching, QueryHandle, QueryResults};
