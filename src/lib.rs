//! # Tributary
//!
//! An in-memory, continuously-ingested record store that keeps several
//! secondary indexes current as records stream in, and runs reactive
//! analyzers on each new record gated by the indexes it matched.
//!
//! ## Features
//!
//! - **Concurrent indexes**: every registered indexer runs in parallel on each record
//! - **Read-your-writes**: a record is queryable as soon as its `put` returns
//! - **Gated analyzers**: run only on records indexed under a given key and/or
//!   accepted by a filter, decided by a gate computed once at registration
//! - **Self-referential analysis**: analyzers receive a read-only query handle
//! - **Fault isolation**: a panicking registrant does not take down the `put`
//!
//! ## Modules
//!
//! - [`index`]: Index keys, indexers and the concurrent index table
//! - [`stream`]: Analyzers, gating, queries and the stream engine
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use tributary::{IndexKey, StreamEngine};
//!
//! #[derive(Debug)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = StreamEngine::new()?;
//!
//!     // Index people by lowercased name
//!     stream.add_indexer(|p: &Person| Some(IndexKey::field("name", p.name.to_lowercase())))?;
//!
//!     stream.put(Person { name: "John".into(), age: 35 });
//!     stream.put(Person { name: "JOHN".into(), age: 2 });
//!     stream.put(Person { name: "alice".into(), age: 20 });
//!
//!     let toddlers: Vec<_> = stream
//!         .query_where(&IndexKey::field("name", "john"), |p| p.age == 2)
//!         .collect();
//!
//!     assert_eq!(toddlers.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod index;
pub mod stream;

// Re-export top-level types for convenience
pub use index::{IndexKey, IndexTable, Indexer, KeyValue, NamedIndexer, Partition};

pub use stream::{
    Analyzer, BatchReport, EngineError, EngineResult, EngineStats, Fault, Gate, GateKind,
    Matching, MatchedKeys, PutReport, QueryHandle, QueryResults, RegistrantKind, Stage,
    StreamEngine,
};

pub use config::{
    generate_default_config, Config, ConfigError, EngineConfig, FaultPolicy, LoggingConfig,
    RegistrationPolicy,
};
