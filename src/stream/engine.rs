//! Tributary Stream Engine
//!
//! The stream engine orchestrates all components:
//! - Write path: record → indexer fan-out → IndexTable → analyzer fan-out
//! - Read path: key → IndexTable partition snapshot → optional predicate
//!
//! Both fan-outs run on an engine-owned rayon pool. `put` is synchronous:
//! it returns once every indexer and every eligible analyzer has finished.
//! Between the two phases there is a hard barrier, so an analyzer always
//! sees the complete matched-key set and can query its own record back.

use crate::config::{EngineConfig, FaultPolicy, RegistrationPolicy};
use crate::index::{IndexKey, IndexTable, Indexer};
use crate::stream::error::{EngineError, EngineResult, Fault, RegistrantKind, Stage};
use crate::stream::gate::{Gate, MatchedKeys};
use crate::stream::query::{Matching, QueryHandle, QueryResults};
use crate::stream::Analyzer;
use parking_lot::RwLock;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// An analyzer together with the gate computed when it was registered
struct RegisteredAnalyzer<T> {
    analyzer: Arc<dyn Analyzer<T>>,
    gate: Gate<T>,
}

struct Registry<T> {
    indexers: Vec<Arc<dyn Indexer<T>>>,
    analyzers: Vec<RegisteredAnalyzer<T>>,
}

#[derive(Default)]
struct Counters {
    records: AtomicU64,
    analyzer_runs: AtomicU64,
    faults: AtomicU64,
}

/// Outcome of a single `put`
#[derive(Debug, Clone, Default)]
pub struct PutReport {
    /// Keys the record was indexed under
    pub matched_keys: MatchedKeys,
    /// Analyzers that passed their gate and ran
    pub analyzers_run: usize,
    /// Panics caught under `FaultPolicy::Isolate`
    pub faults: Vec<Fault>,
}

impl PutReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Outcome of `put_all`
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: usize,
    pub analyzers_run: usize,
    pub faults: Vec<Fault>,
}

impl BatchReport {
    fn absorb(&mut self, report: PutReport) {
        self.records += 1;
        self.analyzers_run += report.analyzers_run;
        self.faults.extend(report.faults);
    }

    /// Combine reports from batches put by different producers
    pub fn merge(&mut self, other: BatchReport) {
        self.records += other.records;
        self.analyzers_run += other.analyzers_run;
        self.faults.extend(other.faults);
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub records: u64,
    pub partitions: usize,
    pub entries: usize,
    pub indexers: usize,
    pub analyzers: usize,
    pub analyzer_runs: u64,
    pub faults: u64,
}

impl std::fmt::Display for EngineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {}, Partitions: {}, Entries: {}, Indexers: {}, Analyzers: {}, Runs: {}, Faults: {}",
            self.records,
            self.partitions,
            self.entries,
            self.indexers,
            self.analyzers,
            self.analyzer_runs,
            self.faults
        )
    }
}

/// In-memory stream of records with secondary indexes and analyzers
pub struct StreamEngine<T> {
    config: EngineConfig,
    table: IndexTable<T>,
    registry: RwLock<Registry<T>>,
    /// Set when the first `put` begins
    started: AtomicBool,
    pool: ThreadPool,
    counters: Counters,
}

impl<T: Send + Sync + 'static> StreamEngine<T> {
    /// Create an engine with the default configuration
    pub fn new() -> EngineResult<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("tributary-worker-{}", i))
            .build()?;

        tracing::info!(
            threads = pool.current_num_threads(),
            fault_policy = ?config.fault_policy,
            late_registration = ?config.late_registration,
            "Stream engine started"
        );

        Ok(Self {
            config,
            table: IndexTable::new(),
            registry: RwLock::new(Registry {
                indexers: Vec::new(),
                analyzers: Vec::new(),
            }),
            started: AtomicBool::new(false),
            pool,
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Registration ====================

    /// Register an indexer; it applies to every record put afterwards
    pub fn add_indexer<I>(&self, indexer: I) -> EngineResult<()>
    where
        I: Indexer<T> + 'static,
    {
        let indexer: Arc<dyn Indexer<T>> = Arc::new(indexer);
        let mut registry = self.registry.write();
        self.check_open(RegistrantKind::Indexer, indexer.name())?;

        tracing::info!(indexer = indexer.name(), "Indexer registered");
        registry.indexers.push(indexer);
        Ok(())
    }

    /// Register an analyzer, computing its gate once
    ///
    /// Pass an `Arc<A>` to keep a handle on the analyzer's state.
    pub fn add_analyzer<A>(&self, analyzer: A) -> EngineResult<()>
    where
        A: Analyzer<T> + 'static,
    {
        let analyzer: Arc<dyn Analyzer<T>> = Arc::new(analyzer);
        let mut registry = self.registry.write();
        self.check_open(RegistrantKind::Analyzer, analyzer.name())?;

        let gate = Gate::for_analyzer(&analyzer);
        tracing::info!(analyzer = analyzer.name(), gate = ?gate.kind(), "Analyzer registered");
        registry.analyzers.push(RegisteredAnalyzer { analyzer, gate });
        Ok(())
    }

    /// Must be called with the registry write lock held
    fn check_open(&self, kind: RegistrantKind, name: &str) -> EngineResult<()> {
        if self.config.late_registration == RegistrationPolicy::Reject
            && self.started.load(Ordering::Acquire)
        {
            tracing::warn!(
                %kind,
                registrant = name,
                "Rejected registration after ingestion started"
            );
            return Err(EngineError::RegistrationClosed {
                kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    // ==================== Write Path ====================

    /// Index `record` and run every eligible analyzer on it
    ///
    /// The registrant set is fixed for the whole call: late registrations
    /// (when allowed) wait until in-flight puts finish.
    pub fn put(&self, record: T) -> PutReport {
        self.started.store(true, Ordering::Release);
        let record = Arc::new(record);
        let registry = self.registry.read();
        let indexers = &registry.indexers;
        let analyzers = &registry.analyzers;

        let report = self.pool.install(|| {
            let (matched_keys, mut faults) = self.index_record(indexers, &record);
            let (analyzers_run, analyze_faults) =
                self.analyze_record(analyzers, &matched_keys, &record);
            faults.extend(analyze_faults);

            PutReport {
                matched_keys,
                analyzers_run,
                faults,
            }
        });

        self.counters.records.fetch_add(1, Ordering::Relaxed);
        self.counters
            .analyzer_runs
            .fetch_add(report.analyzers_run as u64, Ordering::Relaxed);

        tracing::debug!(
            matched = report.matched_keys.len(),
            analyzers_run = report.analyzers_run,
            faults = report.faults.len(),
            "Record ingested"
        );

        report
    }

    /// Put each record in order; no batching, no reordering
    pub fn put_all<I>(&self, records: I) -> BatchReport
    where
        I: IntoIterator<Item = T>,
    {
        let mut batch = BatchReport::default();
        for record in records {
            batch.absorb(self.put(record));
        }
        batch
    }

    /// Phase 1: every indexer derives a key and inserts into the table
    fn index_record(
        &self,
        indexers: &[Arc<dyn Indexer<T>>],
        record: &Arc<T>,
    ) -> (MatchedKeys, Vec<Fault>) {
        let outcomes: Vec<Result<Option<IndexKey>, Fault>> = indexers
            .par_iter()
            .map(|indexer| {
                let key = self.guard(indexer.name(), Stage::DeriveKey, || {
                    indexer.derive_key(record)
                })?;
                if let Some(key) = &key {
                    self.table.insert(key.clone(), Arc::clone(record));
                }
                Ok(key)
            })
            .collect();

        let mut matched = MatchedKeys::new();
        let mut faults = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(Some(key)) => {
                    matched.insert(key);
                }
                Ok(None) => {}
                Err(fault) => faults.push(fault),
            }
        }
        (matched, faults)
    }

    /// Phase 2: every analyzer whose gate accepts the record runs
    fn analyze_record(
        &self,
        analyzers: &[RegisteredAnalyzer<T>],
        matched: &MatchedKeys,
        record: &Arc<T>,
    ) -> (usize, Vec<Fault>) {
        let handle = QueryHandle::new(&self.table);

        let outcomes: Vec<Result<bool, Fault>> = analyzers
            .par_iter()
            .map(|entry| {
                let name = entry.analyzer.name();
                if !self.guard(name, Stage::Gate, || entry.gate.is_eligible(matched, record))? {
                    return Ok(false);
                }
                self.guard(name, Stage::Analyze, || entry.analyzer.analyze(&handle, record))?;
                Ok(true)
            })
            .collect();

        let mut ran = 0;
        let mut faults = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(true) => ran += 1,
                Ok(false) => {}
                Err(fault) => faults.push(fault),
            }
        }
        (ran, faults)
    }

    /// Run one registrant callback under the configured fault policy
    fn guard<R>(
        &self,
        registrant: &str,
        stage: Stage,
        f: impl FnOnce() -> R,
    ) -> Result<R, Fault> {
        match self.config.fault_policy {
            FaultPolicy::Propagate => Ok(f()),
            FaultPolicy::Isolate => panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
                let fault = Fault::from_panic(registrant, stage, payload);
                self.counters.faults.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    registrant = %fault.registrant,
                    stage = %fault.stage,
                    "Registrant panicked: {}",
                    fault.message
                );
                fault
            }),
        }
    }

    // ==================== Read Path ====================

    /// Read-only view, the same one analyzers receive
    pub fn handle(&self) -> QueryHandle<'_, T> {
        QueryHandle::new(&self.table)
    }

    /// All records indexed under `key`; empty if never produced
    pub fn query(&self, key: &IndexKey) -> QueryResults<T> {
        self.handle().query(key)
    }

    /// Records under `key` accepted by `predicate`, filtered lazily
    pub fn query_where<P>(&self, key: &IndexKey, predicate: P) -> Matching<T, P>
    where
        P: FnMut(&T) -> bool,
    {
        self.handle().query_where(key, predicate)
    }

    // ==================== Stats ====================

    pub fn stats(&self) -> EngineStats {
        let registry = self.registry.read();
        EngineStats {
            records: self.counters.records.load(Ordering::Relaxed),
            partitions: self.table.partition_count(),
            entries: self.table.entry_count(),
            indexers: registry.indexers.len(),
            analyzers: registry.analyzers.len(),
            analyzer_runs: self.counters.analyzer_runs.load(Ordering::Relaxed),
            faults: self.counters.faults.load(Ordering::Relaxed),
        }
    }
}
