//! Analyzers react to every ingested record they are eligible for.
//!
//! Eligibility is declared up front through two optional capabilities:
//!
//! - **Index-gated**: `only_on_index` returns a key; the analyzer only runs for
//!   records that were indexed under that exact key during their `put`
//! - **Filtered**: `can_analyze` is overridden; the analyzer only runs for
//!   records it accepts
//!
//! The index gate is read once, when the analyzer is registered (see
//! [`Gate`](super::Gate)). The filter is consulted for every candidate record.
//!
//! The same analyzer may be invoked concurrently for different records, so any
//! accumulator it keeps must be updated atomically (a `Mutex` around the whole
//! read-modify-write, or atomics).

use crate::index::IndexKey;
use crate::stream::QueryHandle;

/// Reactive callback invoked once per eligible record
pub trait Analyzer<T>: Send + Sync {
    /// React to `record`; `stream` can query the engine, including this record
    fn analyze(&self, stream: &QueryHandle<'_, T>, record: &T);

    /// Index gate: run only for records indexed under this key
    fn only_on_index(&self) -> Option<IndexKey> {
        None
    }

    /// Per-record filter; accepts everything unless overridden
    fn can_analyze(&self, _record: &T) -> bool {
        true
    }

    /// Name used in logs and fault reports
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T, A> Analyzer<T> for std::sync::Arc<A>
where
    A: Analyzer<T> + ?Sized,
{
    fn analyze(&self, stream: &QueryHandle<'_, T>, record: &T) {
        (**self).analyze(stream, record)
    }

    fn only_on_index(&self) -> Option<IndexKey> {
        (**self).only_on_index()
    }

    fn can_analyze(&self, record: &T) -> bool {
        (**self).can_analyze(record)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
