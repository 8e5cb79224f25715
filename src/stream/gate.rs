//! Gating cache
//!
//! When an analyzer is registered its index gate is read once and turned
//! into a [`GateKind`] plus a prebuilt eligibility closure. Per record, the
//! engine only calls the closure; `only_on_index` is never asked again.
//!
//! The filter is always part of the closure. `can_analyze` accepts everything
//! unless the analyzer overrides it, so there is no separate flag to keep in
//! step with it.
//!
//! ```text
//! GateKind        eligible(matched, record)
//! Ungated     →   can_analyze(record)
//! Indexed(k)  →   matched ∋ k && can_analyze(record)
//! ```

use crate::index::IndexKey;
use crate::stream::Analyzer;
use std::collections::HashSet;
use std::sync::Arc;

/// Keys a record was indexed under during one `put`
pub type MatchedKeys = HashSet<IndexKey>;

/// Index gate an analyzer declared at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateKind {
    Ungated,
    Indexed(IndexKey),
}

type Eligibility<T> = Box<dyn Fn(&MatchedKeys, &T) -> bool + Send + Sync>;

/// Precomputed eligibility check for one analyzer
pub struct Gate<T> {
    kind: GateKind,
    eligible: Eligibility<T>,
}

impl<T: 'static> Gate<T> {
    /// Inspect `analyzer` once and build its gate
    pub fn for_analyzer(analyzer: &Arc<dyn Analyzer<T>>) -> Self {
        let kind = match analyzer.only_on_index() {
            Some(key) => GateKind::Indexed(key),
            None => GateKind::Ungated,
        };

        let analyzer = Arc::clone(analyzer);
        let eligible: Eligibility<T> = match kind.clone() {
            GateKind::Ungated => {
                Box::new(move |_: &MatchedKeys, record: &T| analyzer.can_analyze(record))
            }
            GateKind::Indexed(key) => Box::new(move |matched: &MatchedKeys, record: &T| {
                matched.contains(&key) && analyzer.can_analyze(record)
            }),
        };

        Self { kind, eligible }
    }
}

impl<T> Gate<T> {
    pub fn kind(&self) -> &GateKind {
        &self.kind
    }

    /// Should the analyzer run for `record` given the keys it just matched
    pub fn is_eligible(&self, matched: &MatchedKeys, record: &T) -> bool {
        (self.eligible)(matched, record)
    }
}
