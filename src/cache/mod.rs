//! The cached dashboard state and the task that refreshes it.
//!
//! [`MetricsCache`] holds exactly one [`CachedEntry`] behind an atomic
//! pointer. Readers load the current entry without locking; the refresher
//! builds a complete replacement entry and swaps it in, so a reader sees
//! either the old entry or the new one and never a mix.

pub mod refresher;

use std::sync::Arc;

use arc_swap::ArcSwap;
use batchwatch_types::{ComplianceZone, MetricValue, NormalizedSnapshot, SourceKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::trend::{self, TrendSeries};
use crate::data::KpiBoard;

pub use refresher::{
    Mismatch, RefreshError, RefreshHandle, RefreshOutcome, RefreshPolicy, Refresher, SkipReason,
};

/// Everything a reader needs about the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedEntry {
    pub snapshot: NormalizedSnapshot,
    pub kpis: KpiBoard,
    pub zones: Vec<ComplianceZone>,
    pub source_kind: SourceKind,
    /// When the snapshot was produced. Not updated when a failed refresh
    /// downgrades the entry to cached.
    pub fetched_at: DateTime<Utc>,
    /// Most recent refresh failure, cleared by the next live refresh.
    pub last_error: Option<String>,
    /// Fields that fell back to their default while mapping the snapshot.
    pub defaulted: Vec<String>,
}

impl CachedEntry {
    /// Same entry, marked as served from cache because of `error`.
    ///
    /// A fallback entry stays a fallback entry.
    pub fn degraded(&self, error: impl Into<String>) -> Self {
        let source_kind = match self.source_kind {
            SourceKind::Fallback => SourceKind::Fallback,
            SourceKind::Live | SourceKind::Cached => SourceKind::Cached,
        };
        Self {
            source_kind,
            last_error: Some(error.into()),
            ..self.clone()
        }
    }

    /// The snapshot if it came from the source at some point.
    pub fn live_snapshot(&self) -> Option<&NormalizedSnapshot> {
        match self.source_kind {
            SourceKind::Live | SourceKind::Cached => Some(&self.snapshot),
            SourceKind::Fallback => None,
        }
    }

    /// An integer metric as a count. Negative values are treated as zero.
    ///
    /// `None` if the metric is missing or is not an integer.
    pub fn count(&self, metric: &str) -> Option<u64> {
        match self.snapshot.get(metric)? {
            MetricValue::Int(value) => Some(value.max(0) as u64),
            MetricValue::Float(_) => None,
        }
    }

    /// Synthesized history for one metric of this snapshot.
    ///
    /// The seed is mixed with the metric name, see
    /// [`metric_seed`](trend::metric_seed). Integer metrics produce whole
    /// numbers. `None` if the snapshot has no such metric.
    pub fn expand(&self, metric: &str, days: usize, seed: Option<u64>) -> Option<TrendSeries> {
        let value = self.snapshot.get(metric)?;
        let series = trend::expand(value.as_f64(), days, trend::metric_seed(metric, seed));
        Some(match value {
            MetricValue::Int(_) => series.rounded(),
            MetricValue::Float(_) => series,
        })
    }

    /// Spread an integer metric over `days` so the slots sum to its
    /// [`count`](Self::count).
    pub fn expand_count_series(
        &self,
        metric: &str,
        days: usize,
        seed: Option<u64>,
    ) -> Option<Vec<u64>> {
        let total = self.count(metric)?;
        Some(trend::expand_count_series(
            total,
            days,
            trend::metric_seed(metric, seed),
        ))
    }
}

/// Lock-free holder of the current [`CachedEntry`].
#[derive(Debug)]
pub struct MetricsCache {
    current: ArcSwap<CachedEntry>,
}

impl MetricsCache {
    pub fn new(initial: CachedEntry) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// The current entry. Never blocks.
    pub fn get(&self) -> Arc<CachedEntry> {
        self.current.load_full()
    }

    /// Replace the whole entry.
    pub(crate) fn store(&self, entry: CachedEntry) {
        self.current.store(Arc::new(entry));
    }

    /// Synthesized history for one metric of the current snapshot.
    ///
    /// See [`CachedEntry::expand`].
    pub fn expand(&self, metric: &str, days: usize, seed: Option<u64>) -> Option<TrendSeries> {
        self.get().expand(metric, days, seed)
    }

    /// See [`CachedEntry::expand_count_series`].
    pub fn expand_count_series(
        &self,
        metric: &str,
        days: usize,
        seed: Option<u64>,
    ) -> Option<Vec<u64>> {
        self.get().expand_count_series(metric, days, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchwatch_types::MetricGroup;

    fn entry(kind: SourceKind) -> CachedEntry {
        CachedEntry {
            snapshot: NormalizedSnapshot::builder()
                .group(MetricGroup::Production, |g| {
                    g.int("total_batches", 147).float("average_yield", 96.3)
                })
                .group(MetricGroup::Compliance, |g| g.int("total_deviations", 8))
                .build(),
            kpis: KpiBoard::new(),
            zones: Vec::new(),
            source_kind: kind,
            fetched_at: Utc::now(),
            last_error: None,
            defaulted: Vec::new(),
        }
    }

    #[test]
    fn test_degraded_keeps_snapshot() {
        let live = entry(SourceKind::Live);
        let stale = live.degraded("network error: down");

        assert_eq!(stale.source_kind, SourceKind::Cached);
        assert_eq!(stale.snapshot, live.snapshot);
        assert_eq!(stale.fetched_at, live.fetched_at);
        assert_eq!(stale.last_error.as_deref(), Some("network error: down"));

        let fallback = entry(SourceKind::Fallback).degraded("x");
        assert_eq!(fallback.source_kind, SourceKind::Fallback);
        assert!(fallback.live_snapshot().is_none());
    }

    #[test]
    fn test_store_swaps_whole_entry() {
        let cache = MetricsCache::new(entry(SourceKind::Fallback));
        let before = cache.get();

        cache.store(entry(SourceKind::Live));

        // Earlier readers keep their entry
        assert_eq!(before.source_kind, SourceKind::Fallback);
        assert_eq!(cache.get().source_kind, SourceKind::Live);
    }

    #[test]
    fn test_expand_metric() {
        let cache = MetricsCache::new(entry(SourceKind::Live));

        let batches = cache.expand("total_batches", 7, None).unwrap();
        assert_eq!(batches.len(), 7);
        assert_eq!(batches.last().unwrap().value, 147.0);
        assert!(batches.values().all(|v| v.fract() == 0.0));
        assert_eq!(cache.expand("total_batches", 7, None), Some(batches));

        let yields = cache.expand("average_yield", 7, Some(1)).unwrap();
        assert_eq!(yields.last().unwrap().value, 96.3);

        assert!(cache.expand("missing", 7, None).is_none());
    }

    #[test]
    fn test_expand_count_series() {
        let cache = MetricsCache::new(entry(SourceKind::Live));

        let weekly = cache.expand_count_series("total_deviations", 7, None).unwrap();
        assert_eq!(weekly.iter().sum::<u64>(), 8);
        assert!(cache.expand_count_series("average_yield", 7, None).is_none());
    }

    #[test]
    fn test_count_reads_integers_only() {
        let mut entry = entry(SourceKind::Live);
        assert_eq!(entry.count("total_deviations"), Some(8));
        assert_eq!(entry.count("average_yield"), None);
        assert_eq!(entry.count("missing"), None);

        entry.snapshot = NormalizedSnapshot::builder()
            .group(MetricGroup::Compliance, |g| g.int("total_deviations", -3))
            .build();
        assert_eq!(entry.count("total_deviations"), Some(0));
        assert_eq!(
            entry.expand_count_series("total_deviations", 7, None),
            Some(vec![0; 7])
        );
    }
}
