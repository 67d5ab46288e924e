//! The view handed to the presentation layer.
//!
//! Rendering lives elsewhere; it only ever sees a [`Dashboard`] composed from
//! a [`DashboardDataSource`], which in turn is backed by the cache.

use std::sync::Arc;

use batchwatch_types::{ComplianceZone, NormalizedSnapshot, SourceKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CachedEntry, MetricsCache};
use crate::data::trend::{day_labels, TrendSeries};
use crate::data::KpiBoard;

/// Days covered by the dashboard charts.
pub const CHART_DAYS: usize = 7;

/// Read-only access to the current dashboard data.
///
/// Each provided method loads the entry once. Callers combining several
/// values should load [`entry`](Self::entry) themselves and read from it.
pub trait DashboardDataSource: Send + Sync {
    /// The current cache entry.
    fn entry(&self) -> Arc<CachedEntry>;

    /// Synthesized history for one metric, or `None` if it is unknown.
    fn trend(&self, metric: &str, days: usize, seed: Option<u64>) -> Option<TrendSeries> {
        self.entry().expand(metric, days, seed)
    }

    /// A count metric spread over `days`, summing exactly to its value.
    fn count_series(&self, metric: &str, days: usize, seed: Option<u64>) -> Option<Vec<u64>> {
        self.entry().expand_count_series(metric, days, seed)
    }
}

impl DashboardDataSource for MetricsCache {
    fn entry(&self) -> Arc<CachedEntry> {
        self.get()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionTrend {
    pub labels: Vec<String>,
    /// Batches started per day; sums to `total_batches`.
    pub batches: Vec<u64>,
    pub yield_percent: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationAnalysis {
    pub labels: Vec<String>,
    /// Deviations raised per day; sums to `total`.
    pub daily: Vec<u64>,
    pub total: u64,
    pub critical: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryBreakdown {
    pub good: u64,
    pub low_stock: u64,
    pub critical: u64,
}

/// Everything the dashboard pages draw, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub source_kind: SourceKind,
    pub fetched_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub kpis: KpiBoard,
    pub zones: Vec<ComplianceZone>,
    pub production_trend: Option<ProductionTrend>,
    pub deviation_analysis: Option<DeviationAnalysis>,
    pub inventory: Option<InventoryBreakdown>,
    pub snapshot: NormalizedSnapshot,
}

impl Dashboard {
    /// Compose the dashboard from the current entry.
    ///
    /// The entry is loaded once, so every section describes the same
    /// snapshot. Chart sections whose source metrics are not in the schema
    /// are left out. `seed` is forwarded to trend synthesis.
    pub fn compose(source: &dyn DashboardDataSource, seed: Option<u64>) -> Self {
        Self::from_entry(&source.entry(), seed)
    }

    /// Compose the dashboard from one cache entry.
    pub fn from_entry(entry: &CachedEntry, seed: Option<u64>) -> Self {
        let production_trend = match (
            entry.expand_count_series("total_batches", CHART_DAYS, seed),
            entry.expand("average_yield", CHART_DAYS, seed),
        ) {
            (Some(batches), Some(yields)) => Some(ProductionTrend {
                labels: day_labels(CHART_DAYS),
                batches,
                yield_percent: yields.values().collect(),
            }),
            _ => None,
        };

        let deviation_analysis = entry
            .expand_count_series("total_deviations", CHART_DAYS, seed)
            .map(|daily| DeviationAnalysis {
                labels: day_labels(CHART_DAYS),
                total: daily.iter().sum(),
                daily,
                critical: entry.count("critical_deviations").unwrap_or(0),
            });

        let inventory = entry.count("total_sku").map(|total| {
            let low_stock = entry.count("low_stock_items").unwrap_or(0);
            let critical = entry.count("critical_stock_items").unwrap_or(0);
            InventoryBreakdown {
                good: total.saturating_sub(low_stock).saturating_sub(critical),
                low_stock,
                critical,
            }
        });

        Self {
            source_kind: entry.source_kind,
            fetched_at: entry.fetched_at,
            last_error: entry.last_error.clone(),
            kpis: entry.kpis.clone(),
            zones: entry.zones.clone(),
            production_trend,
            deviation_analysis,
            inventory,
            snapshot: entry.snapshot.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use batchwatch_types::{MetricGroup, MetricValue};

    use crate::data::Pipeline;

    fn fallback_entry() -> CachedEntry {
        let pipeline = Pipeline::master_sheet().unwrap();
        let snapshot = pipeline.fallback();
        let (kpis, zones) = pipeline.evaluate(&snapshot, None);
        CachedEntry {
            snapshot,
            kpis,
            zones,
            source_kind: SourceKind::Fallback,
            fetched_at: Utc::now(),
            last_error: None,
            defaulted: Vec::new(),
        }
    }

    fn fallback_cache() -> MetricsCache {
        MetricsCache::new(fallback_entry())
    }

    /// Serves `first` once, then `rest`, as if a refresh landed in between.
    struct SwappingSource {
        loads: AtomicUsize,
        first: Arc<CachedEntry>,
        rest: Arc<CachedEntry>,
    }

    impl DashboardDataSource for SwappingSource {
        fn entry(&self) -> Arc<CachedEntry> {
            match self.loads.fetch_add(1, Ordering::SeqCst) {
                0 => self.first.clone(),
                _ => self.rest.clone(),
            }
        }
    }

    #[test]
    fn test_compose_fallback_dashboard() {
        let dashboard = Dashboard::compose(&fallback_cache(), None);

        assert_eq!(dashboard.source_kind, SourceKind::Fallback);
        assert_eq!(dashboard.kpis.len(), 5);
        assert_eq!(dashboard.zones.len(), 3);

        let production = dashboard.production_trend.unwrap();
        assert_eq!(production.labels.len(), CHART_DAYS);
        assert_eq!(production.batches.iter().sum::<u64>(), 147);
        assert_eq!(production.yield_percent.last(), Some(&96.3));

        let deviations = dashboard.deviation_analysis.unwrap();
        assert_eq!(deviations.total, 8);
        assert_eq!(deviations.daily.iter().sum::<u64>(), 8);
        assert_eq!(deviations.critical, 1);

        assert_eq!(
            dashboard.inventory,
            Some(InventoryBreakdown {
                good: 141,
                low_stock: 12,
                critical: 3,
            })
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let cache = fallback_cache();
        let a = Dashboard::compose(&cache, Some(7));
        let b = Dashboard::compose(&cache, Some(7));
        assert_eq!(a.production_trend, b.production_trend);
        assert_eq!(a.deviation_analysis, b.deviation_analysis);

        // Per-metric reads agree with the composed view
        let source: &dyn DashboardDataSource = &cache;
        let daily = source.count_series("total_deviations", CHART_DAYS, Some(7));
        assert_eq!(daily, a.deviation_analysis.map(|d| d.daily));
        let yields = source.trend("average_yield", CHART_DAYS, Some(7)).unwrap();
        let composed = a.production_trend.map(|p| p.yield_percent);
        assert_eq!(Some(yields.values().collect::<Vec<_>>()), composed);
    }

    #[test]
    fn test_compose_reads_one_entry() {
        let first = fallback_entry();
        let mut rest = first.clone();
        rest.source_kind = SourceKind::Live;
        rest.snapshot = NormalizedSnapshot::builder()
            .group(MetricGroup::Production, |g| {
                g.int("total_batches", 300).float("average_yield", 80.0)
            })
            .group(MetricGroup::Compliance, |g| g.int("total_deviations", 40))
            .build();

        let source = SwappingSource {
            loads: AtomicUsize::new(0),
            first: Arc::new(first),
            rest: Arc::new(rest),
        };
        let dashboard = Dashboard::compose(&source, None);

        assert_eq!(dashboard.source_kind, SourceKind::Fallback);
        let deviations = dashboard.deviation_analysis.unwrap();
        assert_eq!(
            dashboard.snapshot.get("total_deviations"),
            Some(MetricValue::Int(deviations.total as i64))
        );
        assert_eq!(deviations.total, 8);
        assert_eq!(dashboard.production_trend.unwrap().batches.iter().sum::<u64>(), 147);
    }

    #[test]
    fn test_float_counts_are_left_out() {
        let mut entry = fallback_entry();
        entry.snapshot = NormalizedSnapshot::builder()
            .group(MetricGroup::Inventory, |g| g.float("total_sku", 1e30))
            .build();

        let dashboard = Dashboard::from_entry(&entry, None);
        assert!(dashboard.inventory.is_none());
        assert!(dashboard.deviation_analysis.is_none());
    }

    #[test]
    fn test_dashboard_serializes() {
        let json = serde_json::to_value(Dashboard::compose(&fallback_cache(), None)).unwrap();
        assert_eq!(json["source_kind"], "fallback");
        assert_eq!(json["kpis"]["total_batches"]["status"], "good");
        assert_eq!(json["inventory"]["good"], 141);
        assert_eq!(json["snapshot"]["production"]["total_batches"], 147);
    }
}
