//! # batchwatch
//!
//! Stale-tolerant ingestion core for 503B compounding dashboards.
//!
//! The upstream master sheet publishes one summary row of production,
//! quality, environmental, compliance and inventory figures. This crate
//! fetches that row on a timer, maps it onto a typed snapshot, classifies
//! the headline KPIs, and keeps the result in a cache that dashboard pages
//! read without ever waiting on the network.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Refresher                           │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌────────┐ │
//! │  │ source  │───▶│  mapper  │───▶│ classify │───▶│ cache  │ │
//! │  │ (fetch) │    │ (schema) │    │  (KPIs)  │    │ (swap) │ │
//! │  └─────────┘    └──────────┘    └──────────┘    └───┬────┘ │
//! │       ▲                                             │      │
//! │  Sheets | File | Channel                 fallback ──┘      │
//! └─────────────────────────────────────────────────────┼──────┘
//!                                                       ▼
//!                                    MetricsCache::get() / expand()
//! ```
//!
//! - **[`data`]**: Schema mapping, KPI classification, compliance zones,
//!   trend synthesis and the fallback dataset
//! - **[`cache`]**: [`MetricsCache`] and the [`Refresher`] that keeps it current
//! - **[`dashboard`]**: The composed, serializable view for the presentation layer
//! - **[`settings`]**: Layered configuration
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Refresh from the Sheets API every five minutes
//! GOOGLE_SHEETS_API_KEY=... batchwatch --config batchwatch.toml
//!
//! # One refresh from an exported row, written out as JSON
//! batchwatch --file master_row.tsv --once --export dashboard.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use batchwatch::{Dashboard, Pipeline, RefreshOutcome, RefreshPolicy, Refresher};
//! use batchwatch_sources::{ChannelSource, SourceRef};
//!
//! # tokio_test::block_on(async {
//! let (tx, client) = ChannelSource::create("example");
//! let source = SourceRef::new("sheet", None, "A1:W1".parse().unwrap());
//! let refresher = Refresher::new(
//!     Arc::new(client),
//!     source,
//!     Pipeline::master_sheet().unwrap(),
//!     RefreshPolicy::default(),
//! );
//!
//! let mut row = vec![String::new(); 23];
//! row[0] = "147".into();
//! row[1] = "132".into();
//! row[2] = "15".into();
//! row[3] = "96.3".into();
//! row[6] = "98.2".into();
//! row[7] = "1,247".into();
//! row[8] = "23".into();
//! row[14] = "8".into();
//! tx.send(Some(Ok(row))).unwrap();
//!
//! assert_eq!(refresher.refresh_now().await, RefreshOutcome::Live);
//!
//! let cache = refresher.cache();
//! let entry = cache.get();
//! assert_eq!(entry.snapshot.value("total_tests"), Some(1247.0));
//!
//! let week = cache.expand("total_batches", 7, Some(42)).unwrap();
//! assert_eq!(week.len(), 7);
//!
//! let dashboard = Dashboard::compose(cache.as_ref(), None);
//! assert_eq!(dashboard.deviation_analysis.unwrap().total, 8);
//! # });
//! ```

pub mod cache;
pub mod dashboard;
pub mod data;
pub mod settings;

// Re-export main types for convenience
pub use cache::{
    CachedEntry, MetricsCache, RefreshError, RefreshHandle, RefreshOutcome, RefreshPolicy,
    Refresher,
};
pub use dashboard::{Dashboard, DashboardDataSource};
pub use data::{FallbackProvider, KpiClassifier, MappedRow, Pipeline, TrendSeries};
pub use settings::Settings;
