//! Row processing: from raw cells to a classified snapshot.
//!
//! ## Submodules
//!
//! - [`mapper`]: Fail-open mapping of a [`RawRow`](batchwatch_sources::RawRow) onto the schema
//! - [`classify`]: Direction-aware KPI status classification
//! - [`compliance`]: Cleanroom zones measured against particle limits
//! - [`trend`]: Deterministic placeholder series for charts
//! - [`fallback`]: Constant snapshot served when nothing live is usable
//! - [`layout`]: Built-in master sheet schema, KPI rules and zones
//! - [`pipeline`]: The above bundled for one sheet layout
//!
//! ## Data Flow
//!
//! ```text
//! RawRow (strings)
//!        │
//!        ▼
//! map_row()  ──▶ MappedRow { snapshot, defaulted }
//!        │
//!        ├──▶ ZoneMonitor::measure()        (ComplianceZone list)
//!        │
//!        └──▶ KpiClassifier::classify_snapshot()  (KpiBoard)
//! ```

pub mod classify;
pub mod compliance;
pub mod fallback;
pub mod layout;
pub mod mapper;
pub mod pipeline;
pub mod trend;

pub use classify::{
    change_percent, classify, is_monotonic, ClassifierError, KpiBoard, KpiClassifier, KpiRule,
    COMPLIANCE_SCORE,
};
pub use compliance::{compliance_score, ZoneMonitor, ZoneSpec};
pub use fallback::FallbackProvider;
pub use mapper::{map_row, parse_cell, MappedRow};
pub use pipeline::{Pipeline, PipelineError};
pub use trend::{
    day_labels, expand, expand_count_series, expand_with, metric_seed, TrendPoint, TrendSeries,
    TrendShape, DEFAULT_SEED,
};
