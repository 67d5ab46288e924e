//! The per-row processing chain, bundled so it can be built once at startup.

use batchwatch_sources::RawRow;
use batchwatch_types::{
    ComplianceZone, NormalizedSnapshot, SchemaError, SchemaRegistry, ThresholdError,
};
use thiserror::Error;

use super::classify::{ClassifierError, KpiBoard, KpiClassifier, KpiRule};
use super::compliance::ZoneMonitor;
use super::fallback::FallbackProvider;
use super::layout;
use super::mapper::{map_row, MappedRow};

/// Errors assembling a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid thresholds: {0}")]
    Thresholds(#[from] ThresholdError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Schema, classifier, zones and fallback for one sheet layout.
#[derive(Debug, Clone)]
pub struct Pipeline {
    schema: SchemaRegistry,
    classifier: KpiClassifier,
    zones: ZoneMonitor,
    fallback: FallbackProvider,
}

impl Pipeline {
    pub fn new(
        schema: SchemaRegistry,
        rules: Vec<KpiRule>,
        zones: ZoneMonitor,
    ) -> Result<Self, PipelineError> {
        let classifier = KpiClassifier::new(rules, &schema)?;
        let fallback = FallbackProvider::for_schema(&schema);
        Ok(Self {
            schema,
            classifier,
            zones,
            fallback,
        })
    }

    /// The built-in master sheet layout with its default KPIs and zones.
    pub fn master_sheet() -> Result<Self, PipelineError> {
        let zones = ZoneMonitor::new(layout::default_zones(), layout::default_zone_thresholds()?);
        Self::new(layout::default_registry()?, layout::default_kpi_rules()?, zones)
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn classifier(&self) -> &KpiClassifier {
        &self.classifier
    }

    pub fn zones(&self) -> &ZoneMonitor {
        &self.zones
    }

    pub fn map(&self, row: &RawRow) -> MappedRow {
        map_row(row, &self.schema)
    }

    /// Zones and KPI board for `snapshot`, with change measured from
    /// `previous`.
    pub fn evaluate(
        &self,
        snapshot: &NormalizedSnapshot,
        previous: Option<&NormalizedSnapshot>,
    ) -> (KpiBoard, Vec<ComplianceZone>) {
        let zones = self.zones.measure(snapshot);
        let previous_zones = previous.map(|p| self.zones.measure(p));
        let previous = previous.zip(previous_zones.as_deref());
        let kpis = self.classifier.classify_snapshot(snapshot, &zones, previous);
        (kpis, zones)
    }

    pub fn fallback(&self) -> NormalizedSnapshot {
        self.fallback.get_fallback()
    }
}
