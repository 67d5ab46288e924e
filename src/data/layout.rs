//! Built-in layout of the 503B master sheet.
//!
//! The summary row lives at `H2:AD2` on the `MASTER SHEET` tab. Columns that
//! hold labels or unused formulas are part of the range but not the schema.

use batchwatch_types::{
    Cut, Direction, MetricGroup, SchemaError, SchemaField, SchemaRegistry, Status, ThresholdError,
    Thresholds,
};

use super::classify::{KpiRule, COMPLIANCE_SCORE};
use super::compliance::ZoneSpec;

/// Tab holding the summary row.
pub const DEFAULT_SHEET: &str = "MASTER SHEET";

/// Summary row range.
pub const DEFAULT_RANGE: &str = "H2:AD2";

/// Cells in [`DEFAULT_RANGE`].
pub const DEFAULT_WIDTH: usize = 23;

/// Field definitions for the master sheet summary row.
pub fn default_fields() -> Vec<SchemaField> {
    use Direction::{HigherIsBetter as Higher, LowerIsBetter as Lower};
    use MetricGroup::*;

    vec![
        SchemaField::int(Production, "total_batches", 0, 0, Higher),
        SchemaField::int(Production, "completed_batches", 1, 0, Higher),
        SchemaField::int(Production, "pending_batches", 2, 0, Lower),
        SchemaField::float(Production, "average_yield", 3, 0.0, Higher),
        SchemaField::float(Quality, "pass_rate", 6, 0.0, Higher),
        SchemaField::int(Quality, "total_tests", 7, 0, Higher),
        SchemaField::int(Quality, "failed_tests", 8, 0, Lower),
        SchemaField::int(Environmental, "iso5_particles", 9, 0, Lower),
        SchemaField::int(Environmental, "iso7_particles", 10, 0, Lower),
        SchemaField::int(Environmental, "iso8_particles", 11, 0, Lower),
        SchemaField::int(Compliance, "total_deviations", 14, 0, Lower),
        SchemaField::int(Compliance, "critical_deviations", 15, 0, Lower),
        SchemaField::int(Inventory, "total_sku", 20, 0, Higher),
        SchemaField::int(Inventory, "low_stock_items", 21, 0, Lower),
        SchemaField::int(Inventory, "critical_stock_items", 22, 0, Lower),
    ]
}

/// Registry for the master sheet summary row.
pub fn default_registry() -> Result<SchemaRegistry, SchemaError> {
    SchemaRegistry::with_width(default_fields(), DEFAULT_WIDTH)
}

fn ladder(cuts: &[(f64, Status)]) -> Result<Thresholds, ThresholdError> {
    Thresholds::new(cuts.iter().map(|&(at, status)| Cut::new(at, status)).collect())
}

fn rule(name: &str, metric: &str, cuts: &[(f64, Status)]) -> Result<KpiRule, ThresholdError> {
    Ok(KpiRule {
        name: name.to_string(),
        metric: metric.to_string(),
        thresholds: ladder(cuts)?,
    })
}

/// The headline KPIs shown at the top of the dashboard.
pub fn default_kpi_rules() -> Result<Vec<KpiRule>, ThresholdError> {
    use Status::{Good, Warning};

    Ok(vec![
        rule("total_batches", "total_batches", &[(100.0, Warning), (140.0, Good)])?,
        rule("quality_pass_rate", "pass_rate", &[(95.0, Warning), (98.0, Good)])?,
        rule(COMPLIANCE_SCORE, COMPLIANCE_SCORE, &[(90.0, Warning), (95.0, Good)])?,
        rule("active_deviations", "total_deviations", &[(5.0, Good), (10.0, Warning)])?,
        rule("inventory_alerts", "low_stock_items", &[(5.0, Good), (15.0, Warning)])?,
    ])
}

/// Cleanroom zones and their particle limits per cubic metre.
pub fn default_zones() -> Vec<ZoneSpec> {
    vec![
        ZoneSpec::new("ISO 5", "iso5_particles", 3_520.0),
        ZoneSpec::new("ISO 7", "iso7_particles", 352_000.0),
        ZoneSpec::new("ISO 8", "iso8_particles", 3_520_000.0),
    ]
}

/// Status ladder for a zone's compliance percent.
pub fn default_zone_thresholds() -> Result<Thresholds, ThresholdError> {
    ladder(&[(25.0, Status::Warning), (50.0, Status::Good)])
}
