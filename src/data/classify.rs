//! KPI classification.
//!
//! A KPI's status comes from three inputs: its value, a threshold ladder,
//! and the direction of the metric it is read from. The direction always
//! comes from the schema field; rules only name the field.

use std::collections::BTreeMap;

use batchwatch_types::{
    ComplianceZone, Direction, Kpi, NormalizedSnapshot, SchemaRegistry, Status, Thresholds,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::compliance::compliance_score;

/// Derived metric: mean compliance percent over all zones.
pub const COMPLIANCE_SCORE: &str = "compliance_score";

/// Compliance headroom grows as particle counts fall, so more is better.
pub const COMPLIANCE_DIRECTION: Direction = Direction::HigherIsBetter;

/// KPIs keyed by name.
pub type KpiBoard = BTreeMap<String, Kpi>;

/// Classify `value` against an ascending ladder of cut points.
///
/// For [`Direction::HigherIsBetter`] the value takes the status of the
/// highest cut it reaches; for [`Direction::LowerIsBetter`] the status of the
/// lowest cut it stays within. Values outside every cut are critical, as are
/// NaN values.
pub fn classify(value: f64, thresholds: &Thresholds, direction: Direction) -> Status {
    if value.is_nan() {
        return Status::Critical;
    }
    let cuts = thresholds.cuts();
    let found = match direction {
        Direction::HigherIsBetter => cuts.iter().rev().find(|c| value >= c.at),
        Direction::LowerIsBetter => cuts.iter().find(|c| value <= c.at),
    };
    found.map_or(Status::Critical, |c| c.status)
}

/// Whether the status tags along the ladder move the right way for
/// `direction`, which is what makes [`classify`] monotonic.
///
/// Higher-is-better ladders must get no more severe as cuts rise;
/// lower-is-better ladders must get no less severe.
pub fn is_monotonic(thresholds: &Thresholds, direction: Direction) -> bool {
    thresholds.cuts().windows(2).all(|pair| match direction {
        Direction::HigherIsBetter => pair[1].status <= pair[0].status,
        Direction::LowerIsBetter => pair[1].status >= pair[0].status,
    })
}

/// Percent change from `previous` to `current`; 0 without a usable baseline.
pub fn change_percent(current: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if prev != 0.0 && prev.is_finite() && current.is_finite() => {
            (current - prev) / prev.abs() * 100.0
        }
        _ => 0.0,
    }
}

/// One KPI definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRule {
    pub name: String,
    /// Schema field the value is read from, or [`COMPLIANCE_SCORE`].
    pub metric: String,
    pub thresholds: Thresholds,
}

/// Errors building a [`KpiClassifier`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("KPI {kpi} reads unknown metric {metric}")]
    UnknownMetric { kpi: String, metric: String },

    #[error("KPI {kpi} thresholds are not ordered for a {direction:?} metric")]
    NonMonotonic { kpi: String, direction: Direction },
}

#[derive(Debug, Clone)]
struct ResolvedRule {
    rule: KpiRule,
    direction: Direction,
}

/// Classifies a snapshot into a [`KpiBoard`].
#[derive(Debug, Clone)]
pub struct KpiClassifier {
    rules: Vec<ResolvedRule>,
}

impl KpiClassifier {
    /// Resolve every rule's direction from `schema` and validate its ladder.
    pub fn new(rules: Vec<KpiRule>, schema: &SchemaRegistry) -> Result<Self, ClassifierError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let direction = if rule.metric == COMPLIANCE_SCORE {
                    COMPLIANCE_DIRECTION
                } else {
                    schema
                        .field(&rule.metric)
                        .ok_or_else(|| ClassifierError::UnknownMetric {
                            kpi: rule.name.clone(),
                            metric: rule.metric.clone(),
                        })?
                        .direction
                };
                if !is_monotonic(&rule.thresholds, direction) {
                    return Err(ClassifierError::NonMonotonic {
                        kpi: rule.name,
                        direction,
                    });
                }
                Ok(ResolvedRule { rule, direction })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Direction a KPI was resolved to.
    pub fn direction(&self, kpi: &str) -> Option<Direction> {
        self.rules
            .iter()
            .find(|r| r.rule.name == kpi)
            .map(|r| r.direction)
    }

    /// Build the KPI board for `snapshot` and its measured `zones`.
    ///
    /// `previous` is the last live snapshot with its zones, used for change
    /// percentages. The compliance score KPI is left out when no zones are
    /// measured.
    pub fn classify_snapshot(
        &self,
        snapshot: &NormalizedSnapshot,
        zones: &[ComplianceZone],
        previous: Option<(&NormalizedSnapshot, &[ComplianceZone])>,
    ) -> KpiBoard {
        let mut board = KpiBoard::new();

        for ResolvedRule { rule, direction } in &self.rules {
            let (value, prior) = if rule.metric == COMPLIANCE_SCORE {
                let Some(score) = compliance_score(zones) else {
                    continue;
                };
                (score, previous.and_then(|(_, zones)| compliance_score(zones)))
            } else {
                let Some(value) = snapshot.value(&rule.metric) else {
                    continue;
                };
                (value, previous.and_then(|(p, _)| p.value(&rule.metric)))
            };

            board.insert(
                rule.name.clone(),
                Kpi {
                    value,
                    change_percent: change_percent(value, prior),
                    status: classify(value, &rule.thresholds, *direction),
                },
            );
        }

        board
    }
}
