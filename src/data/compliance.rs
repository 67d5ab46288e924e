//! Cleanroom compliance zones.

use batchwatch_types::{compliance_percent, ComplianceZone, NormalizedSnapshot, Thresholds};
use serde::{Deserialize, Serialize};

use super::classify::{classify, COMPLIANCE_DIRECTION};

/// Where a zone's particle count comes from and what it is compared to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    /// Snapshot field holding the particle count.
    pub metric: String,
    /// Particles per cubic metre allowed for the zone's classification.
    pub limit: f64,
}

impl ZoneSpec {
    pub fn new(name: impl Into<String>, metric: impl Into<String>, limit: f64) -> Self {
        Self {
            name: name.into(),
            metric: metric.into(),
            limit,
        }
    }
}

/// Measures configured zones against a snapshot.
#[derive(Debug, Clone)]
pub struct ZoneMonitor {
    zones: Vec<ZoneSpec>,
    thresholds: Thresholds,
}

impl ZoneMonitor {
    /// `thresholds` classify compliance percent (higher is better).
    pub fn new(zones: Vec<ZoneSpec>, thresholds: Thresholds) -> Self {
        Self { zones, thresholds }
    }

    pub fn zones(&self) -> &[ZoneSpec] {
        &self.zones
    }

    /// Zones whose metric is present in `snapshot`, in configured order.
    pub fn measure(&self, snapshot: &NormalizedSnapshot) -> Vec<ComplianceZone> {
        self.zones
            .iter()
            .filter_map(|spec| {
                let count = snapshot.value(&spec.metric)?;
                let percent = compliance_percent(count, spec.limit);
                Some(ComplianceZone {
                    zone_name: spec.name.clone(),
                    particle_count: count,
                    particle_limit: spec.limit,
                    compliance_percent: percent,
                    status: classify(percent, &self.thresholds, COMPLIANCE_DIRECTION),
                })
            })
            .collect()
    }
}

/// Mean compliance percent, or `None` without zones.
pub fn compliance_score(zones: &[ComplianceZone]) -> Option<f64> {
    if zones.is_empty() {
        return None;
    }
    Some(zones.iter().map(|z| z.compliance_percent).sum::<f64>() / zones.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchwatch_types::{Cut, MetricGroup, Status};

    fn monitor() -> ZoneMonitor {
        ZoneMonitor::new(
            vec![
                ZoneSpec::new("ISO 5", "iso5_particles", 3520.0),
                ZoneSpec::new("ISO 7", "iso7_particles", 352_000.0),
                ZoneSpec::new("ISO 8", "iso8_particles", 3_520_000.0),
            ],
            Thresholds::new(vec![Cut::new(25.0, Status::Warning), Cut::new(50.0, Status::Good)])
                .unwrap(),
        )
    }

    #[test]
    fn test_measure_zones() {
        let snapshot = NormalizedSnapshot::builder()
            .group(MetricGroup::Environmental, |g| {
                g.int("iso5_particles", 3000).int("iso7_particles", 0)
            })
            .build();

        let zones = monitor().measure(&snapshot);
        assert_eq!(zones.len(), 2, "ISO 8 has no reading");

        assert_eq!(zones[0].zone_name, "ISO 5");
        assert!(zones[0].compliance_percent < 25.0);
        assert_eq!(zones[0].status, Status::Critical);

        assert_eq!(zones[1].compliance_percent, 100.0);
        assert_eq!(zones[1].status, Status::Good);
    }

    #[test]
    fn test_over_limit_clamps_to_zero() {
        let snapshot = NormalizedSnapshot::builder()
            .group(MetricGroup::Environmental, |g| g.int("iso5_particles", 7040))
            .build();
        let zones = monitor().measure(&snapshot);
        assert_eq!(zones[0].compliance_percent, 0.0);
    }

    #[test]
    fn test_compliance_score() {
        assert_eq!(compliance_score(&[]), None);

        let snapshot = NormalizedSnapshot::builder()
            .group(MetricGroup::Environmental, |g| {
                g.int("iso5_particles", 1760).int("iso7_particles", 0)
            })
            .build();
        let zones = monitor().measure(&snapshot);
        assert_eq!(compliance_score(&zones), Some(75.0));
    }
}
