//! KPI, threshold and compliance zone types.

use std::fmt;

use thiserror::Error;

/// Status of a KPI or compliance zone.
///
/// Ordered by severity: `Good < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    Good,
    Warning,
    Critical,
}

impl Status {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Good => "OK",
            Status::Warning => "WARN",
            Status::Critical => "CRIT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Good => "good",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cut point of a threshold ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cut {
    pub at: f64,
    pub status: Status,
}

impl Cut {
    pub const fn new(at: f64, status: Status) -> Self {
        Self { at, status }
    }
}

/// Errors building [`Thresholds`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("threshold ladder has no cut points")]
    Empty,

    #[error("cut point {0} is not a finite number")]
    NotFinite(f64),

    #[error("cut points must be strictly ascending ({previous} then {next})")]
    NotAscending { previous: f64, next: f64 },
}

/// Ascending list of cut points, each tagged with a status.
///
/// How a value is compared against the ladder depends on the metric's
/// [`Direction`](crate::Direction):
///
/// - higher is better: the value takes the status of the highest cut it
///   reaches (`value >= at`); below every cut it is critical
/// - lower is better: the value takes the status of the lowest cut it stays
///   within (`value <= at`); above every cut it is critical
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Cut>", into = "Vec<Cut>"))]
pub struct Thresholds {
    cuts: Vec<Cut>,
}

impl Thresholds {
    pub fn new(cuts: Vec<Cut>) -> Result<Self, ThresholdError> {
        if cuts.is_empty() {
            return Err(ThresholdError::Empty);
        }
        if let Some(bad) = cuts.iter().find(|c| !c.at.is_finite()) {
            return Err(ThresholdError::NotFinite(bad.at));
        }
        for pair in cuts.windows(2) {
            if pair[1].at <= pair[0].at {
                return Err(ThresholdError::NotAscending {
                    previous: pair[0].at,
                    next: pair[1].at,
                });
            }
        }
        Ok(Self { cuts })
    }

    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }
}

impl TryFrom<Vec<Cut>> for Thresholds {
    type Error = ThresholdError;

    fn try_from(cuts: Vec<Cut>) -> Result<Self, Self::Error> {
        Self::new(cuts)
    }
}

impl From<Thresholds> for Vec<Cut> {
    fn from(t: Thresholds) -> Self {
        t.cuts
    }
}

/// A named metric with its derived status.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kpi {
    pub value: f64,

    /// Change relative to the previous live snapshot, in percent.
    pub change_percent: f64,

    pub status: Status,
}

/// An environmental monitoring area compared against its particle limit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComplianceZone {
    pub zone_name: String,
    pub particle_count: f64,
    pub particle_limit: f64,

    /// Headroom below the limit, always within `[0, 100]`.
    pub compliance_percent: f64,

    pub status: Status,
}

/// `clamp(100 - count / limit * 100, 0, 100)`.
///
/// A non-positive or non-finite limit leaves no headroom and yields 0.
pub fn compliance_percent(particle_count: f64, particle_limit: f64) -> f64 {
    if !particle_limit.is_finite() || particle_limit <= 0.0 {
        return 0.0;
    }
    let percent = 100.0 - particle_count / particle_limit * 100.0;
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

/// Where the snapshot in a cache entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SourceKind {
    /// Fetched and mapped on the most recent refresh.
    Live,
    /// An earlier live snapshot kept because the latest refresh failed.
    Cached,
    /// The built-in fallback dataset.
    Fallback,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Live => "live",
            SourceKind::Cached => "cached",
            SourceKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_severity_order() {
        assert!(Status::Good < Status::Warning);
        assert!(Status::Warning < Status::Critical);
        assert_eq!(Status::Critical.symbol(), "CRIT");
    }

    #[test]
    fn test_thresholds_validation() {
        assert_eq!(Thresholds::new(vec![]).unwrap_err(), ThresholdError::Empty);
        assert_eq!(
            Thresholds::new(vec![Cut::new(5.0, Status::Good), Cut::new(5.0, Status::Warning)])
                .unwrap_err(),
            ThresholdError::NotAscending {
                previous: 5.0,
                next: 5.0
            }
        );
        assert!(matches!(
            Thresholds::new(vec![Cut::new(f64::NAN, Status::Good)]),
            Err(ThresholdError::NotFinite(_))
        ));
        assert!(Thresholds::new(vec![Cut::new(1.0, Status::Good), Cut::new(2.0, Status::Warning)])
            .is_ok());
    }

    #[test]
    fn test_compliance_percent_bounds() {
        let limit = 3520.0;
        assert_eq!(compliance_percent(0.0, limit), 100.0);
        assert_eq!(compliance_percent(limit, limit), 0.0);
        assert_eq!(compliance_percent(2.0 * limit, limit), 0.0);
        assert!((compliance_percent(880.0, limit) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_compliance_percent_degenerate_limit() {
        assert_eq!(compliance_percent(10.0, 0.0), 0.0);
        assert_eq!(compliance_percent(10.0, -5.0), 0.0);
        assert_eq!(compliance_percent(10.0, f64::NAN), 0.0);
        assert_eq!(compliance_percent(f64::NAN, 10.0), 0.0);
        assert_eq!(compliance_percent(-10.0, 10.0), 100.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_thresholds_deserialize_validates() {
        let json = r#"[{"at": 95.0, "status": "warning"}, {"at": 98.0, "status": "good"}]"#;
        let ok: Thresholds = serde_json::from_str(json).unwrap();
        assert_eq!(ok.cuts().len(), 2);

        let bad = serde_json::from_str::<Thresholds>(
            r#"[{"at": 98.0, "status": "good"}, {"at": 95.0, "status": "warning"}]"#,
        );
        assert!(bad.is_err());
    }
}
