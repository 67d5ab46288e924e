//! Deterministic placeholder series for charting a single snapshot value.
//!
//! The upstream sheet only holds today's numbers, but several charts want a
//! week of history. These functions synthesize one: baseline, a linear
//! trend, a weekly sinusoid and bounded noise, anchored so the final point
//! is exactly the snapshot value. Each call seeds its own generator, so the
//! same inputs always give the same series and calls never disturb each
//! other.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Seed used when a reader does not supply one.
pub const DEFAULT_SEED: u64 = 42;

/// Shape of a synthesized series, as fractions of the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendShape {
    /// Linear change per day.
    pub slope: f64,
    /// Peak of the seasonal term.
    pub amplitude: f64,
    /// Seasonal period in days.
    pub period_days: f64,
    /// Noise is drawn uniformly from `[-noise, noise]`.
    pub noise: f64,
}

impl Default for TrendShape {
    fn default() -> Self {
        Self {
            slope: 0.01,
            amplitude: 0.05,
            period_days: 7.0,
            noise: 0.03,
        }
    }
}

/// One labelled point of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub value: f64,
}

/// Fixed-length, restartable sequence of labelled points, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrendSeries {
    points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate from the oldest point. Each call starts over.
    pub fn iter(&self) -> std::slice::Iter<'_, TrendPoint> {
        self.points.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn last(&self) -> Option<&TrendPoint> {
        self.points.last()
    }

    /// Same series with values rounded to whole numbers, for count metrics.
    pub fn rounded(mut self) -> Self {
        for point in &mut self.points {
            point.value = point.value.round();
        }
        self
    }
}

impl<'a> IntoIterator for &'a TrendSeries {
    type Item = &'a TrendPoint;
    type IntoIter = std::slice::Iter<'a, TrendPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Labels for a `days`-long window ending today: `Day -6`, ..., `Today`.
pub fn day_labels(days: usize) -> Vec<String> {
    (0..days)
        .map(|i| match days - 1 - i {
            0 => "Today".to_string(),
            back => format!("Day -{}", back),
        })
        .collect()
}

/// Expand `metric_value` into a `days`-long series with the default shape.
pub fn expand(metric_value: f64, days: usize, seed: u64) -> TrendSeries {
    expand_with(metric_value, days, seed, &TrendShape::default())
}

/// Expand `metric_value` into a `days`-long series.
///
/// Point `i` sits `k = i - (days - 1)` days from today and is
/// `m + |m| * (slope*k + amplitude*sin(2πk/period) + noise)`; today has no
/// noise, so the last point equals `m`. Series of non-negative metrics
/// never dip below zero. A non-finite `m` is treated as zero.
pub fn expand_with(metric_value: f64, days: usize, seed: u64, shape: &TrendShape) -> TrendSeries {
    let m = if metric_value.is_finite() {
        metric_value
    } else {
        0.0
    };
    let scale = m.abs();
    let mut rng = StdRng::seed_from_u64(seed);

    let points = day_labels(days)
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            let k = i as f64 - (days - 1) as f64;
            let noise = if k < 0.0 && shape.noise > 0.0 {
                rng.gen_range(-shape.noise..=shape.noise)
            } else {
                0.0
            };
            let seasonal = if shape.period_days > 0.0 {
                shape.amplitude * (TAU * k / shape.period_days).sin()
            } else {
                0.0
            };

            let mut value = m + scale * (shape.slope * k + seasonal + noise);
            if m >= 0.0 {
                value = value.max(0.0);
            }
            TrendPoint { label, value }
        })
        .collect();

    TrendSeries { points }
}

/// Spread `total` over `days` slots so the slots sum to exactly `total`.
///
/// The first `days - 1` slots each take a random fraction of the total in
/// `[0, 2/days]`, capped by what is left; the last slot takes the exact
/// remainder. Zero days yields an empty series.
pub fn expand_count_series(total: u64, days: usize, seed: u64) -> Vec<u64> {
    if days == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let cap = 2.0 / days as f64;
    let mut remaining = total;
    let mut slots = Vec::with_capacity(days);

    for _ in 0..days - 1 {
        let fraction: f64 = rng.gen_range(0.0..=cap);
        let slot = ((total as f64 * fraction).round() as u64).min(remaining);
        remaining -= slot;
        slots.push(slot);
    }
    slots.push(remaining);

    slots
}

/// Seed for a named metric: the caller's seed (or [`DEFAULT_SEED`]) mixed
/// with a stable FNV-1a hash of the name, so metrics do not share noise.
pub fn metric_seed(name: &str, seed: Option<u64>) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = name.bytes().fold(FNV_OFFSET, |h, b| (h ^ b as u64).wrapping_mul(FNV_PRIME));
    seed.unwrap_or(DEFAULT_SEED) ^ hash
}
