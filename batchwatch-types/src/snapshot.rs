//! NormalizedSnapshot - one fully typed row of metrics.

use std::collections::BTreeMap;

use crate::{MetricGroup, MetricValue, SchemaVersion};

/// A point-in-time set of metric values, grouped by area.
///
/// Snapshots are value objects: they are rebuilt wholesale from each fetched
/// row and never patched in place. Every field declared by the registry that
/// produced the snapshot has a value, because mapping substitutes defaults.
///
/// # Example
///
/// ```rust
/// use batchwatch_types::{MetricGroup, MetricValue, NormalizedSnapshot};
///
/// let snapshot = NormalizedSnapshot::builder()
///     .group(MetricGroup::Inventory, |g| g.int("total_sku", 156).int("low_stock_items", 12))
///     .build();
///
/// assert_eq!(snapshot.get("low_stock_items"), Some(MetricValue::Int(12)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedSnapshot {
    /// Layout version of the registry this snapshot was mapped with.
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: SchemaVersion,

    #[cfg_attr(feature = "serde", serde(default))]
    pub production: BTreeMap<String, MetricValue>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub quality: BTreeMap<String, MetricValue>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub compliance: BTreeMap<String, MetricValue>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub inventory: BTreeMap<String, MetricValue>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub environmental: BTreeMap<String, MetricValue>,
}

impl NormalizedSnapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Values of one group.
    pub fn group(&self, group: MetricGroup) -> &BTreeMap<String, MetricValue> {
        match group {
            MetricGroup::Production => &self.production,
            MetricGroup::Quality => &self.quality,
            MetricGroup::Compliance => &self.compliance,
            MetricGroup::Inventory => &self.inventory,
            MetricGroup::Environmental => &self.environmental,
        }
    }

    /// Look a field up by name across all groups.
    pub fn get(&self, name: &str) -> Option<MetricValue> {
        MetricGroup::ALL
            .iter()
            .find_map(|g| self.group(*g).get(name).copied())
    }

    /// Look a field up by name, widened to `f64`.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    /// Total number of values across all groups.
    pub fn len(&self) -> usize {
        MetricGroup::ALL.iter().map(|g| self.group(*g).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(group, name, value)` triples in group order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricGroup, &str, MetricValue)> {
        MetricGroup::ALL.into_iter().flat_map(move |g| {
            self.group(g)
                .iter()
                .map(move |(name, value)| (g, name.as_str(), *value))
        })
    }
}

/// Builder for `NormalizedSnapshot`.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: NormalizedSnapshot,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout version (defaults to the current one).
    pub fn version(mut self, version: SchemaVersion) -> Self {
        self.snapshot.version = version;
        self
    }

    /// Add values to a group using a closure.
    pub fn group<F>(mut self, group: MetricGroup, f: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        let values = f(GroupBuilder::default()).values;
        self.group_mut(group).extend(values);
        self
    }

    /// Set a single value.
    pub fn set(mut self, group: MetricGroup, name: impl Into<String>, value: MetricValue) -> Self {
        self.group_mut(group).insert(name.into(), value);
        self
    }

    fn group_mut(&mut self, group: MetricGroup) -> &mut BTreeMap<String, MetricValue> {
        match group {
            MetricGroup::Production => &mut self.snapshot.production,
            MetricGroup::Quality => &mut self.snapshot.quality,
            MetricGroup::Compliance => &mut self.snapshot.compliance,
            MetricGroup::Inventory => &mut self.snapshot.inventory,
            MetricGroup::Environmental => &mut self.snapshot.environmental,
        }
    }

    /// Build the snapshot.
    pub fn build(self) -> NormalizedSnapshot {
        self.snapshot
    }
}

/// Builder for the values of one group.
#[derive(Debug, Default)]
pub struct GroupBuilder {
    values: BTreeMap<String, MetricValue>,
}

impl GroupBuilder {
    pub fn int(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values.insert(name.into(), MetricValue::Int(value));
        self
    }

    pub fn float(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), MetricValue::Float(value));
        self
    }
}
