//! Fixed dataset served when no live row is usable.

use batchwatch_types::{MetricValue, NormalizedSnapshot, SchemaRegistry};

/// Representative values for the master sheet fields, used when the sheet
/// cannot be read.
const KNOWN_VALUES: &[(&str, f64)] = &[
    ("total_batches", 147.0),
    ("completed_batches", 132.0),
    ("pending_batches", 15.0),
    ("average_yield", 96.3),
    ("pass_rate", 98.2),
    ("total_tests", 1247.0),
    ("failed_tests", 23.0),
    ("iso5_particles", 145.0),
    ("iso7_particles", 2840.0),
    ("iso8_particles", 89500.0),
    ("total_deviations", 8.0),
    ("critical_deviations", 1.0),
    ("total_sku", 156.0),
    ("low_stock_items", 12.0),
    ("critical_stock_items", 3.0),
];

/// Supplies a constant snapshot that is complete for one registry.
///
/// Fields with a known representative value get it (coerced to the field's
/// type); any other field gets its schema default, so the fallback is
/// complete even for an overridden registry.
#[derive(Debug, Clone)]
pub struct FallbackProvider {
    snapshot: NormalizedSnapshot,
}

impl FallbackProvider {
    /// Fallback for `schema` using the built-in representative values.
    pub fn for_schema(schema: &SchemaRegistry) -> Self {
        let mut builder = NormalizedSnapshot::builder().version(schema.version());
        for field in schema.iter() {
            let value = KNOWN_VALUES
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|&(_, v)| MetricValue::Float(v).coerce(field.kind))
                .unwrap_or(field.default);
            builder = builder.set(field.group, field.name.clone(), value);
        }
        Self {
            snapshot: builder.build(),
        }
    }

    /// Fallback serving a caller-supplied snapshot.
    pub fn from_snapshot(snapshot: NormalizedSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn get_fallback(&self) -> NormalizedSnapshot {
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::layout::default_registry;
    use batchwatch_types::{Direction, MetricGroup, SchemaField};

    #[test]
    fn test_fallback_is_complete_for_default_schema() {
        let schema = default_registry().unwrap();
        let snapshot = FallbackProvider::for_schema(&schema).get_fallback();

        assert_eq!(snapshot.len(), schema.len());
        for field in schema.iter() {
            let value = snapshot.get(&field.name).unwrap();
            assert_eq!(value.field_type(), field.kind, "{}", field.name);
        }
        assert_eq!(snapshot.get("total_batches"), Some(MetricValue::Int(147)));
        assert_eq!(snapshot.get("average_yield"), Some(MetricValue::Float(96.3)));
        assert_eq!(snapshot.get("total_deviations"), Some(MetricValue::Int(8)));
    }

    #[test]
    fn test_unknown_fields_use_defaults() {
        use Direction::{HigherIsBetter as Higher, LowerIsBetter as Lower};

        let schema = SchemaRegistry::new(vec![
            SchemaField::int(MetricGroup::Production, "total_batches", 0, 0, Higher),
            SchemaField::float(MetricGroup::Quality, "rework_rate", 1, 1.5, Lower),
        ])
        .unwrap();

        let snapshot = FallbackProvider::for_schema(&schema).get_fallback();
        assert_eq!(snapshot.get("total_batches"), Some(MetricValue::Int(147)));
        assert_eq!(snapshot.get("rework_rate"), Some(MetricValue::Float(1.5)));
    }

    #[test]
    fn test_fallback_is_constant() {
        let provider = FallbackProvider::for_schema(&default_registry().unwrap());
        assert_eq!(provider.get_fallback(), provider.get_fallback());
    }
}
