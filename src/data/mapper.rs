//! Row mapping - turns a raw row into a typed snapshot.
//!
//! Mapping is fail-open per field: a cell that is missing or does not parse
//! as its declared type takes the schema default, and the mapping carries on.
//! The number of defaulted fields is reported alongside the snapshot so the
//! caller can decide whether the row as a whole is trustworthy.

use batchwatch_sources::RawRow;
use batchwatch_types::{FieldType, MetricValue, NormalizedSnapshot, SchemaRegistry};

/// Result of mapping one row.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub snapshot: NormalizedSnapshot,
    /// Names of fields that fell back to their default, in schema order.
    pub defaulted: Vec<String>,
    /// Number of fields in the schema.
    pub total: usize,
}

impl MappedRow {
    /// Fraction of fields that were defaulted, in `[0, 1]`.
    pub fn defaulted_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.defaulted.len() as f64 / self.total as f64
    }
}

/// Map `row` onto `schema`. Never fails.
pub fn map_row(row: &RawRow, schema: &SchemaRegistry) -> MappedRow {
    let mut builder = NormalizedSnapshot::builder().version(schema.version());
    let mut defaulted = Vec::new();

    for field in schema.iter() {
        let value = match row.get(field.column).and_then(|cell| parse_cell(cell, field.kind)) {
            Some(value) => value,
            None => {
                defaulted.push(field.name.clone());
                field.default
            }
        };
        builder = builder.set(field.group, field.name.clone(), value);
    }

    MappedRow {
        snapshot: builder.build(),
        defaulted,
        total: schema.len(),
    }
}

/// Parse one cell as `kind`.
///
/// Whitespace and thousands separators are stripped first. Integer columns
/// accept decimal text and truncate it ("12.0" is 12). Blank cells and
/// non-finite numbers do not parse.
pub fn parse_cell(cell: &str, kind: FieldType) -> Option<MetricValue> {
    let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let number: f64 = cleaned.parse().ok().filter(|v: &f64| v.is_finite())?;
    match kind {
        FieldType::Float => Some(MetricValue::Float(number)),
        FieldType::Int => {
            let truncated = number.trunc();
            if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
                return None;
            }
            Some(MetricValue::Int(truncated as i64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchwatch_types::{Direction, MetricGroup, SchemaField};
    use std::collections::BTreeMap;

    fn production_schema() -> SchemaRegistry {
        use Direction::{HigherIsBetter as Higher, LowerIsBetter as Lower};
        use MetricGroup::Production;

        SchemaRegistry::new(vec![
            SchemaField::int(Production, "total_batches", 0, 0, Higher),
            SchemaField::int(Production, "completed_batches", 1, 0, Higher),
            SchemaField::int(Production, "pending_batches", 2, 0, Lower),
            SchemaField::float(Production, "average_yield", 3, 0.0, Higher),
        ])
        .unwrap()
    }

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_maps_production_row() {
        let mapped = map_row(&row(&["147", "132", "15", "96.3"]), &production_schema());

        let expected: BTreeMap<String, MetricValue> = [
            ("total_batches", MetricValue::Int(147)),
            ("completed_batches", MetricValue::Int(132)),
            ("pending_batches", MetricValue::Int(15)),
            ("average_yield", MetricValue::Float(96.3)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        assert_eq!(mapped.snapshot.production, expected);
        assert!(mapped.defaulted.is_empty());
        assert_eq!(mapped.defaulted_ratio(), 0.0);
    }

    #[test]
    fn test_malformed_cells_take_defaults() {
        let mapped = map_row(&row(&["", "abc", "15"]), &production_schema());
        let snapshot = &mapped.snapshot;

        assert_eq!(snapshot.get("total_batches"), Some(MetricValue::Int(0)));
        assert_eq!(snapshot.get("completed_batches"), Some(MetricValue::Int(0)));
        assert_eq!(snapshot.get("pending_batches"), Some(MetricValue::Int(15)));
        // Index 3 is past the end of the row
        assert_eq!(snapshot.get("average_yield"), Some(MetricValue::Float(0.0)));
        assert_eq!(
            mapped.defaulted,
            vec!["total_batches", "completed_batches", "average_yield"]
        );
        assert_eq!(mapped.defaulted_ratio(), 0.75);
    }

    #[test]
    fn test_single_bad_cell_only_affects_its_field() {
        let schema = production_schema();
        let good = map_row(&row(&["147", "132", "15", "96.3"]), &schema).snapshot;

        for index in 0..4 {
            let mut cells = vec!["147", "132", "15", "96.3"];
            cells[index] = "n/a";
            let mapped = map_row(&row(&cells), &schema);
            assert_eq!(mapped.defaulted.len(), 1);

            for field in schema.iter() {
                let value = mapped.snapshot.get(&field.name);
                if field.column == index {
                    assert_eq!(value, Some(field.default));
                } else {
                    assert_eq!(value, good.get(&field.name));
                }
            }
        }
    }

    #[test]
    fn test_every_field_present() {
        let schema = production_schema();
        for cells in [vec![], vec!["x"; 4], vec!["1"; 10]] {
            let mapped = map_row(&row(&cells), &schema);
            assert_eq!(mapped.snapshot.len(), schema.len());
        }
    }

    #[test]
    fn test_parse_cell_thousands_and_truncation() {
        assert_eq!(parse_cell("1,247", FieldType::Int), Some(MetricValue::Int(1247)));
        assert_eq!(parse_cell(" 12.9 ", FieldType::Int), Some(MetricValue::Int(12)));
        assert_eq!(parse_cell("-3.5", FieldType::Int), Some(MetricValue::Int(-3)));
        assert_eq!(parse_cell("1,234.5", FieldType::Float), Some(MetricValue::Float(1234.5)));
        assert_eq!(parse_cell("98", FieldType::Float), Some(MetricValue::Float(98.0)));
    }

    #[test]
    fn test_parse_cell_rejects() {
        for bad in ["", "   ", ",", "abc", "NaN", "inf", "12abc", "1e400"] {
            assert_eq!(parse_cell(bad, FieldType::Float), None, "{bad:?}");
            assert_eq!(parse_cell(bad, FieldType::Int), None, "{bad:?}");
        }
        assert_eq!(parse_cell("1e30", FieldType::Int), None);
    }
}
