//! Column schema - the wire contract with the upstream row.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::SchemaVersion;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldType {
    Int,
    Float,
}

/// Whether a larger value of a metric is an improvement.
///
/// This is the single place the "is bigger better" question is answered for
/// a metric; classifiers read it from the field rather than deciding per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Named group of a [`NormalizedSnapshot`](crate::NormalizedSnapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MetricGroup {
    Production,
    Quality,
    Compliance,
    Inventory,
    Environmental,
}

impl MetricGroup {
    /// All groups, in snapshot order.
    pub const ALL: [MetricGroup; 5] = [
        MetricGroup::Production,
        MetricGroup::Quality,
        MetricGroup::Compliance,
        MetricGroup::Inventory,
        MetricGroup::Environmental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricGroup::Production => "production",
            MetricGroup::Quality => "quality",
            MetricGroup::Compliance => "compliance",
            MetricGroup::Inventory => "inventory",
            MetricGroup::Environmental => "environmental",
        }
    }
}

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single numeric value in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    /// The value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }

    /// The type this value carries.
    pub fn field_type(&self) -> FieldType {
        match self {
            MetricValue::Int(_) => FieldType::Int,
            MetricValue::Float(_) => FieldType::Float,
        }
    }

    /// Convert into the given type. Floats truncate toward zero.
    pub fn coerce(self, kind: FieldType) -> Self {
        match (self, kind) {
            (MetricValue::Float(v), FieldType::Int) => MetricValue::Int(v as i64),
            (MetricValue::Int(v), FieldType::Float) => MetricValue::Float(v as f64),
            (v, _) => v,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

/// Definition of one metric column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaField {
    /// Field name, unique across the registry.
    pub name: String,

    /// Snapshot group this field lands in.
    pub group: MetricGroup,

    /// Zero-based position of the cell within the fetched row.
    #[cfg_attr(feature = "serde", serde(alias = "column_index"))]
    pub column: usize,

    /// Declared cell type.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: FieldType,

    /// Value used when the cell is missing or unparseable.
    pub default: MetricValue,

    pub direction: Direction,
}

impl SchemaField {
    /// An integer column.
    pub fn int(
        group: MetricGroup,
        name: impl Into<String>,
        column: usize,
        default: i64,
        direction: Direction,
    ) -> Self {
        Self {
            name: name.into(),
            group,
            column,
            kind: FieldType::Int,
            default: MetricValue::Int(default),
            direction,
        }
    }

    /// A floating point column.
    pub fn float(
        group: MetricGroup,
        name: impl Into<String>,
        column: usize,
        default: f64,
        direction: Direction,
    ) -> Self {
        Self {
            name: name.into(),
            group,
            column,
            kind: FieldType::Float,
            default: MetricValue::Float(default),
            direction,
        }
    }
}

/// Errors building a [`SchemaRegistry`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The registry has no fields.
    #[error("schema has no fields")]
    Empty,

    /// Two fields share a name.
    #[error("duplicate field name: {0}")]
    DuplicateName(String),

    /// A field points past the declared row width.
    #[error("field {name} reads column {column} but rows are {width} cells wide")]
    ColumnOutOfRange {
        name: String,
        column: usize,
        width: usize,
    },

    /// The layout's major version differs from the one this library maps.
    #[error("schema version {0} cannot be mapped by this library")]
    IncompatibleVersion(SchemaVersion),
}

/// Ordered, immutable list of field definitions plus the row width they
/// describe.
///
/// The width is the number of cells one fetched row must have. It defaults
/// to one past the highest referenced column, and can be widened to cover
/// unused columns in the upstream range.
///
/// # Example
///
/// ```rust
/// use batchwatch_types::Direction::HigherIsBetter;
/// use batchwatch_types::MetricGroup::Production;
/// use batchwatch_types::{SchemaField, SchemaRegistry};
///
/// let registry = SchemaRegistry::new(vec![
///     SchemaField::int(Production, "total_batches", 0, 0, HigherIsBetter),
///     SchemaField::float(Production, "average_yield", 3, 0.0, HigherIsBetter),
/// ])
/// .unwrap();
///
/// assert_eq!(registry.width(), 4);
/// assert_eq!(registry.field("average_yield").unwrap().column, 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    fields: Vec<SchemaField>,
    width: usize,
    version: SchemaVersion,
}

impl SchemaRegistry {
    /// Build a registry whose width is one past the highest column.
    pub fn new(fields: Vec<SchemaField>) -> Result<Self, SchemaError> {
        let width = fields.iter().map(|f| f.column + 1).max().unwrap_or(0);
        Self::with_width(fields, width)
    }

    /// Build a registry with an explicit row width.
    pub fn with_width(fields: Vec<SchemaField>, width: usize) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = BTreeSet::new();
        let mut normalized = Vec::with_capacity(fields.len());
        for mut field in fields {
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateName(field.name));
            }
            if field.column >= width {
                return Err(SchemaError::ColumnOutOfRange {
                    name: field.name,
                    column: field.column,
                    width,
                });
            }
            field.default = field.default.coerce(field.kind);
            normalized.push(field);
        }

        Ok(Self {
            fields: normalized,
            width,
            version: SchemaVersion::current(),
        })
    }

    /// Tag the registry with a specific layout version.
    ///
    /// Fails if rows in that layout cannot be mapped by this library.
    pub fn versioned(mut self, version: SchemaVersion) -> Result<Self, SchemaError> {
        if !version.is_compatible() {
            return Err(SchemaError::IncompatibleVersion(version));
        }
        self.version = version;
        Ok(self)
    }

    /// Number of cells a conforming row has.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields belonging to one group.
    pub fn group(&self, group: MetricGroup) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(move |f| f.group == group)
    }
}
