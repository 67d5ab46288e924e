//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `BATCHWATCH_` (nested keys joined by
//! `__`, e.g. `BATCHWATCH_SOURCE__SPREADSHEET_ID`).
//!
//! ```toml
//! [source]
//! spreadsheet_id = "1oI-Xq..."
//! sheet = "MASTER SHEET"
//! range = "H2:AD2"
//!
//! [refresh]
//! interval_secs = 300
//! max_defaulted_ratio = 0.5
//!
//! [[kpis]]
//! name = "quality_pass_rate"
//! metric = "pass_rate"
//! thresholds = [{ at = 95.0, status = "warning" }, { at = 98.0, status = "good" }]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use batchwatch_sources::{A1Range, SourceRef};
use batchwatch_types::{SchemaField, SchemaRegistry, SchemaVersion, Thresholds};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::cache::RefreshPolicy;
use crate::data::layout;
use crate::data::{KpiRule, Pipeline, PipelineError, ZoneMonitor, ZoneSpec};

/// Where the row comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub spreadsheet_id: String,
    pub sheet: Option<String>,
    pub range: String,
    /// Read the row from this file instead of the Sheets API.
    pub file: Option<PathBuf>,
    /// Override for the Sheets API base URL.
    pub endpoint: Option<String>,
    /// Environment variable holding an API key.
    pub api_key_env: String,
    /// Environment variable holding an OAuth access token.
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet: Some(layout::DEFAULT_SHEET.to_string()),
            range: layout::DEFAULT_RANGE.to_string(),
            file: None,
            endpoint: None,
            api_key_env: "GOOGLE_SHEETS_API_KEY".to_string(),
            token_env: "GOOGLE_SHEETS_TOKEN".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    pub interval_secs: u64,
    pub max_defaulted_ratio: f64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        let policy = RefreshPolicy::default();
        Self {
            interval_secs: policy.interval.as_secs(),
            max_defaulted_ratio: policy.max_defaulted_ratio,
        }
    }
}

/// Replacement column layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaSettings {
    /// Row width; defaults to one past the highest column.
    pub width: Option<usize>,
    /// Layout version, e.g. `"1.2"`. Must share the library's major version.
    pub version: Option<SchemaVersion>,
    pub fields: Vec<SchemaField>,
}

/// All settings. Missing sections use the built-in master sheet layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub refresh: RefreshSettings,
    pub schema: Option<SchemaSettings>,
    pub kpis: Option<Vec<KpiRule>>,
    pub zones: Option<Vec<ZoneSpec>>,
    pub zone_thresholds: Option<Thresholds>,
}

impl Settings {
    /// Load settings from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(
                Environment::with_prefix("BATCHWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Build the processing pipeline, filling gaps with the built-in layout.
    pub fn pipeline(&self) -> Result<Pipeline, PipelineError> {
        let schema = match &self.schema {
            Some(custom) => {
                let fields = custom.fields.clone();
                let registry = match custom.width {
                    Some(width) => SchemaRegistry::with_width(fields, width)?,
                    None => SchemaRegistry::new(fields)?,
                };
                match custom.version {
                    Some(version) => registry.versioned(version)?,
                    None => registry,
                }
            }
            None => layout::default_registry()?,
        };
        let rules = match &self.kpis {
            Some(rules) => rules.clone(),
            None => layout::default_kpi_rules()?,
        };
        let zone_thresholds = match &self.zone_thresholds {
            Some(thresholds) => thresholds.clone(),
            None => layout::default_zone_thresholds()?,
        };
        let zones = self.zones.clone().unwrap_or_else(layout::default_zones);

        Pipeline::new(schema, rules, ZoneMonitor::new(zones, zone_thresholds))
    }

    /// The configured sheet range.
    ///
    /// A spreadsheet id is only required when reading from the Sheets API.
    pub fn source_ref(&self) -> Result<SourceRef> {
        let source = &self.source;
        if source.file.is_none() && source.spreadsheet_id.trim().is_empty() {
            bail!("source.spreadsheet_id is not set (or use a file source)");
        }
        let range = source
            .range
            .parse::<A1Range>()
            .with_context(|| format!("Invalid range {:?}", source.range))?;
        Ok(SourceRef::new(
            source.spreadsheet_id.clone(),
            source.sheet.as_deref(),
            range,
        ))
    }

    pub fn policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            interval: Duration::from_secs(self.refresh.interval_secs.max(1)),
            fetch_timeout: Duration::from_secs(self.source.timeout_secs.max(1)),
            max_defaulted_ratio: self.refresh.max_defaulted_ratio,
        }
    }
}
