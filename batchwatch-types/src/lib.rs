//! # batchwatch-types
//!
//! Core types for batchwatch. This crate defines the vocabulary shared between
//! the ingestion core and whatever renders its output: the column schema that
//! acts as the wire contract with the upstream sheet, the normalized snapshot
//! produced from one row of that sheet, and the KPI/compliance types derived
//! from it.
//!
//! ## Design Goals
//!
//! - **Schema as data**: field names, column positions, types, defaults and
//!   the "is bigger better" direction all live in one [`SchemaRegistry`]
//! - **Always complete**: a [`NormalizedSnapshot`] carries a value for every
//!   field; there is no "missing" state to handle downstream
//! - **Optional serialization**: enable the `serde` feature as needed
//! - **Versioned schema**: registries carry a [`SchemaVersion`] so a changed
//!   column layout is detectable
//!
//! ## Example
//!
//! ```rust
//! use batchwatch_types::{MetricGroup, NormalizedSnapshot};
//!
//! let snapshot = NormalizedSnapshot::builder()
//!     .group(MetricGroup::Production, |g| {
//!         g.int("total_batches", 147).float("average_yield", 96.3)
//!     })
//!     .group(MetricGroup::Compliance, |g| g.int("total_deviations", 8))
//!     .build();
//!
//! assert_eq!(snapshot.len(), 3);
//! assert_eq!(snapshot.value("total_batches"), Some(147.0));
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. Bump it whenever the upstream column
//! layout changes so cached or exported snapshots can be told apart.

mod kpi;
mod schema;
mod snapshot;
mod version;

pub use kpi::*;
pub use schema::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when the upstream column layout changes in a way that
/// moves or retypes existing fields.
pub const SCHEMA_VERSION: u32 = 1;
