//! # batchwatch-sources
//!
//! Clients that fetch the single upstream row batchwatch normalizes.
//!
//! Every client implements [`SourceClient`]: given a [`SourceRef`] it returns
//! one [`RawRow`] padded to the width of the referenced range, or a
//! [`FetchError`] describing why it could not.
//!
//! ## Supported Sources
//!
//! - **Google Sheets** (`sheets` feature) - reads a range through the Sheets
//!   v4 values API
//! - **File** - reads a row from a local JSON or tab-separated file
//! - **Channel** - rows pushed in-process, for embedding and tests
//!
//! ## Quick Start (Google Sheets)
//!
//! ```rust,no_run
//! # #[cfg(feature = "sheets")]
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use batchwatch_sources::sheets::{Credentials, SheetsClient};
//! use batchwatch_sources::{SourceClient, SourceRef};
//!
//! let client = SheetsClient::builder()
//!     .credentials(Credentials::ApiKey("my-key".to_string()))
//!     .build()?;
//!
//! let source = SourceRef::new("1oI-Xq...", Some("MASTER SHEET"), "H2:AD2".parse()?);
//! let row = client.fetch(&source).await?;
//!
//! println!("Fetched {} cells", row.len());
//! # Ok(())
//! # }
//! ```

use std::fmt::Debug;

use async_trait::async_trait;

mod channel;
pub mod error;
mod file;
mod range;
mod row;

#[cfg(feature = "sheets")]
pub mod sheets;

pub use channel::ChannelSource;
pub use error::FetchError;
pub use file::FileSource;
pub use range::{A1Range, RangeError, SourceRef};
pub use row::RawRow;

/// A source of raw metric rows.
///
/// Implementations must not panic and must report every failure through
/// [`FetchError`]; callers bound the call with their own timeout.
#[async_trait]
pub trait SourceClient: Send + Sync + Debug {
    /// Fetch the row referenced by `source`.
    async fn fetch(&self, source: &SourceRef) -> Result<RawRow, FetchError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used in log lines and in exported dashboards.
    fn description(&self) -> &str;
}
