//! Google Sheets client using the v4 values API.
//!
//! Reads one range with `GET /v4/spreadsheets/{id}/values/{range}` and turns
//! the first returned row into a [`RawRow`].
//!
//! ## Credentials
//!
//! Either an API key (for sheets shared by link) or an OAuth access token
//! minted out of band for a service account. Without credentials every
//! fetch fails with [`FetchError::Auth`] and no request is made.
//!
//! ## Example
//!
//! ```rust,no_run
//! use batchwatch_sources::sheets::{Credentials, SheetsClient};
//! use batchwatch_sources::{SourceClient, SourceRef};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SheetsClient::builder()
//!         .credentials(Credentials::Bearer("ya29....".to_string()))
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let source = SourceRef::new("1oI-Xq...", Some("MASTER SHEET"), "H2:AD2".parse()?);
//!     let row = client.fetch(&source).await?;
//!     println!("{:?}", row.cells());
//!     Ok(())
//! }
//! ```

use std::env;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{FetchError, RawRow, SourceClient, SourceRef};

const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com";

/// Credentials for the Sheets API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API key sent as the `key` query parameter.
    ApiKey(String),
    /// OAuth access token sent as a bearer token.
    Bearer(String),
}

impl Credentials {
    /// Read credentials from environment variables.
    ///
    /// The token variable wins when both are set. Returns `None` when neither
    /// is set or both are empty.
    pub fn from_env(api_key_var: &str, token_var: &str) -> Option<Self> {
        let non_empty = |var: &str| env::var(var).ok().filter(|v| !v.trim().is_empty());

        non_empty(token_var)
            .map(Credentials::Bearer)
            .or_else(|| non_empty(api_key_var).map(Credentials::ApiKey))
    }
}

// Keep secrets out of debug output and logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(..)"),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// Sheets values API client.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    endpoint: Url,
    credentials: Option<Credentials>,
    description: String,
}

impl SheetsClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> SheetsClientBuilder {
        SheetsClientBuilder::default()
    }

    fn values_url(&self, source: &SourceRef) -> Result<Url, FetchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Network(format!("invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", source.spreadsheet_id.as_str(), "values"])
            .push(&source.a1_notation());

        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");

        if let Some(Credentials::ApiKey(key)) = &self.credentials {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(url)
    }
}

#[async_trait]
impl SourceClient for SheetsClient {
    async fn fetch(&self, source: &SourceRef) -> Result<RawRow, FetchError> {
        let Some(credentials) = &self.credentials else {
            return Err(FetchError::Auth("no Google credentials configured".to_string()));
        };

        let url = self.values_url(source)?;
        let mut request = self.client.get(url);
        if let Credentials::Bearer(token) = credentials {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!("API returned status {}", status)));
        }

        if !status.is_success() {
            return Err(FetchError::Network(format!("API returned status {}", status)));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        debug!(range = %source.a1_notation(), rows = body.values.len(), "sheets values fetched");

        body.into_row(source)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for SheetsClient.
#[derive(Debug, Default)]
pub struct SheetsClientBuilder {
    endpoint: Option<String>,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl SheetsClientBuilder {
    /// Override the API endpoint (default: "https://sheets.googleapis.com").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credentials used for every request.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set credentials only if some were found.
    pub fn maybe_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the HTTP request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SheetsClient, FetchError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

        let raw = self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&raw)
            .map_err(|e| FetchError::Network(format!("invalid endpoint {}: {}", raw, e)))?;

        Ok(SheetsClient {
            client,
            description: format!("sheets: {}", endpoint.host_str().unwrap_or("unknown")),
            endpoint,
            credentials: self.credentials,
        })
    }
}

/// `ValueRange` response body.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl ValueRange {
    fn into_row(self, source: &SourceRef) -> Result<RawRow, FetchError> {
        let Some(first) = self.values.into_iter().next() else {
            return Err(FetchError::EmptyRange(source.a1_notation()));
        };
        let cells = first.into_iter().map(cell_text).collect();
        RawRow::conform(cells, source.width())
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
