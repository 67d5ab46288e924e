//! Error types for source clients.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when fetching a row from a source.
///
/// Every client reports failures through this one type. Only [`Auth`] is
/// permanent; the rest are expected to clear on a later attempt.
///
/// [`Auth`]: FetchError::Auth
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Credentials are missing or were rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The range resolved to zero rows.
    #[error("No data found in range {0}")]
    EmptyRange(String),

    /// Timeout, connection failure or a non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),

    /// The source answered, but not with a usable row.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// A fetch that did not finish within `limit`.
    pub fn timeout(limit: Duration) -> Self {
        FetchError::Network(format!("request timed out after {:?}", limit))
    }

    /// Whether this failure needs reconfiguration rather than a retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth(_))
    }
}

#[cfg(feature = "sheets")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Network(format!("request timed out: {}", err))
        } else if err.is_connect() {
            FetchError::Network(format!("connection failed: {}", err))
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                FetchError::Auth(format!("API returned status {}", status))
            } else {
                FetchError::Network(format!("API returned status {}", status))
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
