//! Error types for fetching from the stats service.

use thiserror::Error;

/// Errors that can occur while fetching a snapshot or a day's events.
///
/// Cloneable so the last failure can be shown in the UI while the
/// delivery itself moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-success status or another HTTP-level failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Body was not the JSON we expected.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Could not reach the service.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// No answer within the fetch timeout.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for FetchError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        FetchError::Timeout
    }
}
