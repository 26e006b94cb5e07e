//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while fetching and normalizing a Census table.
#[derive(Debug, Error)]
pub enum DataError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Census API request failed: HTTP {status} for {url}")]
    RequestFailed {
        /// HTTP status code returned by the API
        status: u16,
        /// Request URL with the API key redacted
        url: String,
    },

    /// The response body did not have the expected header/rows shape.
    #[error("Malformed Census API response: {0}")]
    MalformedResponse(String),

    /// A request was built without any field identifiers.
    #[error("No fields requested")]
    EmptyFieldList,

    /// Unknown geography name.
    #[error("Invalid geography: {0} (expected one of: state, county, zcta)")]
    InvalidGeography(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
