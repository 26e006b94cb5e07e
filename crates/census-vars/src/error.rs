//! Error types for variable definitions and resolution.

use census_data::{DataError, Year};
use thiserror::Error;

/// Problems with a derived-variable definition.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A year has no numerator fields.
    #[error("year {year}: numerator field list is empty")]
    EmptyNumerator {
        /// Offending year
        year: Year,
    },

    /// A year declares a denominator but lists no fields in it.
    #[error("year {year}: denominator is present but lists no fields")]
    EmptyDenominator {
        /// Offending year
        year: Year,
    },

    /// The same year appears twice.
    #[error("year {0} is defined more than once")]
    DuplicateYear(Year),

    /// Output name is empty, clashes with a key or the year column, or
    /// contains a path separator or `..`.
    #[error("invalid output variable name '{0}'")]
    InvalidOutputName(String),

    /// No built-in definition with this name.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// Definition file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Definition file is not valid JSON for a definition.
    #[error("Invalid definition file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single year produced no table.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The year's definition is invalid; nothing was fetched.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fetching the raw fields failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Computing the derived column failed.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
