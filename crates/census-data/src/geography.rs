//! Geographic resolutions supported by the Census data API.

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resolution at which rows are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geography {
    /// One row per state, keyed by `state`.
    State,
    /// One row per county, keyed by `(county, state)`.
    County,
    /// One row per zip code tabulation area.
    Zcta,
}

impl Geography {
    /// All supported geographies.
    pub const ALL: [Self; 3] = [Self::State, Self::County, Self::Zcta];

    /// Short name used on the command line and in output file names.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::County => "county",
            Self::Zcta => "zcta",
        }
    }

    /// Value of the `for=` query parameter. Already percent-encoded.
    pub const fn filter(&self) -> &'static str {
        match self {
            Self::State => "state:*",
            Self::County => "county:*",
            Self::Zcta => "zip%20code%20tabulation%20area:*",
        }
    }

    /// Columns that identify a row, in output order.
    pub const fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Self::State => &["state"],
            Self::County => &["county", "state"],
            Self::Zcta => &["zip code tabulation area"],
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Geography {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(Self::State),
            "county" => Ok(Self::County),
            "zcta" => Ok(Self::Zcta),
            _ => Err(DataError::InvalidGeography(s.to_string())),
        }
    }
}
