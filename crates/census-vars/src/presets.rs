//! Built-in variable definitions.
//!
//! Ready-made year mappings for commonly used derived variables, looked up by
//! name from the command line.

use crate::definition::{VariableDefinition, YearFields};
use crate::error::ConfigError;

/// Preset metadata
#[derive(Debug, Clone)]
pub struct PresetInfo {
    /// Preset name, also the default output column name
    pub name: &'static str,
    /// What the variable measures
    pub description: &'static str,
    /// Dataset family the field identifiers belong to
    pub dataset: &'static str,
    /// Table the field identifiers belong to
    pub table: &'static str,
}

/// Get all available preset info
pub fn available_presets() -> Vec<PresetInfo> {
    vec![PresetInfo {
        name: "pct_owner_occ",
        description: "Share of occupied housing units that are owner-occupied (2013-2017)",
        dataset: "acs",
        table: "acs5",
    }]
}

/// Look up a preset definition by name.
pub fn preset(name: &str) -> Result<VariableDefinition, ConfigError> {
    match name {
        "pct_owner_occ" => pct_owner_occ(),
        _ => Err(ConfigError::UnknownPreset(name.to_string())),
    }
}

/// Owner-occupied share of households.
///
/// Household type by tenure (B11012) until 2014; the table was deleted from
/// the 2015 ACS, after which tenure (B25011) gives the same ratio directly.
pub fn pct_owner_occ() -> Result<VariableDefinition, ConfigError> {
    let household_tenure = || {
        YearFields::ratio(
            ["B11012_004E", "B11012_008E", "B11012_011E", "B11012_014E"],
            ["B11012_001E"],
        )
    };
    let tenure = || YearFields::ratio(["B25011_002E"], ["B25011_001E"]);

    VariableDefinition::new()
        .with_year(2013, household_tenure())?
        .with_year(2014, household_tenure())?
        .with_year(2015, tenure())?
        .with_year(2016, tenure())?
        .with_year(2017, tenure())
}
