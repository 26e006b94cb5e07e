//! Per-year derived variable definitions.
//!
//! Census field identifiers are not stable across vintages: tables get
//! deleted or renamed (B11012 was dropped from the 2015 ACS, for example), so
//! a single logical variable is described by a different set of raw fields
//! for each year.
//!
//! Definitions are usually loaded from JSON:
//!
//! ```json
//! {
//!   "2014": { "numerator": ["B11012_004E", "B11012_008E"], "denominator": ["B11012_001E"] },
//!   "2015": { "num": ["B25011_002E"], "den": ["B25011_001E"] }
//! }
//! ```
//!
//! Years keep the order in which they appear in the file.

use crate::error::ConfigError;
use census_data::Year;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

/// Raw fields making up the derived variable for one year.
///
/// The derived value is `sum(numerator)`, divided by `sum(denominator)` when
/// a denominator is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearFields {
    /// Fields summed into the numerator. Must not be empty.
    #[serde(alias = "num", default)]
    pub numerator: Vec<String>,

    /// Fields summed into the denominator, if the variable is a ratio.
    #[serde(alias = "den", default, skip_serializing_if = "Option::is_none")]
    pub denominator: Option<Vec<String>>,
}

impl YearFields {
    /// A ratio `sum(numerator) / sum(denominator)`.
    pub fn ratio<N, D, S>(numerator: N, denominator: D) -> Self
    where
        N: IntoIterator<Item = S>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            numerator: numerator.into_iter().map(Into::into).collect(),
            denominator: Some(denominator.into_iter().map(Into::into).collect()),
        }
    }

    /// A plain sum of the numerator fields.
    pub fn sum<N, S>(numerator: N) -> Self
    where
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            numerator: numerator.into_iter().map(Into::into).collect(),
            denominator: None,
        }
    }

    /// Check the fields for `year`.
    pub fn validate(&self, year: Year) -> Result<(), ConfigError> {
        if self.numerator.is_empty() {
            return Err(ConfigError::EmptyNumerator { year });
        }
        if self.denominator.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::EmptyDenominator { year });
        }
        Ok(())
    }

    /// Every field to fetch: numerator then denominator, without repeats.
    pub fn all_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        let denominator = self.denominator.iter().flatten();
        for field in self.numerator.iter().chain(denominator) {
            if !fields.contains(&field.as_str()) {
                fields.push(field);
            }
        }
        fields
    }
}

/// Ordered `year -> fields` mapping for one derived variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableDefinition {
    years: Vec<(Year, YearFields)>,
}

impl VariableDefinition {
    /// An empty definition.
    pub const fn new() -> Self {
        Self { years: Vec::new() }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_year(mut self, year: Year, fields: YearFields) -> Result<Self, ConfigError> {
        self.insert(year, fields)?;
        Ok(self)
    }

    /// Append a year.
    ///
    /// # Errors
    /// [`ConfigError::DuplicateYear`] if `year` is already defined.
    pub fn insert(&mut self, year: Year, fields: YearFields) -> Result<(), ConfigError> {
        if self.get(year).is_some() {
            return Err(ConfigError::DuplicateYear(year));
        }
        self.years.push((year, fields));
        Ok(())
    }

    /// Fields for `year`.
    pub fn get(&self, year: Year) -> Option<&YearFields> {
        self.years.iter().find(|(y, _)| *y == year).map(|(_, f)| f)
    }

    /// Years and their fields in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (Year, &YearFields)> {
        self.years.iter().map(|(y, f)| (*y, f))
    }

    /// Defined years in order.
    pub fn years(&self) -> Vec<Year> {
        self.years.iter().map(|(y, _)| *y).collect()
    }

    /// Number of years.
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Whether no year is defined.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Validate every year, returning one error per invalid year.
    ///
    /// Invalid years do not make the definition unusable: the resolver skips
    /// them and still processes the rest.
    pub fn validate(&self) -> Vec<ConfigError> {
        self.iter()
            .filter_map(|(year, fields)| fields.validate(year).err())
            .collect()
    }

    /// Parse a definition from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a definition from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl Serialize for VariableDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.years.len()))?;
        for (year, fields) in &self.years {
            map.serialize_entry(year, fields)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VariableDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DefinitionVisitor)
    }
}

struct DefinitionVisitor;

impl<'de> Visitor<'de> for DefinitionVisitor {
    type Value = VariableDefinition;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from year to numerator/denominator field lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut definition = VariableDefinition::new();
        while let Some((year, fields)) = access.next_entry::<Year, YearFields>()? {
            definition.insert(year, fields).map_err(de::Error::custom)?;
        }
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keeps_file_order() {
        let json = r#"{
            "2016": { "num": ["B25011_002E"], "den": ["B25011_001E"] },
            "2013": { "numerator": ["B11012_004E"], "denominator": ["B11012_001E"] },
            "2014": { "num": ["B01001_001E"] }
        }"#;
        let def = VariableDefinition::from_json_str(json).unwrap();

        assert_eq!(def.years(), vec![2016, 2013, 2014]);
        assert_eq!(
            def.get(2013).unwrap(),
            &YearFields::ratio(["B11012_004E"], ["B11012_001E"])
        );
        assert_eq!(def.get(2014).unwrap().denominator, None);
    }

    #[test]
    fn test_json_duplicate_year() {
        let json = r#"{ "2013": { "num": ["A"] }, "2013": { "num": ["B"] } }"#;
        let err = VariableDefinition::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Json(ref e) if e.to_string().contains("2013")));
    }

    #[test]
    fn test_json_absent_numerator_is_per_year() {
        let json = r#"{ "2013": { "den": ["B"] }, "2014": { "num": ["A"] } }"#;
        let def = VariableDefinition::from_json_str(json).unwrap();
        let errors = def.validate();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::EmptyNumerator { year: 2013 }));
    }

    #[test]
    fn test_json_bad_year_key() {
        let json = r#"{ "next year": { "num": ["A"] } }"#;
        assert!(matches!(
            VariableDefinition::from_json_str(json),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let def = VariableDefinition::new()
            .with_year(2015, YearFields::ratio(["A", "B"], ["C"]))
            .unwrap()
            .with_year(2010, YearFields::sum(["D"]))
            .unwrap();
        let json = serde_json::to_string(&def).unwrap();
        assert_eq!(VariableDefinition::from_json_str(&json).unwrap(), def);
    }

    #[test]
    fn test_validate_reports_each_bad_year() {
        let def = VariableDefinition::new()
            .with_year(2013, YearFields::sum(Vec::<String>::new()))
            .unwrap()
            .with_year(2014, YearFields::ratio(["A"], ["B"]))
            .unwrap()
            .with_year(2015, YearFields::ratio(vec!["A".to_string()], Vec::new()))
            .unwrap();

        let errors = def.validate();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ConfigError::EmptyNumerator { year: 2013 }));
        assert!(matches!(errors[1], ConfigError::EmptyDenominator { year: 2015 }));
    }

    #[test]
    fn test_insert_duplicate() {
        let mut def = VariableDefinition::new();
        def.insert(2013, YearFields::sum(["A"])).unwrap();
        assert!(matches!(
            def.insert(2013, YearFields::sum(["B"])),
            Err(ConfigError::DuplicateYear(2013))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pct_owner_occ.json");
        std::fs::write(&path, r#"{ "2015": { "num": ["B25011_002E"], "den": ["B25011_001E"] } }"#)
            .unwrap();

        let def = VariableDefinition::from_path(&path).unwrap();
        assert_eq!(def.len(), 1);
        assert!(matches!(
            VariableDefinition::from_path(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_all_fields_union() {
        let fields = YearFields::ratio(["A", "B", "A"], ["B", "C"]);
        assert_eq!(fields.all_fields(), vec!["A", "B", "C"]);
    }
}
