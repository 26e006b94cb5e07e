//! Derived variable resolution.
//!
//! For every year in a [`VariableDefinition`] the resolver fetches the union
//! of that year's numerator and denominator fields in a single request, then
//! replaces the raw columns with one derived column and a `year` tag.
//! Years are independent: a year that fails to validate or fetch is recorded
//! in [`Resolution::failures`] and the next year is processed as usual.

use crate::definition::{VariableDefinition, YearFields};
use crate::error::{ConfigError, ResolveError};
use census_data::{FetchRequest, Geography, TableSource, Year};
use polars::prelude::*;

/// Name of the column carrying the source year.
pub const YEAR_COLUMN: &str = "year";

/// Dataset selection and naming shared by every year of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Row resolution
    pub geography: Geography,
    /// Dataset family, e.g. `acs`
    pub dataset: String,
    /// Table, e.g. `acs5`
    pub table: String,
    /// Name of the derived column, e.g. `pct_owner_occ`
    pub output_name: String,
}

impl ResolveOptions {
    /// Build options, rejecting output names that would collide with the
    /// geography key columns or the year column, or that would place the
    /// output file outside its directory.
    pub fn new(
        geography: Geography,
        dataset: impl Into<String>,
        table: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let output_name = output_name.into();
        let trimmed = output_name.trim();
        if trimmed.is_empty()
            || trimmed == YEAR_COLUMN
            || geography.key_columns().iter().any(|k| *k == trimmed)
            || trimmed.contains(['/', '\\'])
            || trimmed.contains("..")
        {
            return Err(ConfigError::InvalidOutputName(output_name));
        }
        Ok(Self {
            geography,
            dataset: dataset.into(),
            table: table.into(),
            output_name: trimmed.to_string(),
        })
    }
}

/// A year that produced no table, and why.
#[derive(Debug)]
pub struct YearFailure {
    /// Year that failed
    pub year: Year,
    /// Cause
    pub error: ResolveError,
}

/// Outcome of resolving a definition: one table per successful year plus
/// the failures, both in definition order.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Successfully derived tables
    pub tables: Vec<(Year, DataFrame)>,
    /// Years that produced no table
    pub failures: Vec<YearFailure>,
}

impl Resolution {
    /// Table for `year`, if that year succeeded.
    pub fn get(&self, year: Year) -> Option<&DataFrame> {
        self.tables.iter().find(|(y, _)| *y == year).map(|(_, df)| df)
    }

    /// Years that produced a table.
    pub fn years(&self) -> Vec<Year> {
        self.tables.iter().map(|(y, _)| *y).collect()
    }

    /// Whether every configured year succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve every year of `definition` against `source`, sequentially and in
/// definition order.
///
/// Never fails as a whole; per-year problems end up in
/// [`Resolution::failures`]. An empty definition yields an empty resolution.
pub async fn resolve<S: TableSource>(
    source: &S,
    definition: &VariableDefinition,
    options: &ResolveOptions,
) -> Resolution {
    let mut resolution = Resolution::default();

    for (year, fields) in definition.iter() {
        match resolve_year(source, year, fields, options).await {
            Ok(df) => {
                tracing::info!(
                    year,
                    rows = df.height(),
                    variable = %options.output_name,
                    "derived variable resolved"
                );
                resolution.tables.push((year, df));
            }
            Err(error) => {
                tracing::warn!(year, %error, "cannot generate derived variable for year");
                resolution.failures.push(YearFailure { year, error });
            }
        }
    }

    resolution
}

/// Resolve a single year: validate, fetch once, derive.
pub async fn resolve_year<S: TableSource>(
    source: &S,
    year: Year,
    fields: &YearFields,
    options: &ResolveOptions,
) -> Result<DataFrame, ResolveError> {
    fields.validate(year)?;

    let request = FetchRequest::new(
        year,
        options.geography,
        options.dataset.as_str(),
        options.table.as_str(),
        fields.all_fields(),
    );
    let raw = source.fetch_table(&request).await?;

    derive_table(raw, year, fields, options.geography, &options.output_name)
}

/// Replace the raw field columns of `raw` with the derived column and the
/// year tag.
///
/// Fields are cast to `f64` (anything uncastable becomes null). Row sums
/// treat null terms as zero. A zero denominator yields null.
pub fn derive_table(
    raw: DataFrame,
    year: Year,
    fields: &YearFields,
    geography: Geography,
    output_name: &str,
) -> Result<DataFrame, ResolveError> {
    let numerator = row_sum(&fields.numerator);
    let derived = match &fields.denominator {
        Some(denominator) => {
            let denominator = row_sum(denominator);
            when(denominator.clone().neq(lit(0.0)))
                .then(numerator / denominator)
                .otherwise(lit(NULL))
        }
        None => numerator,
    };

    let mut exprs: Vec<Expr> = geography.key_columns().iter().map(|k| col(*k)).collect();
    exprs.push(derived.cast(DataType::Float64).alias(output_name));
    exprs.push(lit(i32::from(year)).cast(DataType::Int32).alias(YEAR_COLUMN));

    Ok(raw.lazy().select(exprs).collect()?)
}

fn row_sum(fields: &[String]) -> Expr {
    fields.iter().fold(lit(0.0), |acc, field| {
        acc + col(field.as_str())
            .cast(DataType::Float64)
            .fill_null(lit(0.0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state_frame(columns: &[(&str, Vec<Option<f64>>)]) -> DataFrame {
        let height = columns.first().map_or(0, |(_, v)| v.len());
        let states: Vec<String> = (1..=height).map(|i| format!("{:02}", i)).collect();
        let mut cols: Vec<Column> = vec![Series::new("state".into(), states).into()];
        for (name, values) in columns {
            cols.push(Series::new((*name).into(), values.clone()).into());
        }
        DataFrame::new(cols).unwrap()
    }

    fn derived(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_ratio() {
        let raw = state_frame(&[("A", vec![Some(50.0)]), ("B", vec![Some(100.0)])]);
        let df = derive_table(raw, 2014, &YearFields::ratio(["A"], ["B"]), Geography::State, "share")
            .unwrap();
        assert_relative_eq!(derived(&df, "share")[0].unwrap(), 0.5);
    }

    #[test]
    fn test_sum_without_denominator() {
        let raw = state_frame(&[("A", vec![Some(3.0)]), ("C", vec![Some(4.0)])]);
        let df =
            derive_table(raw, 2014, &YearFields::sum(["A", "C"]), Geography::State, "total").unwrap();
        assert_relative_eq!(derived(&df, "total")[0].unwrap(), 7.0);
    }

    #[test]
    fn test_zero_denominator_is_null() {
        let raw = state_frame(&[
            ("A", vec![Some(5.0), Some(0.0)]),
            ("B", vec![Some(0.0), Some(0.0)]),
        ]);
        let df = derive_table(raw, 2014, &YearFields::ratio(["A"], ["B"]), Geography::State, "r")
            .unwrap();
        assert_eq!(derived(&df, "r"), vec![None, None]);
    }

    #[test]
    fn test_null_terms_count_as_zero() {
        let raw = state_frame(&[
            ("A", vec![Some(2.0), None]),
            ("B", vec![None, None]),
            ("D", vec![Some(8.0), None]),
        ]);
        let df =
            derive_table(raw, 2014, &YearFields::ratio(["A", "B"], ["D"]), Geography::State, "r")
                .unwrap();
        let values = derived(&df, "r");
        assert_relative_eq!(values[0].unwrap(), 0.25);
        // all-null denominator sums to zero
        assert_eq!(values[1], None);
    }

    #[test]
    fn test_output_columns() {
        let raw = state_frame(&[("A", vec![Some(1.0)]), ("B", vec![Some(2.0)])]);
        let df = derive_table(raw, 2016, &YearFields::ratio(["A"], ["B"]), Geography::State, "r")
            .unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["state", "r", "year"]);

        let year = df.column(YEAR_COLUMN).unwrap().as_materialized_series().i32().unwrap().get(0);
        assert_eq!(year, Some(2016));
    }

    #[test]
    fn test_missing_column_fails() {
        let raw = state_frame(&[("A", vec![Some(1.0)])]);
        let result = derive_table(raw, 2016, &YearFields::ratio(["A"], ["B"]), Geography::State, "r");
        assert!(matches!(result, Err(ResolveError::Polars(_))));
    }

    #[test]
    fn test_options_reject_colliding_names() {
        for bad in ["", "  ", "year", "state", "../x", "a/b", "a\\b", ".."] {
            assert!(matches!(
                ResolveOptions::new(Geography::County, "acs", "acs5", bad),
                Err(ConfigError::InvalidOutputName(_))
            ));
        }
        let ok = ResolveOptions::new(Geography::County, "acs", "acs5", " pct_owner_occ ").unwrap();
        assert_eq!(ok.output_name, "pct_owner_occ");
    }
}
