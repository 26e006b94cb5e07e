//! Reading exported derived-variable files back into tables.

use crate::export::ExportError;
use census_data::Geography;
use census_vars::YEAR_COLUMN;
use polars::prelude::*;
use std::path::Path;

/// Read a derived-variable CSV written by
/// [`write_derived_table`](crate::write_derived_table).
///
/// Key columns stay strings (county `001` keeps its leading zeros), the
/// variable column is read as `f64` with empty cells as null, and `year` as
/// `i32`. Extra columns are ignored.
pub fn read_derived_table(
    path: &Path,
    geography: Geography,
    variable: &str,
) -> Result<DataFrame, ExportError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ExportError::MissingColumn(name.to_string()))
    };

    let key_pos: Vec<usize> = geography
        .key_columns()
        .iter()
        .map(|k| position(*k))
        .collect::<Result<_, _>>()?;
    let value_pos = position(variable)?;
    let year_pos = position(YEAR_COLUMN)?;

    let mut keys: Vec<Vec<String>> = vec![Vec::new(); key_pos.len()];
    let mut values: Vec<Option<f64>> = Vec::new();
    let mut years: Vec<i32> = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let cell = |pos: usize| record.get(pos).unwrap_or_default();

        for (slot, &pos) in keys.iter_mut().zip(&key_pos) {
            slot.push(cell(pos).to_string());
        }

        let value = cell(value_pos);
        values.push(if value.is_empty() {
            None
        } else {
            Some(value.parse::<f64>().map_err(|_| ExportError::InvalidValue {
                column: variable.to_string(),
                row,
                value: value.to_string(),
            })?)
        });

        let year = cell(year_pos);
        years.push(year.parse::<i32>().map_err(|_| ExportError::InvalidValue {
            column: YEAR_COLUMN.to_string(),
            row,
            value: year.to_string(),
        })?);
    }

    let mut columns: Vec<Column> = Vec::with_capacity(key_pos.len() + 2);
    for (name, data) in geography.key_columns().iter().zip(keys) {
        columns.push(Series::new((*name).into(), data).into());
    }
    columns.push(Series::new(variable.into(), values).into());
    columns.push(Series::new(YEAR_COLUMN.into(), years).into());

    Ok(DataFrame::new(columns)?)
}
