//! Parsing and normalization of Census API responses.
//!
//! The API answers with a JSON array of rows where the first row holds the
//! column names:
//!
//! ```text
//! [["B25011_001E","state"],
//!  ["1888504","01"],
//!  ["-666666666","02"]]
//! ```
//!
//! Every value arrives as a string. Negative values are suppression codes
//! (e.g. `-666666666`), never measurements, so they are read as null.

use crate::error::{DataError, Result};
use crate::geography::Geography;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

/// Parse a raw response body into a normalized table.
///
/// # Errors
/// Returns [`DataError::MalformedResponse`] when the body is not a JSON array
/// of rows or does not carry the columns that were asked for.
pub fn parse_response(body: &str, geography: Geography, fields: &[String]) -> Result<DataFrame> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body).map_err(|e| {
        DataError::MalformedResponse(format!("expected a JSON array of rows: {}", e))
    })?;
    normalize_rows(rows, geography, fields)
}

/// Turn header + data rows into a table with the geography key columns
/// first, followed by `fields` in request order.
///
/// Key columns are kept as strings. Field values go through
/// [`coerce_value`].
pub fn normalize_rows(
    rows: Vec<Vec<Value>>,
    geography: Geography,
    fields: &[String],
) -> Result<DataFrame> {
    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| DataError::MalformedResponse("response has no header row".to_string()))?;

    let header: Vec<String> = header
        .into_iter()
        .map(|cell| match cell {
            Value::String(name) => Ok(name),
            other => Err(DataError::MalformedResponse(format!(
                "header cell is not a string: {}",
                other
            ))),
        })
        .collect::<Result<_>>()?;

    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(header.len());
    for (idx, name) in header.iter().enumerate() {
        positions.entry(name.as_str()).or_insert(idx);
    }
    let locate = |name: &str| {
        positions.get(name).copied().ok_or_else(|| {
            DataError::MalformedResponse(format!("column '{}' missing from response header", name))
        })
    };

    let key_idx: Vec<usize> = geography
        .key_columns()
        .iter()
        .map(|k| locate(*k))
        .collect::<Result<_>>()?;
    let field_idx: Vec<usize> = fields
        .iter()
        .map(|f| locate(f.as_str()))
        .collect::<Result<_>>()?;

    let mut keys: Vec<Vec<String>> = vec![Vec::new(); key_idx.len()];
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); field_idx.len()];

    for (line, row) in rows.enumerate() {
        if row.len() != header.len() {
            return Err(DataError::MalformedResponse(format!(
                "row {} has {} cells, header has {}",
                line + 1,
                row.len(),
                header.len()
            )));
        }
        for (slot, &idx) in keys.iter_mut().zip(&key_idx) {
            slot.push(key_value(&row[idx]).ok_or_else(|| {
                DataError::MalformedResponse(format!(
                    "row {} has no value for key column '{}'",
                    line + 1,
                    header[idx]
                ))
            })?);
        }
        for (slot, &idx) in values.iter_mut().zip(&field_idx) {
            slot.push(coerce_value(&row[idx]));
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(key_idx.len() + field_idx.len());
    for (name, data) in geography.key_columns().iter().zip(keys) {
        columns.push(Series::new((*name).into(), data).into());
    }
    for (name, data) in fields.iter().zip(values) {
        columns.push(Series::new(name.as_str().into(), data).into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Coerce one cell to a non-negative number.
///
/// Numbers and numeric strings pass through; null, empty, non-numeric,
/// non-finite and negative values all become `None`.
pub fn coerce_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite() && *v >= 0.0)
}

fn key_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(json!("12.5"), Some(12.5))]
    #[case(json!("0"), Some(0.0))]
    #[case(json!(42), Some(42.0))]
    #[case(json!("-666666666"), None)]
    #[case(json!(-1.5), None)]
    #[case(json!("N/A"), None)]
    #[case(json!(""), None)]
    #[case(json!(null), None)]
    #[case(json!("NaN"), None)]
    fn test_coerce_value(#[case] input: Value, #[case] expected: Option<f64>) {
        assert_eq!(coerce_value(&input), expected);
    }

    #[test]
    fn test_state_columns_and_order() {
        let body = r#"[["B2","NAME","B1","state"],["10","Alabama","20","01"],["30","Alaska","40","02"]]"#;
        let df = parse_response(body, Geography::State, &fields(&["B1", "B2"])).unwrap();

        assert_eq!(column_names(&df), vec!["state", "B1", "B2"]);
        assert_eq!(df.height(), 2);

        let b1: Vec<Option<f64>> = df
            .column("B1")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(b1, vec![Some(20.0), Some(40.0)]);
    }

    #[test]
    fn test_county_composite_key() {
        let body = r#"[["B1","state","county"],["5","06","001"],["7","06","003"]]"#;
        let df = parse_response(body, Geography::County, &fields(&["B1"])).unwrap();

        assert_eq!(column_names(&df), vec!["county", "state", "B1"]);
        let county: Vec<Option<&str>> = df
            .column("county")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(county, vec![Some("001"), Some("003")]);
    }

    #[test]
    fn test_negative_and_missing_become_null() {
        let body = r#"[["B1","zip code tabulation area"],["-666666666","35004"],[null,"35005"],["0","35006"]]"#;
        let df = parse_response(body, Geography::Zcta, &fields(&["B1"])).unwrap();

        let b1 = df.column("B1").unwrap().as_materialized_series().f64().unwrap().clone();
        assert_eq!(b1.null_count(), 2);
        assert_eq!(b1.get(2), Some(0.0));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let body = r#"[["B1","state"],["1","01"]]"#;
        let err = parse_response(body, Geography::State, &fields(&["B9"])).unwrap_err();
        assert!(matches!(err, DataError::MalformedResponse(ref m) if m.contains("B9")));
    }

    #[test]
    fn test_missing_key_is_malformed() {
        let body = r#"[["B1","state"],["1","01"]]"#;
        let err = parse_response(body, Geography::County, &fields(&["B1"])).unwrap_err();
        assert!(matches!(err, DataError::MalformedResponse(ref m) if m.contains("county")));
    }

    #[rstest]
    #[case("")]
    #[case("[]")]
    #[case(r#"{"error":"unknown variable"}"#)]
    #[case("error: unknown variable 'B9'")]
    #[case(r#"[[1,2],["3","4"]]"#)]
    #[case(r#"[["B1","state"],["1"]]"#)]
    fn test_malformed_bodies(#[case] body: &str) {
        let result = parse_response(body, Geography::State, &fields(&["B1"]));
        assert!(matches!(result, Err(DataError::MalformedResponse(_))));
    }

    #[test]
    fn test_header_only() {
        let body = r#"[["B1","state"]]"#;
        let df = parse_response(body, Geography::State, &fields(&["B1"])).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 2);
    }
}
