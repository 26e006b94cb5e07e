//! CSV export of census tables.
//!
//! Each resolved year becomes one file, named after the variable, table,
//! year and geography so that files from different runs never collide.

use census_data::{Geography, Year};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// A column required by the file layout is absent.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A cell could not be read back as the expected type.
    #[error("Invalid value '{value}' in column {column}, row {row}")]
    InvalidValue {
        /// Column name
        column: String,
        /// 1-based data row
        row: usize,
        /// Offending cell text
        value: String,
    },
}

/// What a CSV file holds, which fixes its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFile {
    /// One derived variable for one year:
    /// `{variable}_{table}_{year}_{geography}.csv`.
    Derived {
        /// Derived variable name
        variable: String,
        /// Source table, e.g. `acs5`
        table: String,
        /// Survey year
        year: Year,
        /// Row resolution
        geography: Geography,
    },
    /// Raw fields for one year: `{table}_{year}_{geography}.csv`.
    Raw {
        /// Source table, e.g. `acs5`
        table: String,
        /// Survey year
        year: Year,
        /// Row resolution
        geography: Geography,
    },
}

impl TableFile {
    /// File name for this table.
    pub fn file_name(&self) -> String {
        match self {
            Self::Derived {
                variable,
                table,
                year,
                geography,
            } => format!("{}_{}_{}_{}.csv", variable, table, year, geography),
            Self::Raw {
                table,
                year,
                geography,
            } => format!("{}_{}_{}.csv", table, year, geography),
        }
    }

    /// Path of this table under `dir`.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Trait for exporting tables as CSV.
pub trait Exporter {
    /// Render as CSV text: a header row, then one row per record. Nulls are
    /// written as empty cells.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self) -> Result<String, ExportError>;

    /// Write CSV to a file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path) -> Result<(), ExportError> {
        let content = self.export_to_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for DataFrame {
    fn export_to_string(&self) -> Result<String, ExportError> {
        let mut columns: Vec<Vec<Option<String>>> = Vec::with_capacity(self.width());
        for column in self.get_columns() {
            let text = column.as_materialized_series().cast(&DataType::String)?;
            columns.push(
                text.str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect(),
            );
        }

        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(self.get_column_names().iter().map(|name| name.as_str()))?;
        for row in 0..self.height() {
            wtr.write_record(
                columns
                    .iter()
                    .map(|column| column[row].as_deref().unwrap_or_default()),
            )?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes).map_err(|e| {
            ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

/// Write `df` as `file` under `dir` and return the path written.
pub fn write_table(df: &DataFrame, dir: &Path, file: &TableFile) -> Result<PathBuf, ExportError> {
    let path = file.path_in(dir);
    df.export_to_file(&path)?;
    tracing::info!(path = %path.display(), rows = df.height(), "generated file");
    Ok(path)
}

/// Write one resolved year of a derived variable.
pub fn write_derived_table(
    df: &DataFrame,
    dir: &Path,
    variable: &str,
    table: &str,
    year: Year,
    geography: Geography,
) -> Result<PathBuf, ExportError> {
    let file = TableFile::Derived {
        variable: variable.to_string(),
        table: table.to_string(),
        year,
        geography,
    };
    write_table(df, dir, &file)
}

/// Write one year of raw fields.
pub fn write_raw_table(
    df: &DataFrame,
    dir: &Path,
    table: &str,
    year: Year,
    geography: Geography,
) -> Result<PathBuf, ExportError> {
    let file = TableFile::Raw {
        table: table.to_string(),
        year,
        geography,
    };
    write_table(df, dir, &file)
}
